//! The set-like contract.
//!
//! Any container implementing [`SetLike`] can be partitioned directly.
//! The engine only ever calls the algebra operations and the emptiness
//! test; iteration and construction are used by adapters and by the
//! dynamic layer to move elements between container types.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

/// Minimal operations a container must support to take part in
/// partitioning.
///
/// Operations are pure: they never mutate either operand and always return
/// a fresh value of the same type.
///
/// # Example
///
/// ```
/// use eule_kernel::SetLike;
/// use std::collections::BTreeSet;
///
/// #[derive(Debug, Clone)]
/// struct Tags(BTreeSet<u32>);
///
/// impl SetLike for Tags {
///     type Item = u32;
///
///     fn union(&self, other: &Self) -> Self {
///         Tags(self.0.union(&other.0).copied().collect())
///     }
///     fn intersection(&self, other: &Self) -> Self {
///         Tags(self.0.intersection(&other.0).copied().collect())
///     }
///     fn difference(&self, other: &Self) -> Self {
///         Tags(self.0.difference(&other.0).copied().collect())
///     }
///     fn is_empty(&self) -> bool {
///         self.0.is_empty()
///     }
///     fn elements(&self) -> impl Iterator<Item = u32> + '_ {
///         self.0.iter().copied()
///     }
///     fn from_elements<I: IntoIterator<Item = u32>>(elements: I) -> Self {
///         Tags(elements.into_iter().collect())
///     }
/// }
///
/// let a = Tags::from_elements([1, 2, 3]);
/// let b = Tags::from_elements([3, 4]);
/// assert_eq!(a.intersection(&b).elements().collect::<Vec<_>>(), vec![3]);
/// ```
pub trait SetLike: Clone {
    /// Element type yielded by iteration.
    type Item: Eq + Hash;

    /// Elements present in either operand.
    fn union(&self, other: &Self) -> Self;

    /// Elements present in both operands.
    fn intersection(&self, other: &Self) -> Self;

    /// Elements of `self` not present in `other`.
    fn difference(&self, other: &Self) -> Self;

    /// True iff the set has no elements.
    fn is_empty(&self) -> bool;

    /// Iterate the elements. Each call starts a fresh pass.
    fn elements(&self) -> impl Iterator<Item = Self::Item> + '_;

    /// Build a new instance from a finite collection of elements.
    fn from_elements<I: IntoIterator<Item = Self::Item>>(elements: I) -> Self;

    /// Number of elements. Counts a full pass unless overridden.
    fn len(&self) -> usize {
        self.elements().count()
    }

    /// Membership test. Scans the elements unless overridden.
    fn contains(&self, item: &Self::Item) -> bool {
        self.elements().any(|element| &element == item)
    }

    /// Reverse conversion to a standard-library container, when the
    /// implementation wraps one.
    fn to_native(&self) -> Option<NativeSet<Self::Item>> {
        None
    }
}

/// Standard-library container recovered from an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeSet<T: Eq + Hash> {
    /// Insertion-ordered sequence without duplicates.
    Ordered(Vec<T>),
    /// Unordered hash set.
    Hashed(HashSet<T>),
}

impl<T: Eq + Hash> NativeSet<T> {
    pub fn len(&self) -> usize {
        match self {
            Self::Ordered(items) => items.len(),
            Self::Hashed(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The elements as a hash set, discarding order.
    pub fn into_hash_set(self) -> HashSet<T> {
        match self {
            Self::Ordered(items) => items.into_iter().collect(),
            Self::Hashed(items) => items,
        }
    }
}

/// One required operation of the contract, named for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Union,
    Intersection,
    Difference,
    IsEmpty,
    Elements,
    FromElements,
}

impl Capability {
    /// Every operation a set-like container must provide.
    pub const REQUIRED: [Capability; 6] = [
        Capability::Union,
        Capability::Intersection,
        Capability::Difference,
        Capability::IsEmpty,
        Capability::Elements,
        Capability::FromElements,
    ];

    pub fn method_name(self) -> &'static str {
        match self {
            Self::Union => "union",
            Self::Intersection => "intersection",
            Self::Difference => "difference",
            Self::IsEmpty => "is_empty",
            Self::Elements => "elements",
            Self::FromElements => "from_elements",
        }
    }

    /// Comma-separated method names of all required capabilities.
    pub fn required_list() -> String {
        Self::REQUIRED
            .iter()
            .map(|c| c.method_name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

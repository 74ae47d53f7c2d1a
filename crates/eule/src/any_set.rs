//! Type-erased set handle.
//!
//! [`AnySet`] lets sets of different concrete types meet in one partition.
//! An operation between two values of the same concrete type runs that
//! type's own algebra. Across types, the right operand is first rebuilt in
//! the left operand's type with `from_elements`, so every result has the
//! left operand's type and never leaks a foreign representation into the
//! engine.

use eule_kernel::{Element, HashSetAdapter, NativeSet, SetLike};
use std::any::Any;
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Object-safe view of a [`SetLike`] value over [`Element`]s.
///
/// Implemented for every eligible `SetLike` type; not meant to be
/// implemented by hand.
pub trait DynSetLike: fmt::Debug + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
    fn kind(&self) -> &'static str;
    fn union_with(&self, other: &AnySet) -> AnySet;
    fn intersection_with(&self, other: &AnySet) -> AnySet;
    fn difference_with(&self, other: &AnySet) -> AnySet;
    fn is_empty_set(&self) -> bool;
    fn set_len(&self) -> usize;
    fn contains_element(&self, element: &Element) -> bool;
    fn element_iter(&self) -> Box<dyn Iterator<Item = Element> + '_>;
    fn native(&self) -> Option<NativeSet<Element>>;
}

/// Borrow `other` as `S` when it already is one, rebuild it otherwise.
fn coerce<S>(other: &AnySet) -> Cow<'_, S>
where
    S: SetLike<Item = Element> + 'static,
{
    match other.downcast_ref::<S>() {
        Some(same) => Cow::Borrowed(same),
        None => Cow::Owned(S::from_elements(other.0.element_iter())),
    }
}

impl<S> DynSetLike for S
where
    S: SetLike<Item = Element> + fmt::Debug + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn kind(&self) -> &'static str {
        std::any::type_name::<S>()
    }

    fn union_with(&self, other: &AnySet) -> AnySet {
        AnySet::new(SetLike::union(self, &coerce::<S>(other)))
    }

    fn intersection_with(&self, other: &AnySet) -> AnySet {
        AnySet::new(SetLike::intersection(self, &coerce::<S>(other)))
    }

    fn difference_with(&self, other: &AnySet) -> AnySet {
        AnySet::new(SetLike::difference(self, &coerce::<S>(other)))
    }

    fn is_empty_set(&self) -> bool {
        SetLike::is_empty(self)
    }

    fn set_len(&self) -> usize {
        SetLike::len(self)
    }

    fn contains_element(&self, element: &Element) -> bool {
        SetLike::contains(self, element)
    }

    fn element_iter(&self) -> Box<dyn Iterator<Item = Element> + '_> {
        Box::new(SetLike::elements(self))
    }

    fn native(&self) -> Option<NativeSet<Element>> {
        SetLike::to_native(self)
    }
}

/// Shared, immutable, type-erased set-like value.
///
/// Cloning is cheap and never copies elements; values are never mutated
/// after construction, so clones cannot observe each other.
#[derive(Clone)]
pub struct AnySet(Arc<dyn DynSetLike>);

impl AnySet {
    /// Erase a set-like value. Wrapping an `AnySet` returns it unchanged.
    pub fn new<S>(set: S) -> Self
    where
        S: SetLike<Item = Element> + fmt::Debug + Send + Sync + 'static,
    {
        if let Some(erased) = (&set as &dyn Any).downcast_ref::<AnySet>() {
            return erased.clone();
        }
        Self(Arc::new(set))
    }

    /// An empty set backed by the hash-set adapter.
    pub fn empty() -> Self {
        Self::new(HashSetAdapter::<Element>::default())
    }

    /// Type name of the wrapped value.
    pub fn kind(&self) -> &'static str {
        self.0.kind()
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    /// Size as reported by the wrapped type.
    pub fn len(&self) -> usize {
        self.0.set_len()
    }

    pub fn contains(&self, element: &Element) -> bool {
        self.0.contains_element(element)
    }

    /// Whether every element is in `items`. Stops at the first miss.
    pub fn is_subset_of(&self, items: &HashSet<Element>) -> bool {
        self.0.element_iter().all(|element| items.contains(&element))
    }

    pub fn to_hash_set(&self) -> HashSet<Element> {
        self.0.element_iter().collect()
    }

    /// Elements in ascending order.
    pub fn sorted_elements(&self) -> Vec<Element> {
        let mut elements: Vec<Element> = self.to_hash_set().into_iter().collect();
        elements.sort();
        elements
    }
}

impl SetLike for AnySet {
    type Item = Element;

    fn union(&self, other: &Self) -> Self {
        self.0.union_with(other)
    }

    fn intersection(&self, other: &Self) -> Self {
        self.0.intersection_with(other)
    }

    fn difference(&self, other: &Self) -> Self {
        self.0.difference_with(other)
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty_set()
    }

    fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.0.element_iter()
    }

    fn from_elements<I: IntoIterator<Item = Element>>(elements: I) -> Self {
        Self::new(HashSetAdapter::from_elements(elements))
    }

    fn len(&self) -> usize {
        self.0.set_len()
    }

    fn contains(&self, item: &Element) -> bool {
        self.0.contains_element(item)
    }

    fn to_native(&self) -> Option<NativeSet<Element>> {
        self.0.native()
    }
}

impl fmt::Debug for AnySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl PartialEq for AnySet {
    /// Set equality over elements, independent of the wrapped type.
    fn eq(&self, other: &Self) -> bool {
        self.to_hash_set() == other.to_hash_set()
    }
}

impl Eq for AnySet {}

#[cfg(test)]
mod tests {
    use super::*;
    use eule_kernel::OrderedSet;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ordered(items: &[i64]) -> AnySet {
        AnySet::new(OrderedSet::from_sequence(items.iter().map(|&i| Element::from(i))))
    }

    fn hashed(items: &[i64]) -> AnySet {
        AnySet::new(HashSetAdapter::from_elements(items.iter().map(|&i| Element::from(i))))
    }

    #[test]
    fn wrapping_is_not_nested() {
        let set = ordered(&[1, 2]);
        let rewrapped = AnySet::new(set.clone());
        assert_eq!(set.kind(), rewrapped.kind());
        assert!(rewrapped.downcast_ref::<OrderedSet<Element>>().is_some());
    }

    #[test]
    fn same_type_operations_keep_type() {
        let result = ordered(&[3, 2, 1]).intersection(&ordered(&[1, 3]));
        let inner = result.downcast_ref::<OrderedSet<Element>>().unwrap();
        assert_eq!(inner.as_slice(), &[Element::from(3), Element::from(1)]);
    }

    #[test]
    fn cross_type_operations_follow_left_operand() {
        let left = ordered(&[1, 2, 3]);
        let right = hashed(&[2, 3, 4]);

        let union = left.union(&right);
        assert!(union.downcast_ref::<OrderedSet<Element>>().is_some());
        assert_eq!(union.len(), 4);

        let diff = right.difference(&left);
        assert!(diff.downcast_ref::<HashSetAdapter<Element>>().is_some());
        assert_eq!(diff.sorted_elements(), vec![Element::from(4)]);
    }

    #[test]
    fn equality_ignores_representation() {
        assert_eq!(ordered(&[1, 2]), hashed(&[2, 1]));
        assert_ne!(ordered(&[1]), hashed(&[2]));
        assert!(AnySet::empty().is_empty());
    }

    /// Counts how often its elements are listed.
    #[derive(Debug, Clone, Default)]
    struct Watched {
        items: BTreeSet<Element>,
        listed: Arc<AtomicUsize>,
    }

    impl SetLike for Watched {
        type Item = Element;

        fn union(&self, other: &Self) -> Self {
            Self::from_elements(self.items.union(&other.items).cloned())
        }
        fn intersection(&self, other: &Self) -> Self {
            Self::from_elements(self.items.intersection(&other.items).cloned())
        }
        fn difference(&self, other: &Self) -> Self {
            Self::from_elements(self.items.difference(&other.items).cloned())
        }
        fn is_empty(&self) -> bool {
            self.items.is_empty()
        }
        fn elements(&self) -> impl Iterator<Item = Element> + '_ {
            self.listed.fetch_add(1, Ordering::SeqCst);
            self.items.iter().cloned()
        }
        fn from_elements<I: IntoIterator<Item = Element>>(elements: I) -> Self {
            Self {
                items: elements.into_iter().collect(),
                ..Self::default()
            }
        }
        fn len(&self) -> usize {
            self.items.len()
        }
        fn contains(&self, item: &Element) -> bool {
            self.items.contains(item)
        }
    }

    #[test]
    fn size_and_membership_use_the_wrapped_type() {
        let watched = Watched::from_elements([1, 2, 3].map(Element::from));
        let listed = Arc::clone(&watched.listed);
        let set = AnySet::new(watched);

        assert_eq!(set.len(), 3);
        assert!(set.contains(&Element::from(2)));
        assert!(!set.contains(&Element::from(7)));
        assert_eq!(SetLike::len(&set), 3);
        assert_eq!(listed.load(Ordering::SeqCst), 0);

        let items: HashSet<Element> = [1, 2, 3, 4].map(Element::from).into_iter().collect();
        assert!(set.is_subset_of(&items));
        assert!(!set.is_subset_of(&HashSet::new()));
    }

    #[test]
    fn native_view_follows_wrapped_adapter() {
        assert_eq!(
            ordered(&[2, 1]).to_native(),
            Some(NativeSet::Ordered(vec![Element::from(2), Element::from(1)]))
        );
    }
}

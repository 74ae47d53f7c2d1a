//! Built-in adapters over standard-library containers.
//!
//! - [`HashSetAdapter`]: unordered, delegates to `HashSet` algebra.
//! - [`OrderedSet`]: insertion-ordered and deduplicated. Every operation
//!   keeps the order of its *left* operand; elements contributed by the
//!   right operand (union only) follow in their own order. This is a
//!   determinism tie-break, not a set-theoretic law.

use crate::contract::{NativeSet, SetLike};
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

/// `HashSet`-backed set-like value.
#[derive(Clone, PartialEq, Eq)]
pub struct HashSetAdapter<T: Eq + Hash> {
    data: HashSet<T>,
}

impl<T: Eq + Hash> HashSetAdapter<T> {
    pub fn new(data: HashSet<T>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn contains(&self, element: &T) -> bool {
        self.data.contains(element)
    }

    pub fn as_hash_set(&self) -> &HashSet<T> {
        &self.data
    }

    pub fn into_hash_set(self) -> HashSet<T> {
        self.data
    }
}

impl<T: Eq + Hash> Default for HashSetAdapter<T> {
    fn default() -> Self {
        Self {
            data: HashSet::new(),
        }
    }
}

impl<T: Eq + Hash + fmt::Debug> fmt::Debug for HashSetAdapter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashSetAdapter({:?})", self.data)
    }
}

impl<T: Eq + Hash + Clone> SetLike for HashSetAdapter<T> {
    type Item = T;

    fn union(&self, other: &Self) -> Self {
        Self::new(self.data.union(&other.data).cloned().collect())
    }

    fn intersection(&self, other: &Self) -> Self {
        Self::new(self.data.intersection(&other.data).cloned().collect())
    }

    fn difference(&self, other: &Self) -> Self {
        Self::new(self.data.difference(&other.data).cloned().collect())
    }

    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn elements(&self) -> impl Iterator<Item = T> + '_ {
        self.data.iter().cloned()
    }

    fn from_elements<I: IntoIterator<Item = T>>(elements: I) -> Self {
        Self::new(elements.into_iter().collect())
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn contains(&self, item: &T) -> bool {
        self.data.contains(item)
    }

    fn to_native(&self) -> Option<NativeSet<T>> {
        Some(NativeSet::Hashed(self.data.clone()))
    }
}

/// Insertion-ordered, duplicate-free set-like value.
///
/// Keeps a hash index next to the ordered storage so membership tests stay
/// O(1) on average.
#[derive(Clone)]
pub struct OrderedSet<T: Eq + Hash> {
    items: Vec<T>,
    index: HashSet<T>,
}

impl<T: Eq + Hash + Clone> OrderedSet<T> {
    /// Build from a sequence, keeping the first occurrence of each element.
    pub fn from_sequence(elements: impl IntoIterator<Item = T>) -> Self {
        let mut items = Vec::new();
        let mut index = HashSet::new();
        for element in elements {
            if index.insert(element.clone()) {
                items.push(element);
            }
        }
        Self { items, index }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn contains(&self, element: &T) -> bool {
        self.index.contains(element)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }

    fn retain_by(&self, keep: impl Fn(&T) -> bool) -> Self {
        Self::from_sequence(self.items.iter().filter(|e| keep(e)).cloned())
    }
}

impl<T: Eq + Hash> Default for OrderedSet<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashSet::new(),
        }
    }
}

impl<T: Eq + Hash> PartialEq for OrderedSet<T> {
    /// Order-sensitive equality.
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T: Eq + Hash> Eq for OrderedSet<T> {}

impl<T: Eq + Hash + fmt::Debug> fmt::Debug for OrderedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OrderedSet({:?})", self.items)
    }
}

impl<T: Eq + Hash + Clone> SetLike for OrderedSet<T> {
    type Item = T;

    fn union(&self, other: &Self) -> Self {
        Self::from_sequence(self.items.iter().chain(other.items.iter()).cloned())
    }

    fn intersection(&self, other: &Self) -> Self {
        self.retain_by(|e| other.contains(e))
    }

    fn difference(&self, other: &Self) -> Self {
        self.retain_by(|e| !other.contains(e))
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn elements(&self) -> impl Iterator<Item = T> + '_ {
        self.items.iter().cloned()
    }

    fn from_elements<I: IntoIterator<Item = T>>(elements: I) -> Self {
        Self::from_sequence(elements)
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn contains(&self, item: &T) -> bool {
        self.index.contains(item)
    }

    fn to_native(&self) -> Option<NativeSet<T>> {
        Some(NativeSet::Ordered(self.items.clone()))
    }
}

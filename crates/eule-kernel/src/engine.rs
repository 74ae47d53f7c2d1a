//! The region partitioning engine.
//!
//! Given named sets, the engine computes the Euler decomposition: the
//! maximal non-empty regions whose elements belong to exactly the sets
//! named by their combination key.
//!
//! ## Algorithm
//!
//! Progressive insertion. Sets are introduced one at a time in input
//! order into a running partition of everything seen so far. For each new
//! set `S` named `n`:
//!
//! ```text
//! for each region (K, R):
//!     R ∩ S   → region K ∪ {n}
//!     R \ S   → region K          (kept if non-empty)
//! S \ ⋃ R     → region {n}        (elements no earlier set claimed)
//! ```
//!
//! Regions stay pairwise disjoint and their union always equals the union
//! of the inserted sets, so after the last insertion the partition is the
//! Euler diagram. Empty regions are never stored.
//!
//! The number of regions is bounded by `min(2^n - 1, |⋃ S|)`: the
//! decomposition is inherently exponential in the number of sets, which is
//! why large inputs are split into clusters first (see [`crate::cluster`]).

use crate::contract::{Capability, SetLike};
use crate::error::KernelError;
use crate::key::{CombinationKey, SetName};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;

/// Insertion-ordered collection of uniquely named sets.
#[derive(Debug, Clone)]
pub struct NamedSets<S> {
    entries: Vec<(SetName, S)>,
}

impl<S> NamedSets<S> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Name each set by its position.
    pub fn from_list(sets: Vec<S>) -> Self {
        Self {
            entries: sets
                .into_iter()
                .enumerate()
                .map(|(i, set)| (SetName::Index(i), set))
                .collect(),
        }
    }

    /// Build from `(name, set)` pairs, rejecting repeated names.
    pub fn try_from_pairs<N: Into<SetName>>(
        pairs: impl IntoIterator<Item = (N, S)>,
    ) -> Result<Self, KernelError> {
        let mut sets = Self::new();
        for (name, set) in pairs {
            sets.push(name, set)?;
        }
        Ok(sets)
    }

    pub fn push(&mut self, name: impl Into<SetName>, set: S) -> Result<(), KernelError> {
        let name = name.into();
        if self.contains(&name) {
            return Err(KernelError::DuplicateName(name));
        }
        self.entries.push((name, set));
        Ok(())
    }

    pub fn contains(&self, name: &SetName) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &SetName) -> Option<&S> {
        self.entries
            .iter()
            .find_map(|(n, set)| (n == name).then_some(set))
    }

    /// Remove a set by name, keeping the order of the others.
    pub fn remove(&mut self, name: &SetName) -> Option<S> {
        let pos = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn names(&self) -> impl Iterator<Item = &SetName> {
        self.entries.iter().map(|(n, _)| n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SetName, &S)> {
        self.entries.iter().map(|(n, s)| (n, s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Transform every set, keeping names and order.
    pub fn map<T>(self, mut f: impl FnMut(&SetName, S) -> T) -> NamedSets<T> {
        NamedSets {
            entries: self
                .entries
                .into_iter()
                .map(|(name, set)| {
                    let mapped = f(&name, set);
                    (name, mapped)
                })
                .collect(),
        }
    }
}

impl<S: Clone> NamedSets<S> {
    /// The sub-collection restricted to `names`, in this collection's order.
    pub fn subset(&self, names: &[SetName]) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(n, _)| names.contains(n))
                .cloned()
                .collect(),
        }
    }
}

impl<S> Default for NamedSets<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> IntoIterator for NamedSets<S> {
    type Item = (SetName, S);
    type IntoIter = std::vec::IntoIter<(SetName, S)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// An Euler diagram: non-empty regions keyed by their owning sets.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagram<S> {
    regions: BTreeMap<CombinationKey, S>,
}

/// Serializable view of one region, elements in ascending order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRecord<T> {
    pub key: CombinationKey,
    pub elements: Vec<T>,
}

impl<S> Default for Diagram<S> {
    fn default() -> Self {
        Self {
            regions: BTreeMap::new(),
        }
    }
}

impl<S> Diagram<S> {
    /// Assemble a diagram from already-computed regions.
    pub fn from_regions(regions: BTreeMap<CombinationKey, S>) -> Self {
        Self { regions }
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get(&self, key: &CombinationKey) -> Option<&S> {
        self.regions.get(key)
    }

    /// Keys in canonical order (size first, then names).
    pub fn keys(&self) -> impl Iterator<Item = &CombinationKey> {
        self.regions.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CombinationKey, &S)> {
        self.regions.iter()
    }

    pub fn into_regions(self) -> BTreeMap<CombinationKey, S> {
        self.regions
    }

    /// Transform every region value, keeping keys.
    pub fn map<T>(self, mut f: impl FnMut(&CombinationKey, S) -> T) -> Diagram<T> {
        Diagram {
            regions: self
                .regions
                .into_iter()
                .map(|(key, value)| {
                    let mapped = f(&key, value);
                    (key, mapped)
                })
                .collect(),
        }
    }

    /// For each of `names`, the other names it shares at least one region
    /// with. Names that own no region map to an empty list.
    pub fn boundaries<'a>(
        &self,
        names: impl IntoIterator<Item = &'a SetName>,
    ) -> BTreeMap<SetName, Vec<SetName>> {
        let mut neighbours: BTreeMap<SetName, BTreeSet<SetName>> = names
            .into_iter()
            .map(|name| (name.clone(), BTreeSet::new()))
            .collect();

        for key in self.regions.keys() {
            for name in key {
                if let Some(adjacent) = neighbours.get_mut(name) {
                    adjacent.extend(key.iter().filter(|other| *other != name).cloned());
                }
            }
        }

        neighbours
            .into_iter()
            .map(|(name, adjacent)| (name, adjacent.into_iter().collect()))
            .collect()
    }
}

impl<S: SetLike> Diagram<S>
where
    S::Item: Ord + Serialize,
{
    /// Records in key order with sorted elements.
    pub fn records(&self) -> Vec<RegionRecord<S::Item>> {
        self.regions
            .iter()
            .map(|(key, region)| {
                let mut elements: Vec<S::Item> = region.elements().collect();
                elements.sort();
                RegionRecord {
                    key: key.clone(),
                    elements,
                }
            })
            .collect()
    }

    /// Deterministic SHA-256 fingerprint of the diagram content.
    ///
    /// Independent of element iteration order, so two computations over
    /// equivalent input produce the same fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for record in self.records() {
            hasher.update(b"region:");
            hasher.update(serde_json::to_string(&record.key).unwrap_or_default());
            hasher.update(b"=");
            hasher.update(serde_json::to_string(&record.elements).unwrap_or_default());
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }
}

impl<S> IntoIterator for Diagram<S> {
    type Item = (CombinationKey, S);
    type IntoIter = std::collections::btree_map::IntoIter<CombinationKey, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.regions.into_iter()
    }
}

/// Compute the Euler diagram of `sets`.
///
/// The input sets are never mutated; every region is a fresh value
/// produced by the set operations. Panics raised by a misbehaving
/// [`SetLike`] implementation propagate unchanged.
pub fn partition<S: SetLike>(sets: &NamedSets<S>) -> Diagram<S> {
    tracing::debug!(sets = sets.len(), "partitioning named sets");

    let mut regions: Vec<(CombinationKey, S)> = Vec::new();

    for (name, set) in sets.iter() {
        let mut unclaimed = set.clone();
        let mut next = Vec::with_capacity(regions.len() * 2 + 1);

        for (key, region) in regions {
            if unclaimed.is_empty() {
                next.push((key, region));
                continue;
            }

            let inside = region.intersection(&unclaimed);
            if inside.is_empty() {
                next.push((key, region));
                continue;
            }

            let outside = region.difference(&unclaimed);
            unclaimed = unclaimed.difference(&inside);
            next.push((key.with(name), inside));
            if !outside.is_empty() {
                next.push((key, outside));
            }
        }

        if !unclaimed.is_empty() {
            next.push((CombinationKey::single(name.clone()), unclaimed));
        }

        tracing::trace!(set = %name, regions = next.len(), "inserted set");
        regions = next;
    }

    Diagram {
        regions: regions.into_iter().collect(),
    }
}

/// Combination keys of the non-empty regions, in canonical order.
pub fn combination_keys<S: SetLike>(sets: &NamedSets<S>) -> Vec<CombinationKey> {
    partition(sets).regions.into_keys().collect()
}

/// For each input name, the names it shares a non-empty region with.
pub fn boundaries<S: SetLike>(sets: &NamedSets<S>) -> BTreeMap<SetName, Vec<SetName>> {
    partition(sets).boundaries(sets.names())
}

/// Check a computed diagram against its input.
///
/// Verifies non-emptiness, pairwise disjointness, coverage of the input
/// union, and membership correctness. Intended for exercising new
/// [`SetLike`] implementations; a correct implementation always passes.
pub fn verify_partition<S>(sets: &NamedSets<S>, diagram: &Diagram<S>) -> Result<(), KernelError>
where
    S: SetLike,
    S::Item: Eq + Hash + Clone + std::fmt::Debug,
{
    let mut owner: HashMap<S::Item, &CombinationKey> = HashMap::new();

    for (key, region) in diagram.iter() {
        if region.is_empty() {
            return Err(KernelError::ContractViolation {
                operation: Capability::IsEmpty,
                region: key.clone(),
                description: "diagram contains an empty region".to_string(),
            });
        }
        for element in region.elements() {
            if let Some(previous) = owner.insert(element.clone(), key) {
                return Err(KernelError::ContractViolation {
                    operation: Capability::Intersection,
                    region: key.clone(),
                    description: format!("element {element:?} also appears in region {previous}"),
                });
            }
        }
    }

    let mut covered: HashSet<S::Item> = HashSet::new();
    for (name, set) in sets.iter() {
        for element in set.elements() {
            let Some(key) = owner.get(&element) else {
                return Err(KernelError::ContractViolation {
                    operation: Capability::Difference,
                    region: CombinationKey::single(name.clone()),
                    description: format!("element {element:?} of set {name} is in no region"),
                });
            };
            if !key.contains(name) {
                return Err(KernelError::ContractViolation {
                    operation: Capability::Difference,
                    region: (*key).clone(),
                    description: format!("element {element:?} belongs to {name} but not to its region key"),
                });
            }
            covered.insert(element);
        }
    }

    for (element, key) in &owner {
        if !covered.contains(element) {
            return Err(KernelError::ContractViolation {
                operation: Capability::Union,
                region: (*key).clone(),
                description: format!("element {element:?} is not a member of any input set"),
            });
        }
        let members = key
            .iter()
            .filter(|name| {
                sets.get(name)
                    .is_some_and(|set| set.elements().any(|e| &e == element))
            })
            .count();
        if members != key.len() {
            return Err(KernelError::ContractViolation {
                operation: Capability::Intersection,
                region: (*key).clone(),
                description: format!("element {element:?} is missing from a set named by its key"),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{HashSetAdapter, OrderedSet};

    fn ordered(pairs: &[(&str, &[i64])]) -> NamedSets<OrderedSet<i64>> {
        NamedSets::try_from_pairs(
            pairs
                .iter()
                .map(|(name, items)| (*name, OrderedSet::from_sequence(items.iter().copied()))),
        )
        .unwrap()
    }

    fn rendered(diagram: &Diagram<OrderedSet<i64>>) -> Vec<(String, Vec<i64>)> {
        diagram
            .records()
            .into_iter()
            .map(|r| (r.key.to_string(), r.elements))
            .collect()
    }

    #[test]
    fn four_overlapping_sets() {
        let sets = ordered(&[
            ("a", &[1, 2, 3]),
            ("b", &[2, 3, 4]),
            ("c", &[3, 4, 5]),
            ("d", &[3, 5, 6]),
        ]);
        let diagram = partition(&sets);
        assert_eq!(
            rendered(&diagram),
            vec![
                ("(a)".to_string(), vec![1]),
                ("(d)".to_string(), vec![6]),
                ("(a, b)".to_string(), vec![2]),
                ("(b, c)".to_string(), vec![4]),
                ("(c, d)".to_string(), vec![5]),
                ("(a, b, c, d)".to_string(), vec![3]),
            ]
        );
        verify_partition(&sets, &diagram).unwrap();
    }

    #[test]
    fn single_set_is_its_own_region() {
        let sets = ordered(&[("only", &[1, 2])]);
        let diagram = partition(&sets);
        assert_eq!(rendered(&diagram), vec![("(only)".to_string(), vec![1, 2])]);
    }

    #[test]
    fn disjoint_sets_have_no_combination() {
        let sets = ordered(&[("x", &[1, 2]), ("y", &[3, 4])]);
        let keys = combination_keys(&sets);
        assert_eq!(keys, vec![CombinationKey::of(["x"]), CombinationKey::of(["y"])]);
    }

    #[test]
    fn identical_sets_collapse_into_one_region() {
        let sets = ordered(&[("x", &[1, 2]), ("y", &[1, 2])]);
        let diagram = partition(&sets);
        assert_eq!(rendered(&diagram), vec![("(x, y)".to_string(), vec![1, 2])]);
    }

    #[test]
    fn empty_input_and_empty_sets() {
        assert!(partition(&NamedSets::<OrderedSet<i64>>::new()).is_empty());

        let sets = ordered(&[("e", &[]), ("x", &[1])]);
        let diagram = partition(&sets);
        assert_eq!(rendered(&diagram), vec![("(x)".to_string(), vec![1])]);
    }

    #[test]
    fn region_values_keep_left_operand_order() {
        let sets = ordered(&[("a", &[5, 4, 3, 2, 1]), ("b", &[1, 3, 5])]);
        let diagram = partition(&sets);
        let both = diagram.get(&CombinationKey::of(["a", "b"])).unwrap();
        assert_eq!(both.as_slice(), &[5, 3, 1]);
        let only_a = diagram.get(&CombinationKey::of(["a"])).unwrap();
        assert_eq!(only_a.as_slice(), &[4, 2]);
    }

    #[test]
    fn boundaries_list_adjacent_sets() {
        let sets = ordered(&[
            ("a", &[1, 2]),
            ("b", &[2, 3]),
            ("c", &[3]),
            ("d", &[9]),
            ("e", &[]),
        ]);
        let boundaries = boundaries(&sets);
        let names = |xs: &[&str]| xs.iter().map(|x| SetName::from(*x)).collect::<Vec<_>>();
        assert_eq!(boundaries[&SetName::from("a")], names(&["b"]));
        assert_eq!(boundaries[&SetName::from("b")], names(&["a", "c"]));
        assert_eq!(boundaries[&SetName::from("c")], names(&["b"]));
        assert!(boundaries[&SetName::from("d")].is_empty());
        assert!(boundaries[&SetName::from("e")].is_empty());
    }

    #[test]
    fn inputs_are_not_mutated() {
        let sets = ordered(&[("a", &[1, 2, 3]), ("b", &[3])]);
        let _ = partition(&sets);
        let a = sets.get(&SetName::from("a")).unwrap();
        assert_eq!(a.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = NamedSets::try_from_pairs([
            ("a", HashSetAdapter::from_elements([1])),
            ("a", HashSetAdapter::from_elements([2])),
        ])
        .unwrap_err();
        assert!(matches!(err, KernelError::DuplicateName(SetName::Label(ref n)) if n == "a"));
    }

    #[test]
    fn fingerprint_ignores_iteration_order() {
        let a = NamedSets::try_from_pairs([
            ("a", HashSetAdapter::from_elements(0..50)),
            ("b", HashSetAdapter::from_elements(25..75)),
        ])
        .unwrap();
        let b = NamedSets::try_from_pairs([
            ("a", HashSetAdapter::from_elements((0..50).rev())),
            ("b", HashSetAdapter::from_elements((25..75).rev())),
        ])
        .unwrap();
        assert_eq!(partition(&a).fingerprint(), partition(&b).fingerprint());
    }

    #[test]
    fn verify_rejects_overlapping_regions() {
        let sets = ordered(&[("a", &[1, 2]), ("b", &[2])]);
        let mut regions = BTreeMap::new();
        regions.insert(CombinationKey::of(["a"]), OrderedSet::from_sequence([1, 2]));
        regions.insert(CombinationKey::of(["a", "b"]), OrderedSet::from_sequence([2]));
        let err = verify_partition(&sets, &Diagram::from_regions(regions)).unwrap_err();
        assert!(matches!(
            err,
            KernelError::ContractViolation {
                operation: Capability::Intersection,
                ..
            }
        ));
    }

    #[test]
    fn verify_rejects_missing_elements() {
        let sets = ordered(&[("a", &[1, 2])]);
        let mut regions = BTreeMap::new();
        regions.insert(CombinationKey::of(["a"]), OrderedSet::from_sequence([1]));
        let err = verify_partition(&sets, &Diagram::from_regions(regions)).unwrap_err();
        assert!(matches!(
            err,
            KernelError::ContractViolation {
                operation: Capability::Difference,
                ..
            }
        ));
    }
}

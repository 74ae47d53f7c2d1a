//! Adapting whole inputs and unwrapping results.

use crate::any_set::AnySet;
use crate::error::EuleError;
use crate::raw::SetsInput;
use crate::registry::{TypeRegistry, registry};
use eule_kernel::{
    CombinationKey, Diagram, Element, HashSetAdapter, NamedSets, NativeSet, OrderedSet, SetLike,
};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};

/// Adapt every entry with the process-wide registry.
pub fn adapt_all(input: &SetsInput) -> Result<NamedSets<AnySet>, EuleError> {
    adapt_all_with(registry(), input)
}

/// Adapt every entry, in input order.
///
/// Fails on the first entry that cannot be adapted, naming it and its type.
pub fn adapt_all_with(
    registry: &TypeRegistry,
    input: &SetsInput,
) -> Result<NamedSets<AnySet>, EuleError> {
    let mut sets = NamedSets::new();
    for (name, raw) in input.entries() {
        let adapted = registry.adapt(raw).map_err(|source| EuleError::Adaptation {
            name: name.clone(),
            type_name: raw.type_name().to_string(),
            source,
        })?;
        tracing::trace!(set = %name, strategy = %adapted.strategy, "adapted set");
        sets.push(name, adapted.set)?;
    }
    Ok(sets)
}

/// A region converted back to a plain container where possible.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionValue {
    /// From the ordered adapter; keeps first-occurrence order.
    Ordered(Vec<Element>),
    /// From the hash-set adapter.
    Hashed(HashSet<Element>),
    /// A custom set-like value without a native form.
    Adapted(AnySet),
}

impl RegionValue {
    pub fn from_set(set: AnySet) -> Self {
        match set.to_native() {
            Some(NativeSet::Ordered(items)) => Self::Ordered(items),
            Some(NativeSet::Hashed(items)) => Self::Hashed(items),
            None => Self::Adapted(set),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Ordered(items) => items.len(),
            Self::Hashed(items) => items.len(),
            Self::Adapted(set) => set.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, element: &Element) -> bool {
        match self {
            Self::Ordered(items) => items.contains(element),
            Self::Hashed(items) => items.contains(element),
            Self::Adapted(set) => set.contains(element),
        }
    }

    pub fn to_hash_set(&self) -> HashSet<Element> {
        match self {
            Self::Ordered(items) => items.iter().cloned().collect(),
            Self::Hashed(items) => items.clone(),
            Self::Adapted(set) => set.to_hash_set(),
        }
    }

    /// Elements in a stable order: container order for sequences, sorted
    /// otherwise.
    pub fn elements(&self) -> Vec<Element> {
        match self {
            Self::Ordered(items) => items.clone(),
            Self::Hashed(items) => {
                let mut sorted: Vec<Element> = items.iter().cloned().collect();
                sorted.sort();
                sorted
            }
            Self::Adapted(set) => set.sorted_elements(),
        }
    }

    /// Re-wrap as a set-like value.
    pub fn into_set(self) -> AnySet {
        match self {
            Self::Ordered(items) => AnySet::new(OrderedSet::from_sequence(items)),
            Self::Hashed(items) => AnySet::new(HashSetAdapter::new(items)),
            Self::Adapted(set) => set,
        }
    }
}

impl Serialize for RegionValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.elements())
    }
}

/// Convert every region back to its native form.
pub fn unwrap(diagram: Diagram<AnySet>) -> BTreeMap<CombinationKey, RegionValue> {
    diagram
        .into_iter()
        .map(|(key, set)| (key, RegionValue::from_set(set)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use eule_kernel::{SetName, partition};

    #[derive(Debug)]
    struct Opaque;

    #[test]
    fn adapts_in_input_order() {
        let registry = TypeRegistry::new();
        let input = SetsInput::mapping()
            .with_value("b", vec![1u8])
            .with_value("a", HashSet::from([2u8]));
        let sets = adapt_all_with(&registry, &input).unwrap();
        let names: Vec<&SetName> = sets.names().collect();
        assert_eq!(names, vec![&SetName::from("b"), &SetName::from("a")]);
    }

    #[test]
    fn failure_names_entry_and_type() {
        let registry = TypeRegistry::new();
        let input = SetsInput::mapping()
            .with_value("ok", vec![1u8])
            .with_value("bad", Opaque);
        let err = adapt_all_with(&registry, &input).unwrap_err();
        match err {
            EuleError::Adaptation { name, type_name, .. } => {
                assert_eq!(name, SetName::from("bad"));
                assert!(type_name.ends_with("Opaque"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unwrap_restores_native_kinds() {
        let registry = TypeRegistry::new();
        let input = SetsInput::mapping()
            .with_value("seq", vec![3u8, 1])
            .with_value("set", HashSet::from([1u8, 2]));
        let diagram = partition(&adapt_all_with(&registry, &input).unwrap());
        let regions = unwrap(diagram);

        let seq_only = &regions[&CombinationKey::single("seq")];
        assert_eq!(seq_only, &RegionValue::Ordered(vec![Element::from(3)]));

        let set_only = &regions[&CombinationKey::single("set")];
        assert_eq!(set_only, &RegionValue::Hashed(HashSet::from([Element::from(2)])));

        let shared = &regions[&CombinationKey::of(["seq", "set"])];
        assert_eq!(shared, &RegionValue::Ordered(vec![Element::from(1)]));
    }

    #[test]
    fn region_values_serialize_as_element_lists() {
        let value = RegionValue::Hashed(HashSet::from([Element::from(2), Element::from(1)]));
        assert_eq!(serde_json::to_string(&value).unwrap(), "[1,2]");
        assert_eq!(value.clone().into_set().len(), 2);
        assert!(value.contains(&Element::from(1)));
    }
}

//! The `Euler` facade: a computed diagram together with its input sets.

use crate::adaptation::{RegionValue, adapt_all, unwrap};
use crate::any_set::AnySet;
use crate::config::PartitionConfig;
use crate::error::EuleError;
use crate::raw::SetsInput;
use crate::validation::validate_with;
use eule_kernel::{
    CombinationKey, Diagram, Element, NamedSets, SetLike, SetName, partition, verify_partition,
};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// What [`Euler::get`] looks up: one set, or the union of several.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Name(SetName),
    Names(Vec<SetName>),
}

impl From<SetName> for Lookup {
    fn from(name: SetName) -> Self {
        Self::Name(name)
    }
}

impl From<&SetName> for Lookup {
    fn from(name: &SetName) -> Self {
        Self::Name(name.clone())
    }
}

impl From<&str> for Lookup {
    fn from(name: &str) -> Self {
        Self::Name(SetName::from(name))
    }
}

impl From<usize> for Lookup {
    fn from(index: usize) -> Self {
        Self::Name(SetName::Index(index))
    }
}

impl From<Vec<SetName>> for Lookup {
    fn from(names: Vec<SetName>) -> Self {
        Self::Names(names)
    }
}

impl From<&[SetName]> for Lookup {
    fn from(names: &[SetName]) -> Self {
        Self::Names(names.to_vec())
    }
}

impl<const N: usize> From<[&str; N]> for Lookup {
    fn from(names: [&str; N]) -> Self {
        Self::Names(names.into_iter().map(SetName::from).collect())
    }
}

/// Named sets and their Euler diagram.
#[derive(Debug, Clone)]
pub struct Euler {
    sets: NamedSets<AnySet>,
    diagram: Diagram<AnySet>,
}

impl Euler {
    pub fn new(input: &SetsInput) -> Result<Self, EuleError> {
        Self::with_config(input, &PartitionConfig::default())
    }

    pub fn with_config(input: &SetsInput, config: &PartitionConfig) -> Result<Self, EuleError> {
        validate_with(input, config)?;
        let euler = Self::from_sets(adapt_all(input)?);
        if config.verify {
            verify_partition(&euler.sets, &euler.diagram)?;
        }
        Ok(euler)
    }

    /// Partition sets that are already adapted.
    pub fn from_sets(sets: NamedSets<AnySet>) -> Self {
        let diagram = partition(&sets);
        Self { sets, diagram }
    }

    pub fn names(&self) -> impl Iterator<Item = &SetName> {
        self.sets.names()
    }

    /// The input set called `name`.
    pub fn set(&self, name: &SetName) -> Option<&AnySet> {
        self.sets.get(name)
    }

    /// Look up one set by name, or the union of a group of names.
    ///
    /// ```
    /// # use eule::{Euler, SetsInput};
    /// let input = SetsInput::mapping()
    ///     .with_value("a", vec![1, 2])
    ///     .with_value("b", vec![2, 3]);
    /// let euler = Euler::new(&input).unwrap();
    /// assert_eq!(euler.get("a").unwrap().len(), 2);
    /// assert_eq!(euler.get(["a", "b"]).unwrap().len(), 3);
    /// ```
    pub fn get(&self, lookup: impl Into<Lookup>) -> Result<AnySet, EuleError> {
        match lookup.into() {
            Lookup::Name(name) => self
                .sets
                .get(&name)
                .cloned()
                .ok_or(EuleError::UnknownName(name)),
            Lookup::Names(names) => self.union_of(&names),
        }
    }

    /// Union of the named input sets. An empty list gives the empty set.
    pub fn union_of(&self, names: &[SetName]) -> Result<AnySet, EuleError> {
        let mut result: Option<AnySet> = None;
        for name in names {
            let set = self
                .sets
                .get(name)
                .ok_or_else(|| EuleError::UnknownName(name.clone()))?;
            result = Some(match result {
                Some(acc) => acc.union(set),
                None => set.clone(),
            });
        }
        Ok(result.unwrap_or_else(AnySet::empty))
    }

    pub fn region(&self, key: &CombinationKey) -> Option<&AnySet> {
        self.diagram.get(key)
    }

    pub fn keys(&self) -> Vec<CombinationKey> {
        self.diagram.keys().cloned().collect()
    }

    pub fn diagram(&self) -> &Diagram<AnySet> {
        &self.diagram
    }

    /// For each set, the other sets it shares a region with.
    pub fn boundaries(&self) -> BTreeMap<SetName, Vec<SetName>> {
        self.diagram.boundaries(self.sets.names())
    }

    /// Regions in their native form.
    pub fn regions(&self) -> BTreeMap<CombinationKey, RegionValue> {
        unwrap(self.diagram.clone())
    }

    /// Key of the sets entirely contained in `items`.
    pub fn match_items(&self, items: &HashSet<Element>) -> CombinationKey {
        CombinationKey::new(
            self.sets
                .iter()
                .filter(|(_, set)| set.is_subset_of(items))
                .map(|(name, _)| name.clone()),
        )
    }

    /// Remove a set, updating only the regions that referenced it.
    ///
    /// Elements of region `K ∪ {name}` move to region `K`; regions whose key
    /// was `{name}` alone disappear. Returns the removed set, or `None` with
    /// a warning when no set has that name.
    pub fn remove(&mut self, name: &SetName) -> Option<AnySet> {
        let Some(removed) = self.sets.remove(name) else {
            tracing::warn!(set = %name, "cannot remove unknown set");
            return None;
        };

        let mut regions: BTreeMap<CombinationKey, AnySet> = BTreeMap::new();
        for (key, region) in std::mem::take(&mut self.diagram).into_iter() {
            let key = if key.contains(name) {
                CombinationKey::new(key.iter().filter(|n| *n != name).cloned())
            } else {
                key
            };
            if key.is_empty() {
                continue;
            }
            match regions.remove(&key) {
                Some(existing) => regions.insert(key, existing.union(&region)),
                None => regions.insert(key, region),
            };
        }
        self.diagram = Diagram::from_regions(regions);
        tracing::debug!(set = %name, regions = self.diagram.len(), "removed set");
        Some(removed)
    }
}

impl fmt::Display for Euler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Euler({")?;
        for (i, (key, region)) in self.diagram.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}: [")?;
            for (j, element) in region.sorted_elements().iter().enumerate() {
                if j > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{element}")?;
            }
            f.write_str("]")?;
        }
        f.write_str("})")
    }
}

//! Set names and combination keys.
//!
//! A combination key identifies a region by the exact set of input names
//! whose sets contain it. Keys are canonical: names are sorted and
//! deduplicated, so the same membership signature always produces the
//! same key regardless of insertion order.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Label of one input set.
///
/// List inputs are named by position (`Index`); mappings use text labels or
/// multi-part paths. Ordering is `Index < Label < Path`, then natural order
/// within each variant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SetName {
    Index(usize),
    Label(String),
    Path(Vec<String>),
}

impl SetName {
    pub fn label(s: impl Into<String>) -> Self {
        Self::Label(s.into())
    }
}

impl fmt::Display for SetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Label(s) => write!(f, "{s}"),
            Self::Path(parts) => write!(f, "({})", parts.join(", ")),
        }
    }
}

impl From<&str> for SetName {
    fn from(value: &str) -> Self {
        Self::Label(value.to_string())
    }
}

impl From<String> for SetName {
    fn from(value: String) -> Self {
        Self::Label(value)
    }
}

impl From<usize> for SetName {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}

impl From<Vec<String>> for SetName {
    fn from(value: Vec<String>) -> Self {
        Self::Path(value)
    }
}

impl From<&[&str]> for SetName {
    fn from(value: &[&str]) -> Self {
        Self::Path(value.iter().map(|s| s.to_string()).collect())
    }
}

/// Canonical tuple of set names identifying one region.
///
/// Keys order first by the number of names (single-set regions before
/// pairwise overlaps, and so on), then lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombinationKey(Vec<SetName>);

impl CombinationKey {
    /// Build a key from any collection of names (sorted, deduplicated).
    pub fn new(names: impl IntoIterator<Item = SetName>) -> Self {
        let mut names: Vec<SetName> = names.into_iter().collect();
        names.sort();
        names.dedup();
        Self(names)
    }

    /// Key of a region owned by exactly one set.
    pub fn single(name: impl Into<SetName>) -> Self {
        Self(vec![name.into()])
    }

    /// Build a key from anything convertible to set names.
    pub fn of<N: Into<SetName>>(names: impl IntoIterator<Item = N>) -> Self {
        Self::new(names.into_iter().map(Into::into))
    }

    /// This key extended by one more name.
    pub fn with(&self, name: &SetName) -> Self {
        match self.0.binary_search(name) {
            Ok(_) => self.clone(),
            Err(pos) => {
                let mut names = self.0.clone();
                names.insert(pos, name.clone());
                Self(names)
            }
        }
    }

    pub fn names(&self) -> &[SetName] {
        &self.0
    }

    pub fn contains(&self, name: &SetName) -> bool {
        self.0.binary_search(name).is_ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SetName> {
        self.0.iter()
    }
}

impl Ord for CombinationKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for CombinationKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CombinationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, name) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}")?;
        }
        write!(f, ")")
    }
}

impl<'a> IntoIterator for &'a CombinationKey {
    type Item = &'a SetName;
    type IntoIter = std::slice::Iter<'a, SetName>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

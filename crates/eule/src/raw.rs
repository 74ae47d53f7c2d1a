//! Raw, not-yet-adapted inputs.
//!
//! A [`RawSet`] holds any value by type: a `Vec<u32>`, a `HashSet<String>`,
//! a user struct, a JSON scalar. Whether it can take part in a partition is
//! decided later by the type registry. [`SetsInput`] is the whole input:
//! either a mapping from names to raw values or a positional list.

use crate::any_set::AnySet;
use crate::error::EuleError;
use eule_kernel::{Element, SetLike, SetName};
use serde_json::Value;
use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;

/// Structural check recorded for values declared set-like at construction.
pub type StructuralProbe = fn(&dyn Any) -> Option<AnySet>;

/// Elements materialized from an arbitrary iterable.
///
/// Adapted through the iterable fallback, after every other strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized(pub Vec<Element>);

/// A named value awaiting adaptation.
pub struct RawSet {
    value: Box<dyn Any + Send + Sync>,
    type_name: Cow<'static, str>,
    structural: Option<StructuralProbe>,
}

pub(crate) fn probe<S>(value: &dyn Any) -> Option<AnySet>
where
    S: SetLike<Item = Element> + fmt::Debug + Send + Sync + 'static,
{
    value.downcast_ref::<S>().map(|set| AnySet::new(set.clone()))
}

impl RawSet {
    /// Wrap any value. Adaptation is looked up by its concrete type.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: Cow::Borrowed(std::any::type_name::<T>()),
            structural: None,
        }
    }

    /// Wrap a value that implements [`SetLike`] itself.
    ///
    /// The value is used with its own algebra as is. Exact-type adapters,
    /// detectors and the cache are not consulted.
    pub fn set_like<S>(set: S) -> Self
    where
        S: SetLike<Item = Element> + fmt::Debug + Send + Sync + 'static,
    {
        Self {
            structural: Some(probe::<S>),
            ..Self::new(set)
        }
    }

    /// Wrap an already adapted set; it is used as is.
    pub fn adapted(set: AnySet) -> Self {
        Self::new(set)
    }

    /// Materialize any iterable of element-convertible values.
    pub fn iterable<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Element>,
    {
        Self::new(Materialized(items.into_iter().map(Into::into).collect()))
    }

    /// Convert a JSON value.
    ///
    /// Arrays whose items are all valid elements become `Vec<Element>`.
    /// Anything else is kept as the raw JSON value and fails adaptation
    /// unless an adapter is registered for `serde_json::Value`.
    pub fn from_json(value: &Value) -> Self {
        if let Value::Array(items) = value {
            if let Some(elements) = items.iter().map(Element::from_json).collect::<Option<Vec<_>>>() {
                return Self::new(elements).named("json array");
            }
        }
        let kind = match value {
            Value::Null => "json null",
            Value::Bool(_) => "json bool",
            Value::Number(_) => "json number",
            Value::String(_) => "json string",
            Value::Array(_) => "json array with unsupported elements",
            Value::Object(_) => "json object",
        };
        Self::new(value.clone()).named(kind)
    }

    fn named(mut self, type_name: &'static str) -> Self {
        self.type_name = Cow::Borrowed(type_name);
        self
    }

    /// Name of the wrapped value's type, used in diagnostics.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// `TypeId` of the wrapped value.
    pub fn value_type_id(&self) -> TypeId {
        (*self.value).type_id()
    }

    pub fn as_any(&self) -> &dyn Any {
        &*self.value
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn structural_probe(&self) -> Option<StructuralProbe> {
        self.structural
    }
}

impl fmt::Debug for RawSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawSet")
            .field("type_name", &self.type_name)
            .field("set_like", &self.structural.is_some())
            .finish_non_exhaustive()
    }
}

/// The collection of sets handed to the top-level operations.
#[derive(Debug)]
pub enum SetsInput {
    /// Explicitly named sets, in insertion order.
    Mapping(Vec<(SetName, RawSet)>),
    /// Positional sets, named `0, 1, 2, …`.
    List(Vec<RawSet>),
}

impl Default for SetsInput {
    fn default() -> Self {
        Self::Mapping(Vec::new())
    }
}

impl SetsInput {
    pub fn mapping() -> Self {
        Self::default()
    }

    pub fn list(items: impl IntoIterator<Item = RawSet>) -> Self {
        Self::List(items.into_iter().collect())
    }

    /// Append a named raw set. A list input becomes a mapping whose
    /// existing entries keep their positional names.
    pub fn with(self, name: impl Into<SetName>, raw: RawSet) -> Self {
        let mut entries = self.into_entries();
        entries.push((name.into(), raw));
        Self::Mapping(entries)
    }

    /// Append a named value, wrapping it with [`RawSet::new`].
    pub fn with_value<T: Any + Send + Sync>(self, name: impl Into<SetName>, value: T) -> Self {
        self.with(name, RawSet::new(value))
    }

    /// Parse `{"name": [...], ...}` or `[[...], ...]`.
    pub fn from_json(value: &Value) -> Result<Self, EuleError> {
        match value {
            Value::Object(map) => Ok(Self::Mapping(
                map.iter()
                    .map(|(name, set)| (SetName::from(name.as_str()), RawSet::from_json(set)))
                    .collect(),
            )),
            Value::Array(items) => Ok(Self::List(items.iter().map(RawSet::from_json).collect())),
            other => Err(EuleError::InputShape {
                description: format!(
                    "sets must be a JSON object or array, got {}",
                    json_kind(other)
                ),
            }),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, EuleError> {
        let value: Value = serde_json::from_str(json).map_err(|e| EuleError::InputShape {
            description: format!("invalid JSON: {e}"),
        })?;
        Self::from_json(&value)
    }

    /// Entries with normalized names.
    pub fn entries(&self) -> Vec<(SetName, &RawSet)> {
        match self {
            Self::Mapping(entries) => entries.iter().map(|(name, raw)| (name.clone(), raw)).collect(),
            Self::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, raw)| (SetName::Index(i), raw))
                .collect(),
        }
    }

    pub fn into_entries(self) -> Vec<(SetName, RawSet)> {
        match self {
            Self::Mapping(entries) => entries,
            Self::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, raw)| (SetName::Index(i), raw))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Mapping(entries) => entries.len(),
            Self::List(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

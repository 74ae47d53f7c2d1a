//! Elements: the members of partitioned sets.
//!
//! The typed engine is generic over any element type. `Element` is the
//! canonical element used wherever sets of different concrete types must
//! be compared against each other (the dynamic adaptation layer, JSON
//! fixtures, cluster merges).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// An `f64` with bitwise equality and a total order.
///
/// `-0.0` is stored as `0.0` and every NaN as the canonical `f64::NAN`, so
/// equal-looking values hash alike. Ordering follows `f64::total_cmp`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Float(f64);

impl Float {
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            Self(f64::NAN)
        } else if value == 0.0 {
            Self(0.0)
        } else {
            Self(value)
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl From<f64> for Float {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Float> for f64 {
    fn from(value: Float) -> Self {
        value.0
    }
}

impl PartialEq for Float {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Float {}

impl Hash for Float {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl Ord for Float {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for Float {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Float {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// A hashable, totally ordered set member.
///
/// Integers that fit in `i64` are always stored as `Int`; `UInt` only
/// carries values above `i64::MAX`. Floats with an integral value in `i64`
/// range convert to `Int`, so `3.0` and `3` are the same element.
///
/// Ordering is `Bool < numbers < Text < Tuple`. Numbers of different
/// variants compare by value, with ties broken `Int < UInt < Float`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Element {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(Float),
    Text(String),
    Tuple(Vec<Element>),
}

impl Element {
    /// Parse an element from JSON.
    ///
    /// Returns `None` for objects and null, which have no element
    /// representation.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;
        match value {
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_u64().map(Self::UInt))
                .or_else(|| n.as_f64().map(Self::from)),
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Option<Vec<_>>>()
                .map(Self::Tuple),
            Value::Null | Value::Object(_) => None,
        }
    }

    /// Short name of the element's variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) | Self::UInt(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Tuple(_) => "tuple",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Bool(_) => 0,
            Self::Int(_) | Self::UInt(_) | Self::Float(_) => 1,
            Self::Text(_) => 2,
            Self::Tuple(_) => 3,
        }
    }

    // Tie-break between numeric variants holding the same value.
    fn numeric_variant(&self) -> u8 {
        match self {
            Self::UInt(_) => 1,
            Self::Float(_) => 2,
            _ => 0,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::UInt(u) => Some(*u as f64),
            Self::Float(x) => Some(x.get()),
            _ => None,
        }
    }
}

impl Ord for Element {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::UInt(a), Self::UInt(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Tuple(a), Self::Tuple(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()).then_with(|| {
                match (self.as_f64(), other.as_f64()) {
                    (Some(a), Some(b)) => a.total_cmp(&b),
                    _ => Ordering::Equal,
                }
                .then_with(|| self.numeric_variant().cmp(&other.numeric_variant()))
            }),
        }
    }
}

impl PartialOrd for Element {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::UInt(u) => write!(f, "{u}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

macro_rules! element_from_signed {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Element {
                fn from(value: $ty) -> Self {
                    Self::Int(i64::from(value))
                }
            }
        )*
    };
}

macro_rules! element_from_unsigned {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Element {
                fn from(value: $ty) -> Self {
                    let wide = value as u64;
                    match i64::try_from(wide) {
                        Ok(i) => Self::Int(i),
                        Err(_) => Self::UInt(wide),
                    }
                }
            }
        )*
    };
}

element_from_signed!(i8, i16, i32, i64);
element_from_unsigned!(u8, u16, u32, u64, usize);

impl From<isize> for Element {
    fn from(value: isize) -> Self {
        Self::Int(value as i64)
    }
}

impl From<f64> for Element {
    /// Integral values in `i64` range become `Int`.
    fn from(value: f64) -> Self {
        let integral = value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64;
        if integral {
            Self::Int(value as i64)
        } else {
            Self::Float(Float::new(value))
        }
    }
}

impl From<Float> for Element {
    fn from(value: Float) -> Self {
        Self::from(value.get())
    }
}

impl From<f32> for Element {
    fn from(value: f32) -> Self {
        Self::from(f64::from(value))
    }
}

impl From<bool> for Element {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<char> for Element {
    fn from(value: char) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<&str> for Element {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Element {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for Element {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl<T: Into<Element>> From<Vec<T>> for Element {
    fn from(value: Vec<T>) -> Self {
        Self::Tuple(value.into_iter().map(Into::into).collect())
    }
}

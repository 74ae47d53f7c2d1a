//! Built-in conversions for standard containers.
//!
//! The table is keyed by `TypeId` and covers the standard collections over
//! the common element types. Each entry knows how to list the container's
//! elements and which adapter the container maps onto.

use crate::any_set::AnySet;
use crate::raw::Materialized;
use eule_kernel::{Element, Float, HashSetAdapter, OrderedSet, SetLike};
use serde::Serialize;
use std::any::{Any, TypeId};
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet, LinkedList, VecDeque};
use std::fmt;
use std::sync::LazyLock;

/// How a built-in container is adapted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinKind {
    /// `Vec`, boxed and static slices: ordered adapter, may repeat.
    Sequence,
    /// `BTreeSet`: ordered adapter, already unique.
    Sorted,
    /// `HashSet`: hash-set adapter.
    Hashed,
    /// Other iterables and strings: hash-set adapter, after every other
    /// strategy has been tried.
    Iterable,
}

impl BuiltinKind {
    /// Whether the container can hold the same element twice.
    pub fn may_repeat(self) -> bool {
        matches!(self, Self::Sequence | Self::Iterable)
    }
}

impl fmt::Display for BuiltinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sequence => "sequence",
            Self::Sorted => "sorted",
            Self::Hashed => "hashed",
            Self::Iterable => "iterable",
        })
    }
}

type ElementsFn = Box<dyn Fn(&dyn Any) -> Option<Vec<Element>> + Send + Sync>;

pub(crate) struct BuiltinEntry {
    pub(crate) kind: BuiltinKind,
    elements: ElementsFn,
}

impl BuiltinEntry {
    /// Elements in container order, duplicates included.
    pub(crate) fn elements(&self, value: &dyn Any) -> Option<Vec<Element>> {
        (self.elements)(value)
    }

    pub(crate) fn adapt(&self, value: &dyn Any) -> Option<AnySet> {
        let elements = self.elements(value)?;
        Some(match self.kind {
            BuiltinKind::Sequence | BuiltinKind::Sorted => {
                AnySet::new(OrderedSet::from_sequence(elements))
            }
            BuiltinKind::Hashed | BuiltinKind::Iterable => {
                AnySet::new(HashSetAdapter::from_elements(elements))
            }
        })
    }
}

type Table = HashMap<TypeId, BuiltinEntry>;

fn insert<T: Any>(table: &mut Table, kind: BuiltinKind, elements: fn(&T) -> Vec<Element>) {
    table.insert(
        TypeId::of::<T>(),
        BuiltinEntry {
            kind,
            elements: Box::new(move |value: &dyn Any| value.downcast_ref::<T>().map(elements)),
        },
    );
}

macro_rules! containers_of {
    ($table:ident; $($elem:ty),+ $(,)?) => {
        $(
            insert::<Vec<$elem>>(&mut $table, BuiltinKind::Sequence, |v| {
                v.iter().cloned().map(Element::from).collect()
            });
            insert::<Box<[$elem]>>(&mut $table, BuiltinKind::Sequence, |v| {
                v.iter().cloned().map(Element::from).collect()
            });
            insert::<&'static [$elem]>(&mut $table, BuiltinKind::Sequence, |v| {
                v.iter().cloned().map(Element::from).collect()
            });
            insert::<BTreeSet<$elem>>(&mut $table, BuiltinKind::Sorted, |v| {
                v.iter().cloned().map(Element::from).collect()
            });
            insert::<HashSet<$elem>>(&mut $table, BuiltinKind::Hashed, |v| {
                v.iter().cloned().map(Element::from).collect()
            });
            insert::<VecDeque<$elem>>(&mut $table, BuiltinKind::Iterable, |v| {
                v.iter().cloned().map(Element::from).collect()
            });
            insert::<LinkedList<$elem>>(&mut $table, BuiltinKind::Iterable, |v| {
                v.iter().cloned().map(Element::from).collect()
            });
            insert::<BinaryHeap<$elem>>(&mut $table, BuiltinKind::Iterable, |v| {
                v.iter().cloned().map(Element::from).collect()
            });
        )+
    };
}

// Bare floats are neither `Eq` nor `Ord`, so only sequence containers apply.
macro_rules! float_sequences_of {
    ($table:ident; $($elem:ty),+ $(,)?) => {
        $(
            insert::<Vec<$elem>>(&mut $table, BuiltinKind::Sequence, |v| {
                v.iter().copied().map(Element::from).collect()
            });
            insert::<Box<[$elem]>>(&mut $table, BuiltinKind::Sequence, |v| {
                v.iter().copied().map(Element::from).collect()
            });
            insert::<&'static [$elem]>(&mut $table, BuiltinKind::Sequence, |v| {
                v.iter().copied().map(Element::from).collect()
            });
            insert::<VecDeque<$elem>>(&mut $table, BuiltinKind::Iterable, |v| {
                v.iter().copied().map(Element::from).collect()
            });
            insert::<LinkedList<$elem>>(&mut $table, BuiltinKind::Iterable, |v| {
                v.iter().copied().map(Element::from).collect()
            });
        )+
    };
}

static BUILTINS: LazyLock<Table> = LazyLock::new(|| {
    let mut table = Table::new();
    containers_of!(table;
        Element, bool, char, String, &'static str,
        i8, i16, i32, i64, isize,
        u8, u16, u32, u64, usize, Float,
    );
    float_sequences_of!(table; f32, f64);
    // Strings iterate their characters.
    insert::<String>(&mut table, BuiltinKind::Iterable, |s| {
        s.chars().map(Element::from).collect()
    });
    insert::<&'static str>(&mut table, BuiltinKind::Iterable, |s| {
        s.chars().map(Element::from).collect()
    });
    insert::<Materialized>(&mut table, BuiltinKind::Iterable, |m| m.0.clone());
    table
});

pub(crate) fn lookup(type_id: TypeId) -> Option<&'static BuiltinEntry> {
    BUILTINS.get(&type_id)
}

/// Built-in adapter kind for a type, if it has one.
pub fn builtin_kind(type_id: TypeId) -> Option<BuiltinKind> {
    lookup(type_id).map(|entry| entry.kind)
}

//! # Eule Kernel
//!
//! Euler diagram partitioning: given named sets, split the union of their
//! elements into maximal non-overlapping regions, each tagged with exactly
//! the names of the sets containing it.
//!
//! This crate is **container-agnostic**: it does not prescribe what a set
//! is. Any type implementing [`SetLike`] can be partitioned; built-in
//! adapters cover `HashSet` and insertion-ordered sequences.
//!
//! ## Architecture
//!
//! ```text
//! Element / SetName       ← Members and labels
//!     │
//! SetLike                 ← union, intersection, difference, is_empty,
//!     │                     elements, from_elements
//! HashSetAdapter          ← Built-in adapters
//! OrderedSet
//!     │
//! NamedSets<S>            ← Uniquely named inputs
//!     │
//! partition → Diagram<S>  ← CombinationKey → non-empty region
//!     │
//! cluster                 ← Parallel sub-problems + key-collision merge
//! ```

pub mod adapters;
pub mod cluster;
pub mod contract;
pub mod element;
pub mod engine;
pub mod error;
pub mod key;

pub use adapters::{HashSetAdapter, OrderedSet};
pub use cluster::{KeyCollision, MergedDiagram, MergedKey, merge_clusters, partition_clusters};
pub use contract::{Capability, NativeSet, SetLike};
pub use element::{Element, Float};
pub use engine::{
    Diagram, NamedSets, RegionRecord, boundaries, combination_keys, partition, verify_partition,
};
pub use error::KernelError;
pub use key::{CombinationKey, SetName};

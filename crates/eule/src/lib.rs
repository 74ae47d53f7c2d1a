//! # Eule
//!
//! Euler diagrams over arbitrary set-like values.
//!
//! The [`eule_kernel`] crate partitions values of a single [`SetLike`]
//! type. This crate accepts heterogeneous inputs (standard collections,
//! user types, JSON) and adapts each to a shared [`AnySet`] through the
//! [`TypeRegistry`] before partitioning.
//!
//! ```
//! use eule::{CombinationKey, SetsInput};
//!
//! let input = SetsInput::mapping()
//!     .with_value("a", vec![1, 2, 3])
//!     .with_value("b", std::collections::HashSet::from([3, 4]));
//!
//! let regions = eule::partition(&input).unwrap();
//! assert_eq!(regions[&CombinationKey::of(["a", "b"])].len(), 1);
//! ```
//!
//! ## Modules
//!
//! - [`raw`]: raw inputs awaiting adaptation
//! - [`registry`]: exact types, detectors, built-ins and fallbacks
//! - [`adaptation`]: adapting inputs and unwrapping regions
//! - [`validation`]: name and duplicate checks
//! - [`euler`]: the [`Euler`] facade

pub mod adaptation;
pub mod any_set;
pub mod builtin;
pub mod config;
pub mod error;
pub mod euler;
pub mod raw;
pub mod registry;
pub mod validation;

pub use adaptation::{RegionValue, adapt_all, adapt_all_with, unwrap};
pub use any_set::{AnySet, DynSetLike};
pub use builtin::{BuiltinKind, builtin_kind};
pub use config::PartitionConfig;
pub use error::EuleError;
pub use euler::{Euler, Lookup};
pub use eule_kernel::{
    Capability, CombinationKey, Diagram, Element, Float, HashSetAdapter, KeyCollision, MergedDiagram,
    MergedKey, NamedSets, NativeSet, OrderedSet, RegionRecord, SetLike, SetName, merge_clusters,
};
pub use raw::{Materialized, RawSet, SetsInput};
pub use registry::{
    AdaptError, AdaptStrategy, Adapted, TypeRegistry, register_detector, register_set_like,
    register_type, registry,
};
pub use validation::{DuplicateWarning, ValidationReport, validate, validate_with};

use std::collections::BTreeMap;

/// Regions of the Euler diagram of `input`, in native form.
pub fn partition(input: &SetsInput) -> Result<BTreeMap<CombinationKey, RegionValue>, EuleError> {
    partition_with(input, &PartitionConfig::default())
}

pub fn partition_with(
    input: &SetsInput,
    config: &PartitionConfig,
) -> Result<BTreeMap<CombinationKey, RegionValue>, EuleError> {
    Ok(unwrap(diagram_with(input, config)?))
}

/// The diagram of `input` with regions left adapted.
pub fn diagram(input: &SetsInput) -> Result<Diagram<AnySet>, EuleError> {
    diagram_with(input, &PartitionConfig::default())
}

/// Validate, adapt and partition `input`.
pub fn diagram_with(
    input: &SetsInput,
    config: &PartitionConfig,
) -> Result<Diagram<AnySet>, EuleError> {
    validate_with(input, config)?;
    let sets = adapt_all(input)?;
    let diagram = eule_kernel::partition(&sets);
    if config.verify {
        eule_kernel::verify_partition(&sets, &diagram)?;
    }
    tracing::debug!(sets = sets.len(), regions = diagram.len(), "computed diagram");
    Ok(diagram)
}

/// Keys of the non-empty regions, in canonical order.
pub fn combination_keys(input: &SetsInput) -> Result<Vec<CombinationKey>, EuleError> {
    Ok(diagram(input)?.keys().cloned().collect())
}

/// For each set, the names of the sets it shares a region with.
pub fn boundaries(input: &SetsInput) -> Result<BTreeMap<SetName, Vec<SetName>>, EuleError> {
    validate(input)?;
    let sets = adapt_all(input)?;
    Ok(eule_kernel::boundaries(&sets))
}

fn adapt_clusters(
    clusters: &[SetsInput],
    config: &PartitionConfig,
) -> Result<Vec<NamedSets<AnySet>>, EuleError> {
    clusters
        .iter()
        .map(|input| {
            validate_with(input, config)?;
            adapt_all(input)
        })
        .collect()
}

/// Adapt and partition every cluster, verifying each one when configured.
fn cluster_diagrams(
    clusters: &[SetsInput],
    config: &PartitionConfig,
) -> Result<Vec<Diagram<AnySet>>, EuleError> {
    let adapted = adapt_clusters(clusters, config)?;
    let diagrams = eule_kernel::partition_clusters(&adapted, config.workers)?;
    if config.verify {
        for (sets, diagram) in adapted.iter().zip(&diagrams) {
            eule_kernel::verify_partition(sets, diagram)?;
        }
    }
    Ok(diagrams)
}

/// Partition independent clusters in parallel.
///
/// Every cluster is validated and adapted first; the first failure aborts
/// the whole call. Results are in cluster order.
pub fn partition_clusters(
    clusters: &[SetsInput],
    config: &PartitionConfig,
) -> Result<Vec<BTreeMap<CombinationKey, RegionValue>>, EuleError> {
    Ok(cluster_diagrams(clusters, config)?
        .into_iter()
        .map(unwrap)
        .collect())
}

/// Partition clusters and merge them into one diagram, tagging keys that
/// more than one cluster produced.
///
/// With `verify` set, each cluster is checked before merging.
pub fn partition_merged(
    clusters: &[SetsInput],
    config: &PartitionConfig,
) -> Result<MergedDiagram<AnySet>, EuleError> {
    let merged = merge_clusters(cluster_diagrams(clusters, config)?);
    for collision in &merged.collisions {
        tracing::warn!(
            key = %collision.key,
            first_cluster = collision.first_cluster,
            cluster = collision.cluster,
            "region key produced by more than one cluster"
        );
    }
    Ok(merged)
}

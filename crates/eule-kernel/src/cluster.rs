//! Cluster boundary: parallel partitioning of independent sub-problems and
//! merging of their diagrams.
//!
//! Grouping sets into clusters is the caller's concern. The kernel only
//! partitions each cluster independently and flattens the per-cluster
//! results into one map.
//!
//! When two clusters produce the same combination key (e.g. a set that was
//! placed in both clusters, or clusters reusing local names) the keys are
//! disambiguated: the first cluster in input order keeps the bare key and
//! every later occurrence is tagged with its cluster index.

use crate::contract::SetLike;
use crate::engine::{Diagram, NamedSets, partition};
use crate::error::KernelError;
use crate::key::CombinationKey;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Partition every cluster, in parallel.
///
/// Results are returned in cluster order. `workers` bounds the pool size;
/// `None` uses the global rayon pool.
pub fn partition_clusters<S>(
    clusters: &[NamedSets<S>],
    workers: Option<usize>,
) -> Result<Vec<Diagram<S>>, KernelError>
where
    S: SetLike + Send + Sync,
{
    tracing::debug!(clusters = clusters.len(), ?workers, "partitioning clusters");

    let run = || clusters.par_iter().map(partition).collect::<Vec<_>>();

    match workers {
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| KernelError::WorkerPool(e.to_string()))?;
            Ok(pool.install(run))
        }
        None => Ok(run()),
    }
}

/// Key of a merged region: the region key, tagged with its cluster when the
/// bare key was already taken by an earlier cluster.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MergedKey {
    pub cluster: Option<usize>,
    pub key: CombinationKey,
}

impl fmt::Display for MergedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cluster {
            Some(cluster) => write!(f, "#{cluster}:{}", self.key),
            None => write!(f, "{}", self.key),
        }
    }
}

/// A key produced by more than one cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCollision {
    pub key: CombinationKey,
    /// Cluster that kept the bare key.
    pub first_cluster: usize,
    /// Cluster whose region was re-keyed.
    pub cluster: usize,
}

/// Flattened regions of several cluster diagrams.
#[derive(Debug, Clone)]
pub struct MergedDiagram<S> {
    pub regions: BTreeMap<MergedKey, S>,
    pub collisions: Vec<KeyCollision>,
}

impl<S> MergedDiagram<S> {
    pub fn get(&self, key: &CombinationKey) -> Option<&S> {
        self.regions.get(&MergedKey {
            cluster: None,
            key: key.clone(),
        })
    }

    pub fn has_collisions(&self) -> bool {
        !self.collisions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Merge per-cluster diagrams, disambiguating repeated keys.
pub fn merge_clusters<S>(diagrams: Vec<Diagram<S>>) -> MergedDiagram<S> {
    let mut regions = BTreeMap::new();
    let mut owners: BTreeMap<CombinationKey, usize> = BTreeMap::new();
    let mut collisions = Vec::new();

    for (cluster, diagram) in diagrams.into_iter().enumerate() {
        for (key, region) in diagram {
            match owners.get(&key) {
                Some(&first_cluster) => {
                    tracing::debug!(%key, first_cluster, cluster, "combination key collision");
                    collisions.push(KeyCollision {
                        key: key.clone(),
                        first_cluster,
                        cluster,
                    });
                    regions.insert(
                        MergedKey {
                            cluster: Some(cluster),
                            key,
                        },
                        region,
                    );
                }
                None => {
                    owners.insert(key.clone(), cluster);
                    regions.insert(MergedKey { cluster: None, key }, region);
                }
            }
        }
    }

    MergedDiagram {
        regions,
        collisions,
    }
}

//! Error types for kernel operations.

use crate::contract::Capability;
use crate::key::{CombinationKey, SetName};

/// Errors raised while assembling inputs or running the engine.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    /// Two input sets share a name.
    #[error("duplicate set name: {0}")]
    DuplicateName(SetName),

    /// A set-like operation produced a result that breaks the contract.
    ///
    /// The engine cannot continue from a corrupted partial partition, so
    /// this is never recovered locally.
    #[error("contract violation in {operation} on region {region}: {description}")]
    ContractViolation {
        operation: Capability,
        region: CombinationKey,
        description: String,
    },

    /// The cluster worker pool could not be started.
    #[error("worker pool error: {0}")]
    WorkerPool(String),
}

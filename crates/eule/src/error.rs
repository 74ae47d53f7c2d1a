//! Error types for the adaptation layer and top-level operations.

use crate::registry::AdaptError;
use eule_kernel::{KernelError, SetName};

#[derive(Debug, thiserror::Error)]
pub enum EuleError {
    /// The input is not a valid mapping or list of sets.
    #[error("invalid input: {description}")]
    InputShape { description: String },

    /// A named value could not be adapted to the set-like contract.
    #[error("set {name} ({type_name}) could not be adapted: {source}")]
    Adaptation {
        name: SetName,
        type_name: String,
        #[source]
        source: AdaptError,
    },

    /// A sequence repeats elements and duplicates are denied.
    #[error("set {name} repeats {count} element(s)")]
    DuplicateElements { name: SetName, count: usize },

    #[error("unknown set name: {0}")]
    UnknownName(SetName),

    #[error("invalid configuration: {description}")]
    Config { description: String },

    #[error(transparent)]
    Kernel(#[from] KernelError),
}

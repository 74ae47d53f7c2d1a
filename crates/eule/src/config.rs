//! Partitioning options.

use crate::error::EuleError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options for validation, verification and cluster parallelism.
///
/// Loaded from TOML:
///
/// ```toml
/// warn_duplicates = true
/// deny_duplicates = false
/// verify = false
/// workers = 4
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartitionConfig {
    /// Log a warning when a sequence input repeats elements.
    pub warn_duplicates: bool,
    /// Reject sequence inputs that repeat elements.
    pub deny_duplicates: bool,
    /// Check every partition invariant after partitioning.
    pub verify: bool,
    /// Worker threads for cluster partitioning; `None` uses the global pool.
    pub workers: Option<usize>,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            warn_duplicates: true,
            deny_duplicates: false,
            verify: false,
            workers: None,
        }
    }
}

impl PartitionConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, EuleError> {
        let config: Self = toml::from_str(text).map_err(|e| EuleError::Config {
            description: e.to_string(),
        })?;
        if config.workers == Some(0) {
            return Err(EuleError::Config {
                description: "workers must be at least 1".to_string(),
            });
        }
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, EuleError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| EuleError::Config {
            description: format!("failed to read {}: {e}", path.display()),
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(PartitionConfig::from_toml_str("").unwrap(), PartitionConfig::default());
    }

    #[test]
    fn fields_override_defaults() {
        let config = PartitionConfig::from_toml_str("deny_duplicates = true\nworkers = 2\n").unwrap();
        assert!(config.deny_duplicates);
        assert!(config.warn_duplicates);
        assert_eq!(config.workers, Some(2));
    }

    #[test]
    fn unknown_fields_and_zero_workers_are_rejected() {
        assert!(PartitionConfig::from_toml_str("colour = \"red\"").is_err());
        let err = PartitionConfig::from_toml_str("workers = 0").unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = PartitionConfig::load("/nonexistent/eule.toml").unwrap_err();
        assert!(matches!(err, EuleError::Config { .. }));
    }
}

//! Input validation before adaptation.
//!
//! Checks that names are unique and looks for repeated elements in
//! sequence inputs, which the ordered adapter silently collapses.
//! Values that are already set-like are not inspected.

use crate::builtin;
use crate::config::PartitionConfig;
use crate::error::EuleError;
use crate::raw::SetsInput;
use eule_kernel::{Element, SetName};
use serde::Serialize;
use std::collections::HashSet;

/// A sequence input that repeats elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateWarning {
    pub name: SetName,
    pub type_name: String,
    /// Repeated elements, in order of their first repetition.
    pub duplicates: Vec<Element>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub sets: usize,
    pub warnings: Vec<DuplicateWarning>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

pub fn validate(input: &SetsInput) -> Result<ValidationReport, EuleError> {
    validate_with(input, &PartitionConfig::default())
}

/// Validate `input` under `config`.
///
/// Duplicate names are always an error. Repeated elements are logged when
/// `warn_duplicates` is set and rejected when `deny_duplicates` is set.
pub fn validate_with(
    input: &SetsInput,
    config: &PartitionConfig,
) -> Result<ValidationReport, EuleError> {
    let entries = input.entries();
    let mut seen = HashSet::with_capacity(entries.len());
    let mut report = ValidationReport {
        sets: entries.len(),
        warnings: Vec::new(),
    };

    for (name, raw) in &entries {
        if !seen.insert(name) {
            return Err(EuleError::InputShape {
                description: format!("duplicate set name: {name}"),
            });
        }

        let Some(entry) = builtin::lookup(raw.value_type_id()).filter(|e| e.kind.may_repeat())
        else {
            continue;
        };
        let Some(elements) = entry.elements(raw.as_any()) else {
            continue;
        };
        let duplicates = repeated(&elements);
        if duplicates.is_empty() {
            continue;
        }

        if config.deny_duplicates {
            return Err(EuleError::DuplicateElements {
                name: name.clone(),
                count: duplicates.len(),
            });
        }
        if config.warn_duplicates {
            tracing::warn!(
                set = %name,
                type_name = raw.type_name(),
                duplicates = duplicates.len(),
                "sequence repeats elements; duplicates are ignored"
            );
        }
        report.warnings.push(DuplicateWarning {
            name: name.clone(),
            type_name: raw.type_name().to_string(),
            duplicates,
        });
    }

    Ok(report)
}

fn repeated(elements: &[Element]) -> Vec<Element> {
    let mut seen = HashSet::with_capacity(elements.len());
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();
    for element in elements {
        if !seen.insert(element) && reported.insert(element) {
            duplicates.push(element.clone());
        }
    }
    duplicates
}

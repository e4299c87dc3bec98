//! Reads the reference and verb datasets from JSON files

use std::path::Path;
use serde::de::DeserializeOwned;
use serde_json::Value;
use crate::{Error, Reference, Result, Verb};

/// Default location of the reference dataset
pub const DEFAULT_REFERENCES_PATH: &str = "json/isc_references.json";

/// Default location of the verb dataset
pub const DEFAULT_VERBS_PATH: &str = "json/isc_verbs_data.json";

/// Records as read from disk, before any reference is resolved
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub references: Vec<Reference>,
    pub verbs: Vec<Verb<Value>>,
}

impl Dataset {
    /// Load both datasets, references first
    pub fn load(references_path: &Path, verbs_path: &Path) -> Result<Self> {
        let references: Vec<Reference> = read_json_array(references_path)?;
        let verbs: Vec<Verb<Value>> = read_json_array(verbs_path)?;
        tracing::debug!(
            "Loaded {} references from {} and {} verbs from {}",
            references.len(),
            references_path.display(),
            verbs.len(),
            verbs_path.display()
        );
        Ok(Self { references, verbs })
    }

    /// Total number of inflected forms across all verbs
    pub fn inflected_form_count(&self) -> usize {
        self.verbs.iter().map(|v| v.inflected_forms.len()).sum()
    }
}

/// Read a file holding a JSON array of objects
pub fn read_json_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::File {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })
}

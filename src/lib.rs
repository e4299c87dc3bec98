//! # Iskonawa - verb dictionary loader
//!
//! Loads the Iskonawa verb dictionary and the bibliography it cites into a
//! document database.
//!
//! Iskonawa provides:
//! - Typed records for references, verbs and inflected forms
//! - Reference-id resolution: external reference keys become store identifiers
//! - A `DocumentStore` seam with MongoDB and SQLite backends
//! - CRUD smoke checks against the verbs collection

pub mod record;
pub mod loader;
pub mod resolver;
pub mod writer;
pub mod ingest;
pub mod crud;
pub mod storage;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use record::{InflectedForm, Reference, ReferenceKey, Verb};
pub use loader::Dataset;
pub use resolver::ReferenceMap;
pub use ingest::{IngestStats, Ingestor};
pub use storage::{Collection, DocumentStore, SqliteStore};
#[cfg(feature = "mongo")]
pub use storage::MongoStore;
pub use config::{AppConfig, StoreConfig};

use std::path::PathBuf;

/// Result type alias for Iskonawa operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Iskonawa operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot read {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Duplicate reference key: {0}")]
    DuplicateKey(ReferenceKey),

    #[error("Reference at position {index} has no usable id (found {value})")]
    InvalidKey { index: usize, value: serde_json::Value },

    /// `key` is the raw value found; null when the field is absent
    #[error("Verb {verb:?} cites unresolvable reference {key}")]
    MissingReference { verb: String, key: serde_json::Value },

    #[error("Write to {collection} rejected: {message}")]
    StoreWrite {
        collection: Collection,
        message: String,
    },

    #[error("Missing setting {0} (set it in the environment or in .env)")]
    MissingSetting(&'static str),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Cannot encode record for {collection}: {message}")]
    Encode {
        collection: Collection,
        message: String,
    },

    #[error("{check} check failed: {message}")]
    CheckFailed {
        check: &'static str,
        message: String,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

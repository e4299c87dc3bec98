//! Storage Layer - document store backends
//!
//! Two collections live in the store:
//! - references(id, citation fields...)
//! - verbs(verb, meanings, reference, inflected_forms[...])
//!
//! The MongoDB backend is the system of record. The SQLite backend keeps the
//! same documents in a single table and serves offline runs and tests.

pub mod schema;
pub mod sqlite;
#[cfg(feature = "mongo")]
pub mod mongo;

pub use sqlite::SqliteStore;
#[cfg(feature = "mongo")]
pub use mongo::MongoStore;

use std::fmt;
use std::hash::Hash;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use crate::Result;

/// Database holding both collections
pub const DEFAULT_DATABASE: &str = "iskonawa_db";

/// The collections written by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    References,
    Verbs,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::References, Collection::Verbs];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::References => "references",
            Self::Verbs => "verbs",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A store of schemaless documents grouped in collections.
///
/// Identifiers are assigned by the store on insert. Operations are blocking;
/// one store value holds one connection for the life of the run.
pub trait DocumentStore {
    /// Identifier assigned to an inserted document
    type Id: Clone + Eq + Hash + fmt::Debug + fmt::Display + Serialize + DeserializeOwned;

    /// Insert one document and return its identifier
    fn insert_one<T: Serialize>(&self, collection: Collection, doc: &T) -> Result<Self::Id>;

    /// Insert a batch in one request. Identifiers come back in input order.
    fn insert_many<T: Serialize>(&self, collection: Collection, docs: &[T]) -> Result<Vec<Self::Id>>;

    /// Fetch a document by identifier
    fn find_one<T: DeserializeOwned>(&self, collection: Collection, id: &Self::Id) -> Result<Option<T>>;

    /// Set one top-level field on a document; returns the number of documents matched
    fn set_field(&self, collection: Collection, id: &Self::Id, field: &str, value: Value) -> Result<u64>;

    /// Delete a document by identifier; returns the number deleted
    fn delete_one(&self, collection: Collection, id: &Self::Id) -> Result<u64>;

    /// Delete every document whose top-level `field` equals `value`
    fn delete_where(&self, collection: Collection, field: &str, value: &Value) -> Result<u64>;

    /// Remove a collection and all of its documents
    fn drop_collection(&self, collection: Collection) -> Result<()>;

    /// Count documents in a collection
    fn count(&self, collection: Collection) -> Result<u64>;

    /// Names of the databases visible to this connection
    fn list_databases(&self) -> Result<Vec<String>>;
}

/// Document counts per collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    pub references: u64,
    pub verbs: u64,
}

impl StoreStats {
    pub fn collect<S: DocumentStore>(store: &S) -> Result<Self> {
        Ok(Self {
            references: store.count(Collection::References)?,
            verbs: store.count(Collection::Verbs)?,
        })
    }
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Store Statistics:")?;
        writeln!(f, "  References: {}", self.references)?;
        writeln!(f, "  Verbs: {}", self.verbs)
    }
}

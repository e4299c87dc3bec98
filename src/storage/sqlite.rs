//! SQLite storage implementation

use std::path::Path;
use rusqlite::{Connection, params, OptionalExtension};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use crate::{Result, Error};
use super::{schema, Collection, DocumentStore};

/// SQLite-backed document store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| Error::Connection(format!("{}: {}", path.display(), e)))?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::Connection(e.to_string()))?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }
}

fn encode<T: Serialize>(collection: Collection, doc: &T) -> Result<String> {
    serde_json::to_string(doc).map_err(|e| Error::Encode {
        collection,
        message: e.to_string(),
    })
}

fn write_error(collection: Collection) -> impl Fn(rusqlite::Error) -> Error {
    move |e| Error::StoreWrite {
        collection,
        message: e.to_string(),
    }
}

/// JSON path of a top-level field
fn field_path(field: &str) -> String {
    format!("$.\"{}\"", field.replace('"', "\\\""))
}

impl DocumentStore for SqliteStore {
    type Id = i64;

    fn insert_one<T: Serialize>(&self, collection: Collection, doc: &T) -> Result<i64> {
        let body = encode(collection, doc)?;
        self.conn
            .execute(
                "INSERT INTO documents (collection, body) VALUES (?1, ?2)",
                params![collection.as_str(), body],
            )
            .map_err(write_error(collection))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_many<T: Serialize>(&self, collection: Collection, docs: &[T]) -> Result<Vec<i64>> {
        let bodies = docs
            .iter()
            .map(|doc| encode(collection, doc))
            .collect::<Result<Vec<_>>>()?;

        // One transaction per batch: either every document lands or none does
        let tx = self.conn.unchecked_transaction().map_err(write_error(collection))?;
        let mut ids = Vec::with_capacity(bodies.len());
        {
            let mut stmt = tx
                .prepare("INSERT INTO documents (collection, body) VALUES (?1, ?2)")
                .map_err(write_error(collection))?;
            for body in &bodies {
                stmt.execute(params![collection.as_str(), body])
                    .map_err(write_error(collection))?;
                ids.push(tx.last_insert_rowid());
            }
        }
        tx.commit().map_err(write_error(collection))?;

        Ok(ids)
    }

    fn find_one<T: DeserializeOwned>(&self, collection: Collection, id: &i64) -> Result<Option<T>> {
        self.conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection.as_str(), id],
                |row| {
                    let body: String = row.get(0)?;
                    serde_json::from_str(&body).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    fn set_field(&self, collection: Collection, id: &i64, field: &str, value: Value) -> Result<u64> {
        let matched = self
            .conn
            .execute(
                "UPDATE documents SET body = json_set(body, ?3, json(?4)) WHERE collection = ?1 AND id = ?2",
                params![collection.as_str(), id, field_path(field), value.to_string()],
            )
            .map_err(write_error(collection))?;
        Ok(matched as u64)
    }

    fn delete_one(&self, collection: Collection, id: &i64) -> Result<u64> {
        let deleted = self
            .conn
            .execute(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection.as_str(), id],
            )
            .map_err(write_error(collection))?;
        Ok(deleted as u64)
    }

    fn delete_where(&self, collection: Collection, field: &str, value: &Value) -> Result<u64> {
        let deleted = self
            .conn
            .execute(
                "DELETE FROM documents WHERE collection = ?1 AND json_extract(body, ?2) = json_extract(?3, '$')",
                params![collection.as_str(), field_path(field), value.to_string()],
            )
            .map_err(write_error(collection))?;
        Ok(deleted as u64)
    }

    fn drop_collection(&self, collection: Collection) -> Result<()> {
        self.conn
            .execute("DELETE FROM documents WHERE collection = ?1", [collection.as_str()])
            .map_err(write_error(collection))?;
        Ok(())
    }

    fn count(&self, collection: Collection) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            [collection.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn list_databases(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM pragma_database_list ORDER BY seq")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }
}

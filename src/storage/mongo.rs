//! MongoDB storage implementation (blocking driver API)

use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use mongodb::error::ErrorKind;
use mongodb::sync::{Client, Database};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use crate::config::StoreConfig;
use crate::{Error, Result};
use super::{Collection, DocumentStore};

/// MongoDB-backed document store
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// Create a client for the configured cluster.
    ///
    /// The driver connects lazily, so a bad host or bad credentials surface
    /// as a connection error on the first operation.
    pub fn connect(config: &StoreConfig) -> Result<Self> {
        let uri = config.connection_uri()?;
        tracing::debug!("Connecting to {}", config);
        let client = Client::with_uri_str(uri.as_str()).map_err(connection_error)?;
        let db = client.database(&config.database);
        Ok(Self { client, db })
    }

    fn collection(&self, collection: Collection) -> mongodb::sync::Collection<Document> {
        self.db.collection::<Document>(collection.as_str())
    }
}

fn connection_error(e: mongodb::error::Error) -> Error {
    Error::Connection(e.to_string())
}

/// Write rejections become `StoreWrite`; anything else is treated as a connectivity failure
fn write_error(collection: Collection) -> impl Fn(mongodb::error::Error) -> Error {
    move |e| {
        if matches!(*e.kind, ErrorKind::Write(_) | ErrorKind::BulkWrite(_) | ErrorKind::InvalidArgument { .. }) {
            Error::StoreWrite {
                collection,
                message: e.to_string(),
            }
        } else {
            Error::Connection(e.to_string())
        }
    }
}

fn encode<T: Serialize>(collection: Collection, doc: &T) -> Result<Document> {
    bson::to_document(doc).map_err(|e| Error::Encode {
        collection,
        message: e.to_string(),
    })
}

fn encode_value(collection: Collection, value: &Value) -> Result<Bson> {
    bson::to_bson(value).map_err(|e| Error::Encode {
        collection,
        message: e.to_string(),
    })
}

fn object_id(collection: Collection, id: Bson) -> Result<ObjectId> {
    match id {
        Bson::ObjectId(oid) => Ok(oid),
        other => Err(Error::StoreWrite {
            collection,
            message: format!("store assigned a non-ObjectId identifier: {}", other),
        }),
    }
}

impl DocumentStore for MongoStore {
    type Id = ObjectId;

    fn insert_one<T: Serialize>(&self, collection: Collection, doc: &T) -> Result<ObjectId> {
        let document = encode(collection, doc)?;
        let result = self
            .collection(collection)
            .insert_one(document, None)
            .map_err(write_error(collection))?;
        object_id(collection, result.inserted_id)
    }

    fn insert_many<T: Serialize>(&self, collection: Collection, docs: &[T]) -> Result<Vec<ObjectId>> {
        // The server rejects an empty batch
        if docs.is_empty() {
            return Ok(Vec::new());
        }

        let documents = docs
            .iter()
            .map(|doc| encode(collection, doc))
            .collect::<Result<Vec<_>>>()?;
        let result = self
            .collection(collection)
            .insert_many(documents, None)
            .map_err(write_error(collection))?;

        let mut inserted = result.inserted_ids;
        (0..docs.len())
            .map(|index| {
                let id = inserted.remove(&index).ok_or_else(|| Error::StoreWrite {
                    collection,
                    message: format!("no identifier returned for document {}", index),
                })?;
                object_id(collection, id)
            })
            .collect()
    }

    fn find_one<T: DeserializeOwned>(&self, collection: Collection, id: &ObjectId) -> Result<Option<T>> {
        let found = self
            .collection(collection)
            .find_one(doc! { "_id": *id }, None)
            .map_err(connection_error)?;

        match found {
            Some(mut document) => {
                document.remove("_id");
                bson::from_document(document).map(Some).map_err(|e| Error::Encode {
                    collection,
                    message: e.to_string(),
                })
            }
            None => Ok(None),
        }
    }

    fn set_field(&self, collection: Collection, id: &ObjectId, field: &str, value: Value) -> Result<u64> {
        let value = encode_value(collection, &value)?;
        let mut fields = Document::new();
        fields.insert(field, value);
        let result = self
            .collection(collection)
            .update_one(doc! { "_id": *id }, doc! { "$set": fields }, None)
            .map_err(write_error(collection))?;
        Ok(result.matched_count)
    }

    fn delete_one(&self, collection: Collection, id: &ObjectId) -> Result<u64> {
        let result = self
            .collection(collection)
            .delete_one(doc! { "_id": *id }, None)
            .map_err(write_error(collection))?;
        Ok(result.deleted_count)
    }

    fn delete_where(&self, collection: Collection, field: &str, value: &Value) -> Result<u64> {
        let mut filter = Document::new();
        filter.insert(field, encode_value(collection, value)?);
        let result = self
            .collection(collection)
            .delete_many(filter, None)
            .map_err(write_error(collection))?;
        Ok(result.deleted_count)
    }

    fn drop_collection(&self, collection: Collection) -> Result<()> {
        self.collection(collection)
            .drop(None)
            .map_err(write_error(collection))
    }

    fn count(&self, collection: Collection) -> Result<u64> {
        self.collection(collection)
            .count_documents(None, None)
            .map_err(connection_error)
    }

    fn list_databases(&self) -> Result<Vec<String>> {
        self.client
            .list_database_names(None, None)
            .map_err(connection_error)
    }
}

//! Reference Resolver
//!
//! Inserts the reference dataset and maps each reference's external key to
//! the identifier the store assigned to it. The batch insert hands back the
//! identifiers in input order, so no read-back query is needed.

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use crate::storage::{Collection, DocumentStore};
use crate::{Error, Reference, ReferenceKey, Result};

/// external key → store identifier
#[derive(Debug, Clone)]
pub struct ReferenceMap<Id> {
    ids: HashMap<ReferenceKey, Id>,
}

impl<Id: Clone> ReferenceMap<Id> {
    /// Build a map from (key, id) pairs, rejecting a key seen twice
    pub fn from_pairs(pairs: impl IntoIterator<Item = (ReferenceKey, Id)>) -> Result<Self> {
        let mut ids = HashMap::new();
        for (key, id) in pairs {
            if ids.contains_key(&key) {
                return Err(Error::DuplicateKey(key));
            }
            ids.insert(key, id);
        }
        Ok(Self { ids })
    }

    pub fn get(&self, key: &ReferenceKey) -> Option<&Id> {
        self.ids.get(key)
    }

    /// Look up the raw `reference` value cited by `verb`. An absent value,
    /// null, or anything that is not a known key fails with `MissingReference`.
    pub fn resolve(&self, value: Option<Value>, verb: &str) -> Result<Id> {
        let value = value.unwrap_or(Value::Null);
        ReferenceKey::from_value(&value)
            .and_then(|key| self.ids.get(&key))
            .cloned()
            .ok_or_else(|| Error::MissingReference {
                verb: verb.to_string(),
                key: value,
            })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// External keys in input order. Fails on the first reference without a
/// usable `id` and on the first key used twice.
pub fn reference_keys(references: &[Reference]) -> Result<Vec<ReferenceKey>> {
    let mut seen = HashSet::with_capacity(references.len());
    references
        .iter()
        .enumerate()
        .map(|(index, reference)| {
            let key = reference.key().ok_or_else(|| Error::InvalidKey {
                index,
                value: reference.fields.get("id").cloned().unwrap_or(Value::Null),
            })?;
            if !seen.insert(key.clone()) {
                return Err(Error::DuplicateKey(key));
            }
            Ok(key)
        })
        .collect()
}

/// Insert `references` as new documents and map their keys to store identifiers.
///
/// Keys are checked before anything is written.
pub fn resolve_references<S: DocumentStore>(
    store: &S,
    references: &[Reference],
) -> Result<ReferenceMap<S::Id>> {
    let keys = reference_keys(references)?;

    let ids = store.insert_many(Collection::References, references)?;
    if ids.len() != references.len() {
        return Err(Error::StoreWrite {
            collection: Collection::References,
            message: format!("inserted {} of {} references", ids.len(), references.len()),
        });
    }
    tracing::debug!("Inserted {} references", ids.len());

    ReferenceMap::from_pairs(keys.into_iter().zip(ids))
}

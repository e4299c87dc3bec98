//! Ingest pipeline: load, resolve references, write verbs
//!
//! Ingestion is not idempotent on its own; both collections are truncated
//! before the new dataset is written.

use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use crate::loader::Dataset;
use crate::resolver::{reference_keys, resolve_references};
use crate::storage::{Collection, DocumentStore};
use crate::writer::write_verbs;
use crate::{Error, ReferenceKey, Result};

/// Counts of what an ingest run wrote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestStats {
    pub references: usize,
    pub verbs: usize,
    pub inflected_forms: usize,
}

impl fmt::Display for IngestStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ingest Statistics:")?;
        writeln!(f, "  References: {}", self.references)?;
        writeln!(f, "  Verbs: {}", self.verbs)?;
        writeln!(f, "  Inflected forms: {}", self.inflected_forms)
    }
}

/// Check the dataset against itself: every reference has a unique key and
/// every verb and inflected form cites one of them. Absent and null
/// references count as dangling.
pub fn validate(dataset: &Dataset) -> Result<()> {
    let keys: HashSet<ReferenceKey> = reference_keys(&dataset.references)?.into_iter().collect();
    for verb in &dataset.verbs {
        let dangling = verb.references().find(|value| {
            !value
                .and_then(ReferenceKey::from_value)
                .is_some_and(|key| keys.contains(&key))
        });
        if let Some(value) = dangling {
            return Err(Error::MissingReference {
                verb: verb.label(),
                key: value.cloned().unwrap_or(Value::Null),
            });
        }
    }
    Ok(())
}

pub struct Ingestor<'a, S> {
    store: &'a S,
    truncate: bool,
}

impl<'a, S: DocumentStore> Ingestor<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store, truncate: true }
    }

    /// Keep existing documents instead of dropping both collections first
    pub fn keep_existing(mut self) -> Self {
        self.truncate = false;
        self
    }

    /// Load both files and ingest them
    pub fn run_files(&self, references_path: &Path, verbs_path: &Path) -> Result<IngestStats> {
        let dataset = Dataset::load(references_path, verbs_path)?;
        self.run(dataset)
    }

    /// Ingest a loaded dataset.
    ///
    /// Nothing is written unless the dataset validates.
    pub fn run(&self, dataset: Dataset) -> Result<IngestStats> {
        validate(&dataset)?;

        if self.truncate {
            for collection in Collection::ALL {
                tracing::debug!("Dropping collection {}", collection);
                self.store.drop_collection(collection)?;
            }
        }

        let inflected_forms = dataset.inflected_form_count();
        let map = resolve_references(self.store, &dataset.references)?;
        tracing::info!("Resolved {} references", map.len());

        let ids = write_verbs(self.store, dataset.verbs, &map)?;
        tracing::info!("Wrote {} verbs with {} inflected forms", ids.len(), inflected_forms);

        Ok(IngestStats {
            references: map.len(),
            verbs: ids.len(),
            inflected_forms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{SqliteStore, StoreStats};
    use crate::{Reference, Verb};
    use serde_json::json;

    fn sample_references() -> Vec<Reference> {
        serde_json::from_value(json!([
            {"id": "ZAR2018", "author": "Zariquiey", "year": 2018},
            {"id": "VAL2020", "author": "Valenzuela", "year": 2020}
        ]))
        .unwrap()
    }

    fn sample_dataset() -> Dataset {
        let verbs: Vec<Verb<Value>> = serde_json::from_value(json!([
            {
                "verb": "pi",
                "spanish_meaning": "comer",
                "english_meaning": "eat",
                "reference": "ZAR2018",
                "inflected_forms": [
                    {"index": "1", "iskonawa_sentence": "e-a pi-a", "POS": "VERB", "verb_features": ["PERF"], "reference": "ZAR2018"},
                    {"index": "2", "iskonawa_sentence": "e-a pi-ai", "POS": "VERB", "verb_features": ["PROG"], "reference": "VAL2020"},
                    {"index": "3", "iskonawa_sentence": "pi-ti", "POS": "NOUN", "verb_features": [], "reference": "ZAR2018"}
                ]
            },
            {
                "verb": "ka",
                "spanish_meaning": "ir",
                "english_meaning": "go",
                "reference": "VAL2020",
                "inflected_forms": []
            }
        ]))
        .unwrap();
        Dataset { references: sample_references(), verbs }
    }

    fn assert_store_empty(store: &SqliteStore) {
        assert_eq!(store.count(Collection::Verbs).unwrap(), 0);
        assert_eq!(store.count(Collection::References).unwrap(), 0);
    }

    #[test]
    fn test_ingest_resolves_every_reference() {
        let store = SqliteStore::open_in_memory().unwrap();
        let stats = Ingestor::new(&store).run(sample_dataset()).unwrap();
        assert_eq!(
            stats,
            IngestStats { references: 2, verbs: 2, inflected_forms: 3 }
        );

        // Row ids are assigned in insert order: references first, then verbs
        let zar: Reference = store.find_one(Collection::References, &1).unwrap().unwrap();
        let val: Reference = store.find_one(Collection::References, &2).unwrap().unwrap();
        assert_eq!(zar.key(), Some(ReferenceKey::from("ZAR2018")));
        assert_eq!(val.key(), Some(ReferenceKey::from("VAL2020")));

        let pi: Verb<i64> = store.find_one(Collection::Verbs, &3).unwrap().unwrap();
        assert_eq!(pi.headword(), Some("pi"));
        assert_eq!(pi.reference, Some(1));
        let refs: Vec<_> = pi.inflected_forms.iter().map(|f| f.reference).collect();
        assert_eq!(refs, vec![Some(1), Some(2), Some(1)]);
        let sentences: Vec<_> = pi
            .inflected_forms
            .iter()
            .map(|f| f.field("iskonawa_sentence").and_then(Value::as_str).unwrap())
            .collect();
        assert_eq!(sentences, vec!["e-a pi-a", "e-a pi-ai", "pi-ti"]);

        let ka: Verb<i64> = store.find_one(Collection::Verbs, &4).unwrap().unwrap();
        assert_eq!(ka.reference, Some(2));
        assert!(ka.inflected_forms.is_empty());
    }

    #[test]
    fn test_duplicate_key_stops_before_any_write() {
        let store = SqliteStore::open_in_memory().unwrap();
        Ingestor::new(&store).run(sample_dataset()).unwrap();

        let mut dataset = sample_dataset();
        dataset.references.push(Reference::new("VAL2020"));
        let err = Ingestor::new(&store).run(dataset).unwrap_err();
        assert!(matches!(err, Error::DuplicateKey(_)));

        // The previous load is still in place
        let stats = StoreStats::collect(&store).unwrap();
        assert_eq!(stats, StoreStats { references: 2, verbs: 2 });
    }

    #[test]
    fn test_missing_reference_inserts_zero_verbs() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut dataset = sample_dataset();
        dataset.verbs[0].inflected_forms[2].reference = Some(json!("UNKNOWN"));

        let err = Ingestor::new(&store).run(dataset).unwrap_err();
        match err {
            Error::MissingReference { verb, key } => {
                assert_eq!(verb, "pi");
                assert_eq!(key, json!("UNKNOWN"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_store_empty(&store);
    }

    #[test]
    fn test_null_reference_inserts_zero_verbs() {
        let store = SqliteStore::open_in_memory().unwrap();
        let dataset = Dataset {
            references: vec![Reference::new("A")],
            verbs: serde_json::from_value(json!([{
                "verb": "pi",
                "reference": null,
                "spanish_meaning": null,
                "inflected_forms": [{"index": 1, "reference": null}, {"index": 2}]
            }]))
            .unwrap(),
        };

        let err = Ingestor::new(&store).run(dataset).unwrap_err();
        match err {
            Error::MissingReference { verb, key } => {
                assert_eq!(verb, "pi");
                assert_eq!(key, Value::Null);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_store_empty(&store);
    }

    #[test]
    fn test_absent_reference_inserts_zero_verbs() {
        let store = SqliteStore::open_in_memory().unwrap();

        // Verb-level reference absent
        let mut dataset = sample_dataset();
        dataset.verbs[1].reference = None;
        let err = Ingestor::new(&store).run(dataset).unwrap_err();
        assert!(matches!(err, Error::MissingReference { ref verb, .. } if verb == "ka"));
        assert_store_empty(&store);

        // Form-level reference absent
        let mut dataset = sample_dataset();
        dataset.verbs[0].inflected_forms[1].reference = None;
        let err = Ingestor::new(&store).run(dataset).unwrap_err();
        assert!(matches!(err, Error::MissingReference { ref verb, .. } if verb == "pi"));
        assert_store_empty(&store);
    }

    #[test]
    fn test_untyped_fields_are_stored_verbatim() {
        let store = SqliteStore::open_in_memory().unwrap();
        let verb = json!({
            "spanish_meaning": 5,
            "english_meaning": null,
            "reference": 1.0,
            "inflected_forms": [{"POS": 3, "verb_features": "PERF", "reference": 1}]
        });
        let dataset = Dataset {
            references: serde_json::from_value(json!([{"id": 1, "title": null}])).unwrap(),
            verbs: serde_json::from_value(json!([verb])).unwrap(),
        };

        Ingestor::new(&store).run(dataset).unwrap();

        let reference: Value = store.find_one(Collection::References, &1).unwrap().unwrap();
        assert_eq!(reference, json!({"id": 1, "title": null}));
        let stored: Value = store.find_one(Collection::Verbs, &2).unwrap().unwrap();
        assert_eq!(
            stored,
            json!({
                "spanish_meaning": 5,
                "english_meaning": null,
                "reference": 1,
                "inflected_forms": [{"POS": 3, "verb_features": "PERF", "reference": 1}]
            })
        );
    }

    #[test]
    fn test_reference_without_id_stops_before_any_write() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut dataset = sample_dataset();
        dataset.references.push(Reference { fields: serde_json::Map::new() });

        let err = Ingestor::new(&store).run(dataset).unwrap_err();
        assert!(matches!(err, Error::InvalidKey { index: 2, .. }));
        assert_store_empty(&store);
    }

    #[test]
    fn test_rerun_after_truncate_gives_same_counts() {
        let store = SqliteStore::open_in_memory().unwrap();

        let first = Ingestor::new(&store).run(sample_dataset()).unwrap();
        let after_first = StoreStats::collect(&store).unwrap();
        let second = Ingestor::new(&store).run(sample_dataset()).unwrap();
        let after_second = StoreStats::collect(&store).unwrap();

        assert_eq!(first, second);
        assert_eq!(after_first, after_second);
        assert_eq!(after_second, StoreStats { references: 2, verbs: 2 });
    }

    #[test]
    fn test_keep_existing_appends() {
        let store = SqliteStore::open_in_memory().unwrap();
        Ingestor::new(&store).run(sample_dataset()).unwrap();
        Ingestor::new(&store).keep_existing().run(sample_dataset()).unwrap();

        let stats = StoreStats::collect(&store).unwrap();
        assert_eq!(stats, StoreStats { references: 4, verbs: 4 });
    }

    #[test]
    fn test_run_files() {
        let dir = tempfile::tempdir().unwrap();
        let refs_path = dir.path().join("isc_references.json");
        let verbs_path = dir.path().join("isc_verbs_data.json");
        let dataset = sample_dataset();
        std::fs::write(&refs_path, serde_json::to_string(&dataset.references).unwrap()).unwrap();
        std::fs::write(&verbs_path, serde_json::to_string(&dataset.verbs).unwrap()).unwrap();

        let store = SqliteStore::open_in_memory().unwrap();
        let stats = Ingestor::new(&store).run_files(&refs_path, &verbs_path).unwrap();
        assert_eq!(stats.verbs, 2);
        assert_eq!(stats.inflected_forms, 3);
    }

    #[test]
    fn test_validate_accepts_numeric_keys() {
        let dataset = Dataset {
            references: vec![Reference::new(1_i64)],
            verbs: serde_json::from_value(json!([
                {"verb": "pi", "reference": 1, "inflected_forms": [{"reference": 1.0}]}
            ]))
            .unwrap(),
        };
        assert!(validate(&dataset).is_ok());
    }
}

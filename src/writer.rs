//! Verb Writer
//!
//! Rewrites every `reference` on verbs and inflected forms to a store
//! identifier, then inserts the verbs in one batch. The rewrite is total:
//! an unknown, null or absent reference aborts before anything is written.

use serde_json::Value;
use crate::resolver::ReferenceMap;
use crate::storage::{Collection, DocumentStore};
use crate::{Result, Verb};

/// Replace every reference value with its store identifier
pub fn rewrite_references<Id: Clone>(
    verbs: Vec<Verb<Value>>,
    map: &ReferenceMap<Id>,
) -> Result<Vec<Verb<Id>>> {
    verbs
        .into_iter()
        .map(|verb| {
            let label = verb.label();
            verb.try_map_references(|value| map.resolve(value, &label))
        })
        .collect()
}

/// Rewrite `verbs` against `map` and insert them; returns the assigned identifiers
pub fn write_verbs<S: DocumentStore>(
    store: &S,
    verbs: Vec<Verb<Value>>,
    map: &ReferenceMap<S::Id>,
) -> Result<Vec<S::Id>> {
    let resolved = rewrite_references(verbs, map)?;
    let ids = store.insert_many(Collection::Verbs, &resolved)?;
    tracing::debug!("Inserted {} verbs", ids.len());
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStore;
    use crate::{Error, ReferenceKey};
    use serde_json::json;

    fn sample_verbs() -> Vec<Verb<Value>> {
        serde_json::from_value(json!([
            {"verb": "pi", "reference": "A", "spanish_meaning": null, "inflected_forms": [
                {"index": 1, "reference": "A", "POS": 3},
                {"index": 2, "reference": 5},
                {"index": 3, "reference": 5.0}
            ]},
            {"verb": "ka", "reference": 5, "inflected_forms": [{"index": 1, "reference": 5}]}
        ]))
        .unwrap()
    }

    fn sample_map() -> ReferenceMap<i64> {
        ReferenceMap::from_pairs([
            (ReferenceKey::from("A"), 100),
            (ReferenceKey::from(5_i64), 200),
            (ReferenceKey::from("unused"), 300),
        ])
        .unwrap()
    }

    fn expect_missing(verbs: Vec<Verb<Value>>, verb_name: &str, key: Value) {
        match rewrite_references(verbs, &sample_map()).unwrap_err() {
            Error::MissingReference { verb, key: found } => {
                assert_eq!(verb, verb_name);
                assert_eq!(found, key);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rewrite_is_exact_and_total() {
        let resolved = rewrite_references(sample_verbs(), &sample_map()).unwrap();

        assert_eq!(resolved[0].reference, Some(100));
        let forms: Vec<_> = resolved[0].inflected_forms.iter().map(|f| f.reference).collect();
        assert_eq!(forms, vec![Some(100), Some(200), Some(200)]);
        assert_eq!(resolved[1].reference, Some(200));
        assert_eq!(resolved[1].inflected_forms[0].reference, Some(200));
    }

    #[test]
    fn test_rewrite_keeps_other_fields_verbatim() {
        let resolved = rewrite_references(sample_verbs(), &sample_map()).unwrap();
        let json = serde_json::to_value(&resolved[0]).unwrap();
        assert_eq!(
            json,
            json!({"verb": "pi", "reference": 100, "spanish_meaning": null, "inflected_forms": [
                {"index": 1, "reference": 100, "POS": 3},
                {"index": 2, "reference": 200},
                {"index": 3, "reference": 200}
            ]})
        );
    }

    #[test]
    fn test_unknown_key_names_the_verb() {
        let mut verbs = sample_verbs();
        verbs[1].inflected_forms[0].reference = Some(json!("B"));
        expect_missing(verbs, "ka", json!("B"));
    }

    #[test]
    fn test_absent_reference_is_missing() {
        let mut verbs = sample_verbs();
        verbs[0].inflected_forms[1].reference = None;
        expect_missing(verbs, "pi", Value::Null);

        let mut verbs = sample_verbs();
        verbs[1].reference = None;
        expect_missing(verbs, "ka", Value::Null);
    }

    #[test]
    fn test_null_reference_is_missing() {
        let verbs: Vec<Verb<Value>> = serde_json::from_value(json!([
            {"verb": "pi", "reference": "A", "inflected_forms": [{"index": 1, "reference": null}]}
        ]))
        .unwrap();
        expect_missing(verbs, "pi", Value::Null);
    }

    #[test]
    fn test_non_key_reference_is_missing() {
        let mut verbs = sample_verbs();
        verbs[0].reference = Some(json!({"id": "A"}));
        expect_missing(verbs, "pi", json!({"id": "A"}));
    }

    #[test]
    fn test_write_verbs_inserts_nothing_on_unknown_key() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut verbs = sample_verbs();
        verbs[1].reference = Some(json!(6));

        assert!(write_verbs(&store, verbs, &sample_map()).is_err());
        assert_eq!(store.count(Collection::Verbs).unwrap(), 0);
    }

    #[test]
    fn test_write_verbs_preserves_form_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        let ids = write_verbs(&store, sample_verbs(), &sample_map()).unwrap();
        assert_eq!(ids.len(), 2);

        let stored: Verb<i64> = store.find_one(Collection::Verbs, &ids[0]).unwrap().unwrap();
        let indexes: Vec<_> = stored
            .inflected_forms
            .iter()
            .map(|f| f.field("index").cloned().unwrap())
            .collect();
        assert_eq!(indexes, vec![json!(1), json!(2), json!(3)]);
        assert_eq!(stored.field("spanish_meaning"), Some(&Value::Null));
    }
}

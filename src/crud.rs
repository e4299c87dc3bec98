//! CRUD smoke checks against the verbs collection
//!
//! Each check inserts its own disposable `test_verb` record. [`teardown`]
//! removes every `test_verb` record whichever check left it behind.

use serde_json::{json, Map, Value};
use crate::storage::{Collection, DocumentStore};
use crate::{Error, InflectedForm, Result, Verb};

/// Headword of the disposable record
pub const TEST_VERB: &str = "test_verb";

const UPDATED_SPANISH_MEANING: &str = "prueba_modificada";

/// The disposable verb every check starts from
pub fn sample_verb() -> Verb<Value> {
    let mut form = Map::new();
    form.insert("index".to_string(), json!("1"));
    form.insert("key".to_string(), json!("T1"));
    form.insert("spanish_verbs".to_string(), json!(["comer"]));
    form.insert("verb_abbreviations".to_string(), json!("comer-PERF"));
    form.insert("iskonawa_sentence".to_string(), json!("test sentence"));
    form.insert("iskonawa_verb_segmented".to_string(), json!("test-segmented"));
    form.insert("suffix_sentence".to_string(), json!("test-suffix"));
    form.insert("annotated_sentence".to_string(), json!("test-annotated"));
    form.insert("spanish_sentence".to_string(), json!("frase de prueba"));
    form.insert("iskonawa_verb".to_string(), json!("test"));
    form.insert("dict_verb".to_string(), json!(TEST_VERB));
    form.insert("POS".to_string(), json!("NOUN"));
    form.insert("verb_features".to_string(), json!(["PERF"]));

    let mut fields = Map::new();
    fields.insert("verb".to_string(), json!(TEST_VERB));
    fields.insert("spanish_meaning".to_string(), json!("prueba"));
    fields.insert("english_meaning".to_string(), json!("test"));

    Verb {
        reference: None,
        inflected_forms: vec![InflectedForm {
            reference: Some(json!("test-reference")),
            fields: form,
        }],
        fields,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrudCheck {
    Insert,
    Read,
    Update,
    Delete,
}

impl CrudCheck {
    pub const ALL: [CrudCheck; 4] = [Self::Insert, Self::Read, Self::Update, Self::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Run the check. Assertion failures come back as `Error::CheckFailed`.
    pub fn run<S: DocumentStore>(self, store: &S) -> Result<()> {
        let sample = sample_verb();
        let id = store.insert_one(Collection::Verbs, &sample)?;

        match self {
            Self::Insert => {
                let stored = self.fetch(store, &id)?;
                self.ensure_field(&stored, "verb", TEST_VERB)
            }
            Self::Read => {
                let stored = self.fetch(store, &id)?;
                self.ensure_field(&stored, "verb", TEST_VERB)?;
                self.ensure_field(&stored, "spanish_meaning", "prueba")?;
                self.ensure_field(&stored, "english_meaning", "test")?;
                self.ensure(stored == sample, "stored record differs from the inserted one")
            }
            Self::Update => {
                let before = self.fetch(store, &id)?;
                let matched = store.set_field(
                    Collection::Verbs,
                    &id,
                    "spanish_meaning",
                    json!(UPDATED_SPANISH_MEANING),
                )?;
                self.ensure(matched == 1, &format!("update matched {} records", matched))?;

                let mut after = self.fetch(store, &id)?;
                self.ensure_field(&after, "spanish_meaning", UPDATED_SPANISH_MEANING)?;
                if let Some(original) = before.field("spanish_meaning") {
                    after.fields.insert("spanish_meaning".to_string(), original.clone());
                }
                self.ensure(after == before, "update changed more than spanish_meaning")
            }
            Self::Delete => {
                let deleted = store.delete_one(Collection::Verbs, &id)?;
                self.ensure(deleted == 1, &format!("delete removed {} records", deleted))?;
                let gone = store.find_one::<Value>(Collection::Verbs, &id)?;
                self.ensure(gone.is_none(), "record still readable after delete")?;
                let again = store.delete_one(Collection::Verbs, &id)?;
                self.ensure(again == 0, &format!("second delete removed {} records", again))
            }
        }
    }

    fn fetch<S: DocumentStore>(self, store: &S, id: &S::Id) -> Result<Verb<Value>> {
        store
            .find_one(Collection::Verbs, id)?
            .ok_or_else(|| self.failure(format!("record {} not found", id)))
    }

    fn ensure(self, condition: bool, message: &str) -> Result<()> {
        if condition {
            Ok(())
        } else {
            Err(self.failure(message.to_string()))
        }
    }

    fn ensure_field(self, verb: &Verb<Value>, field: &str, expected: &str) -> Result<()> {
        let actual = verb.field(field).cloned().unwrap_or(Value::Null);
        self.ensure(
            actual == expected,
            &format!("{} is {}, expected {:?}", field, actual, expected),
        )
    }

    fn failure(self, message: String) -> Error {
        Error::CheckFailed {
            check: self.as_str(),
            message,
        }
    }
}

/// Remove every disposable record; returns how many were removed
pub fn teardown<S: DocumentStore>(store: &S) -> Result<u64> {
    store.delete_where(Collection::Verbs, "verb", &json!(TEST_VERB))
}

/// Run every check in order, then tear down. Store errors abort the run;
/// check failures are collected.
pub fn run_all<S: DocumentStore>(store: &S) -> Result<Vec<(CrudCheck, Result<()>)>> {
    let mut outcomes = Vec::with_capacity(CrudCheck::ALL.len());
    for check in CrudCheck::ALL {
        match check.run(store) {
            Err(e @ Error::CheckFailed { .. }) => outcomes.push((check, Err(e))),
            Err(e) => {
                teardown(store)?;
                return Err(e);
            }
            Ok(()) => outcomes.push((check, Ok(()))),
        }
    }
    let removed = teardown(store)?;
    tracing::debug!("Removed {} disposable records", removed);
    Ok(outcomes)
}

//! Dictionary records: references, verbs and their inflected forms
//!
//! Only the `reference` and `inflected_forms` fields are interpreted; every
//! other field is carried through to the store as-is, explicit nulls included.
//! Verbs and inflected forms are generic over the type held in `reference`:
//! records loaded from disk carry the raw JSON value, records written to the
//! verbs collection carry the store identifier of the reference they cite.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

/// Largest integer an f64 represents exactly
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// Author-assigned key of a reference, only meaningful during ingestion.
///
/// Numbers compare by value: `1` and `1.0` are the same key, `1.5` is a key
/// of its own. A number never equals a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReferenceKey {
    Number(Number),
    Text(String),
}

impl ReferenceKey {
    /// Key held by a JSON value; `None` for null, booleans, arrays and objects
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Number(n) => Some(Self::Number(canonical_number(n))),
            _ => None,
        }
    }
}

fn canonical_number(n: &Number) -> Number {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < MAX_EXACT_FLOAT => {
            Number::from(f as i64)
        }
        _ => n.clone(),
    }
}

impl fmt::Display for ReferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<&str> for ReferenceKey {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i64> for ReferenceKey {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<ReferenceKey> for Value {
    fn from(key: ReferenceKey) -> Self {
        match key {
            ReferenceKey::Number(n) => Value::Number(n),
            ReferenceKey::Text(s) => Value::String(s),
        }
    }
}

/// A bibliographic citation, stored exactly as read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reference {
    pub fields: Map<String, Value>,
}

impl Reference {
    pub fn new(id: impl Into<ReferenceKey>) -> Self {
        let mut fields = Map::new();
        fields.insert("id".to_string(), Value::from(id.into()));
        Self { fields }
    }

    /// Builder: set a citation field
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// The external key, if `id` holds a string or a number
    pub fn key(&self) -> Option<ReferenceKey> {
        self.fields.get("id").and_then(ReferenceKey::from_value)
    }
}

/// One annotated occurrence of a verb in the corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InflectedForm<R> {
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub reference: Option<R>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl<R> InflectedForm<R> {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// A dictionary entry with its corpus occurrences, in corpus order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verb<R> {
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub reference: Option<R>,
    #[serde(default = "Vec::new")]
    pub inflected_forms: Vec<InflectedForm<R>>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl<R> Verb<R> {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The headword, if `verb` holds a string
    pub fn headword(&self) -> Option<&str> {
        self.field("verb").and_then(Value::as_str)
    }

    /// Name used in error messages
    pub fn label(&self) -> String {
        match self.field("verb") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "(no headword)".to_string(),
        }
    }

    /// Every reference slot, verb first then forms in order. An absent or
    /// null reference shows up as `None`.
    pub fn references(&self) -> impl Iterator<Item = Option<&R>> {
        std::iter::once(self.reference.as_ref())
            .chain(self.inflected_forms.iter().map(|f| f.reference.as_ref()))
    }

    /// Replace every reference slot, stopping at the first failure. `f` sees
    /// absent references as `None` and must produce a value for each slot.
    pub fn try_map_references<T, E>(
        self,
        mut f: impl FnMut(Option<R>) -> Result<T, E>,
    ) -> Result<Verb<T>, E> {
        let reference = Some(f(self.reference)?);
        let inflected_forms = self
            .inflected_forms
            .into_iter()
            .map(|form| {
                Ok(InflectedForm {
                    reference: Some(f(form.reference)?),
                    fields: form.fields,
                })
            })
            .collect::<Result<Vec<_>, E>>()?;

        Ok(Verb {
            reference,
            inflected_forms,
            fields: self.fields,
        })
    }
}

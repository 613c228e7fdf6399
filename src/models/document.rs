use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::{Error, FieldValue, Record, Result};

/// Id of a [`Document`]: a JSON integer or string.
///
/// Integers order before strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentId {
    Int(i64),
    Text(String),
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentId::Int(n) => write!(f, "{}", n),
            DocumentId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl FromStr for DocumentId {
    type Err = std::convert::Infallible;

    /// Anything that parses as an integer is an integer id.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.parse::<i64>() {
            Ok(n) => DocumentId::Int(n),
            Err(_) => DocumentId::Text(s.to_string()),
        })
    }
}

impl From<i64> for DocumentId {
    fn from(n: i64) -> Self {
        DocumentId::Int(n)
    }
}

impl From<i32> for DocumentId {
    fn from(n: i32) -> Self {
        DocumentId::Int(i64::from(n))
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        DocumentId::Text(s.to_string())
    }
}

/// A schemaless record: a flat JSON object with an `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<DocumentId>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Parses a JSON object. It must carry an integer or string `id`.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Shallow merge patch: each key replaces the field, `null` deletes it.
    ///
    /// A patched `id` must still be an integer or string. On error the
    /// document is left unchanged.
    pub fn merge(&mut self, patch: &Map<String, Value>) -> Result<()> {
        let id = patch
            .get("id")
            .map(|value| {
                serde_json::from_value::<DocumentId>(value.clone())
                    .map_err(|_| Error::Invalid(format!("invalid id in patch: {}", value)))
            })
            .transpose()?;
        if let Some(id) = id {
            self.id = id;
        }
        for (key, value) in patch.iter().filter(|(key, _)| key.as_str() != "id") {
            if value.is_null() {
                self.fields.remove(key);
            } else {
                self.fields.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }
}

impl Record for Document {
    type Id = DocumentId;

    fn id(&self) -> &DocumentId {
        &self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        if name == "id" {
            return Some(match &self.id {
                DocumentId::Int(n) => FieldValue::Number(*n as f64),
                DocumentId::Text(s) => FieldValue::Text(Cow::Borrowed(s)),
            });
        }
        match self.fields.get(name)? {
            Value::String(s) => Some(FieldValue::Text(Cow::Borrowed(s))),
            Value::Number(n) => n.as_f64().map(FieldValue::Number),
            Value::Bool(b) => Some(FieldValue::Bool(*b)),
            _ => None,
        }
    }
}

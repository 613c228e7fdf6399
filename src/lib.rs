//! Collection Store keeps an ordered, id-unique list of records and derives
//! filtered, sorted and paginated views over it.
//!
//! Every mutation writes the whole list back to a durable key-value slot as a
//! JSON array, so a fresh store opened on the same slot sees the same records
//! in the same order.
//!
//! ## Core Components
//! - [`engine`]: The store itself, its view machinery and the storage backends.
//! - [`models`]: Ready-made record types (generic documents, tasks, products, cart lines).

pub mod engine;
pub mod models;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use thiserror::Error;

/// Errors returned by the Collection Store.
#[derive(Error, Debug)]
pub enum Error {
    /// A record with this id is already in the collection.
    #[error("duplicate id: {0}")]
    DuplicateId(String),
    /// No record with this id is in the collection.
    #[error("record not found: {0}")]
    NotFound(String),
    /// A filter value could not be parsed.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    /// A record or patch supplied by the caller is malformed.
    #[error("invalid input: {0}")]
    Invalid(String),
    /// A slot key contains characters the backend cannot store.
    #[error("invalid slot key: {0}")]
    InvalidKey(String),
    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
    /// An I/O error occurred while reading or writing a slot.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Error during JSON serialization or deserialization.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Returns true for failures of the durable slot rather than of the caller's request.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::Serialization(_) | Error::InvalidKey(_) | Error::Internal(_)
        )
    }
}

/// A specialized Result type for Collection Store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A borrowed view of one named field of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Text(Cow<'a, str>),
    Number(f64),
    Bool(bool),
}

impl<'a> FieldValue<'a> {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl<'a> From<&'a str> for FieldValue<'a> {
    fn from(s: &'a str) -> Self {
        FieldValue::Text(Cow::Borrowed(s))
    }
}

impl From<f64> for FieldValue<'_> {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<bool> for FieldValue<'_> {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

/// An item tracked by a [`engine::CollectionStore`].
///
/// Records are serialized as flat JSON objects. The store only looks inside a
/// record through [`Record::id`] and [`Record::field`], so filters and sort
/// keys refer to fields by name.
pub trait Record: Clone + Serialize + DeserializeOwned {
    /// The unique identifier type. `Ord` gives the "newest first" ordering.
    type Id: Clone + Eq + Hash + Ord + Debug + Display;

    /// Returns the record's id.
    fn id(&self) -> &Self::Id;

    /// Returns the value of a named field, or `None` if the record has no such field.
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;
}

/// Reads serialized payloads out of durable slots.
pub trait SlotReader: Send + Sync {
    /// Returns the payload stored under `key`, or `None` if the slot has never been written.
    fn read(&self, key: &str) -> Result<Option<String>>;
}

/// Writes and deletes durable slots.
pub trait SlotWriter: Send + Sync {
    /// Replaces the payload stored under `key`.
    fn write(&self, key: &str, payload: &str) -> Result<()>;
    /// Deletes the slot. Deleting a missing slot is not an error.
    fn delete(&self, key: &str) -> Result<()>;
}

/// Allows discovering which slots exist.
pub trait SlotEnumeration: Send + Sync {
    /// Lists all slot keys, sorted.
    fn keys(&self) -> Result<Vec<String>>;
}

/// The persistence interface a store depends on.
///
/// It combines all slot traits so a backend can be swapped for an in-memory fake.
pub trait DurableStorage: SlotReader + SlotWriter + SlotEnumeration {}

impl<S: SlotReader + SlotWriter + SlotEnumeration> DurableStorage for S {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(Error::DuplicateId("7".into()).to_string(), "duplicate id: 7");
        assert_eq!(Error::NotFound("abc".into()).to_string(), "record not found: abc");
    }

    #[test]
    fn test_storage_classification() {
        assert!(!Error::DuplicateId("1".into()).is_storage());
        assert!(!Error::NotFound("1".into()).is_storage());
        assert!(!Error::Invalid("empty text".into()).is_storage());
        assert!(Error::Io(std::io::Error::other("disk full")).is_storage());
        let bad = serde_json::from_str::<Vec<u8>>("not json").unwrap_err();
        assert!(Error::from(bad).is_storage());
    }

    #[test]
    fn test_field_value_accessors() {
        let text = FieldValue::from("hello");
        assert_eq!(text.as_text(), Some("hello"));
        assert_eq!(text.as_number(), None);
        assert_eq!(FieldValue::from(2.5).as_number(), Some(2.5));
        assert_eq!(FieldValue::from(true).as_bool(), Some(true));
    }
}

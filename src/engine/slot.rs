use std::sync::Arc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use crate::{DurableStorage, Result, SlotReader, SlotWriter};

/// One durable key bound to a storage backend.
///
/// A slot holds a JSON array of records. It is the only persistence
/// capability a [`CollectionStore`](crate::engine::CollectionStore) is given.
#[derive(Clone)]
pub struct Slot {
    key: String,
    storage: Arc<dyn DurableStorage>,
}

impl Slot {
    pub fn new(storage: Arc<dyn DurableStorage>, key: &str) -> Self {
        Self {
            key: key.to_string(),
            storage,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Reads and decodes the slot. `Ok(None)` means the slot has never been written.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<Vec<T>>> {
        match self.storage.read(&self.key)? {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    /// Serializes the full record list and replaces the slot's payload.
    pub fn save<T: Serialize>(&self, records: &[T]) -> Result<()> {
        let payload = serde_json::to_string_pretty(records)?;
        self.storage.write(&self.key, &payload)
    }

    pub fn clear(&self) -> Result<()> {
        self.storage.delete(&self.key)
    }
}

impl std::fmt::Debug for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slot").field("key", &self.key).finish_non_exhaustive()
    }
}

use std::collections::HashMap;
use std::sync::RwLock;
use crate::{Result, Error, SlotReader, SlotWriter, SlotEnumeration};

/// In-process storage. Nothing survives the process; used by tests and by
/// the CLI when `COLLECTION_STORAGE=memory`.
#[derive(Default)]
pub struct MemoryStorage {
    data: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates storage pre-populated with raw payloads.
    pub fn with_slots<I, K, V>(slots: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let data = slots.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self { data: RwLock::new(data) }
    }
}

fn poisoned<T>(_: T) -> Error {
    Error::Internal("memory storage lock poisoned".to_string())
}

impl SlotReader for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let data = self.data.read().map_err(poisoned)?;
        Ok(data.get(key).cloned())
    }
}

impl SlotWriter for MemoryStorage {
    fn write(&self, key: &str, payload: &str) -> Result<()> {
        let mut data = self.data.write().map_err(poisoned)?;
        data.insert(key.to_string(), payload.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut data = self.data.write().map_err(poisoned)?;
        data.remove(key);
        Ok(())
    }
}

impl SlotEnumeration for MemoryStorage {
    fn keys(&self) -> Result<Vec<String>> {
        let data = self.data.read().map_err(poisoned)?;
        let mut keys: Vec<String> = data.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_read_write_delete() {
        let storage = MemoryStorage::new();
        assert!(storage.read("tasks").unwrap().is_none());

        storage.write("tasks", "[]").unwrap();
        assert_eq!(storage.read("tasks").unwrap().as_deref(), Some("[]"));

        storage.delete("tasks").unwrap();
        assert!(storage.read("tasks").unwrap().is_none());
    }

    #[test]
    fn test_with_slots_and_keys() {
        let storage = MemoryStorage::with_slots([("cart", "[]"), ("a", "[]")]);
        assert_eq!(storage.keys().unwrap(), vec!["a", "cart"]);
    }
}

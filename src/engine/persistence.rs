use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use crate::{Result, Error, SlotReader, SlotWriter, SlotEnumeration};
use log::{debug, warn};

/// File-backed durable storage.
///
/// Each slot is stored in its own `<key>.json` file inside `data_dir`.
/// Writes use an atomic "write-then-rename" strategy so a crash mid-write
/// leaves the previous payload in place.
pub struct FileStorage {
    data_dir: PathBuf,
}

impl FileStorage {
    /// Initializes a new `FileStorage` in the specified directory.
    ///
    /// If the directory does not exist, it will be created.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(Self { data_dir: dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.data_dir.join(format!("{}.json", key)))
    }
}

/// Slot keys become file names, so only `[A-Za-z0-9_-]` is accepted.
pub fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidKey(key.to_string()))
    }
}

impl SlotReader for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl SlotWriter for FileStorage {
    fn write(&self, key: &str, payload: &str) -> Result<()> {
        let file_path = self.slot_path(key)?;
        let temp_path = file_path.with_extension("json.tmp");

        fs::write(&temp_path, payload)?;
        fs::rename(&temp_path, &file_path)?;

        debug!("Wrote slot {} ({} bytes)", key, payload.len());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.slot_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl SlotEnumeration for FileStorage {
    /// Scans `data_dir` for `.json` files. Leftover `.json.tmp` files are ignored.
    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();

        if !self.data_dir.exists() {
            return Ok(keys);
        }

        for entry in fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            let path = entry.path();

            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                match path.file_stem().and_then(|s| s.to_str()) {
                    Some(stem) if validate_key(stem).is_ok() => keys.push(stem.to_string()),
                    _ => warn!("Skipping unexpected file in data dir: {:?}", path),
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_and_read() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();

        storage.write("tasks", r#"[{"id":"1"}]"#).unwrap();
        assert_eq!(storage.read("tasks").unwrap().as_deref(), Some(r#"[{"id":"1"}]"#));
    }

    #[test]
    fn test_missing_slot_reads_none() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        assert!(storage.read("cart").unwrap().is_none());
    }

    #[test]
    fn test_atomic_rename() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();

        storage.write("cart", "[]").unwrap();

        assert!(dir.path().join("cart.json").exists());
        assert!(!dir.path().join("cart.json.tmp").exists());
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let storage = FileStorage::new(&nested).unwrap();
        storage.write("k", "[]").unwrap();
        assert!(nested.join("k.json").exists());
    }

    #[test]
    fn test_delete_and_keys() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();

        storage.write("tasks", "[]").unwrap();
        storage.write("cart", "[]").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join("cart.json.tmp"), "ignored").unwrap();

        assert_eq!(storage.keys().unwrap(), vec!["cart", "tasks"]);

        storage.delete("cart").unwrap();
        storage.delete("cart").unwrap();
        assert_eq!(storage.keys().unwrap(), vec!["tasks"]);
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();

        assert!(matches!(storage.write("../escape", "[]"), Err(Error::InvalidKey(_))));
        assert!(matches!(storage.read(""), Err(Error::InvalidKey(_))));
    }
}

use std::env;
use std::sync::Arc;
use crate::{DurableStorage, Result};
use crate::engine::{FileStorage, MemoryStorage};

/// Environment variable selecting the backend (`file` or `memory`).
pub const STORAGE_ENV: &str = "COLLECTION_STORAGE";

/// Initializes a [`DurableStorage`] based on the environment.
///
/// 1. If `COLLECTION_STORAGE` is `memory`, returns a fresh [`MemoryStorage`].
/// 2. Otherwise, returns a [`FileStorage`] rooted at `data_dir`, creating it if needed.
///
/// # Examples
///
/// ```no_run
/// use collection_store::engine::{discovery, Slot};
///
/// fn main() -> anyhow::Result<()> {
///     let storage = discovery::open("./data")?;
///     let slot = Slot::new(storage, "tasks");
///     Ok(())
/// }
/// ```
pub fn open(data_dir: &str) -> Result<Arc<dyn DurableStorage>> {
    let mode = env::var(STORAGE_ENV).unwrap_or_default();
    open_with_mode(&mode, data_dir)
}

fn open_with_mode(mode: &str, data_dir: &str) -> Result<Arc<dyn DurableStorage>> {
    match mode.trim().to_ascii_lowercase().as_str() {
        "memory" => {
            log::info!("Using in-memory storage; nothing will be written to disk");
            Ok(Arc::new(MemoryStorage::new()))
        }
        "" | "file" => Ok(Arc::new(FileStorage::new(data_dir)?)),
        other => {
            log::warn!("Unknown {} value '{}', falling back to file storage", STORAGE_ENV, other);
            Ok(Arc::new(FileStorage::new(data_dir)?))
        }
    }
}

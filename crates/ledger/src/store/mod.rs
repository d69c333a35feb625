mod file;
mod memory;
mod sqlite;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use serde::de::DeserializeOwned;
use tracing::warn;

use common::{KeyValueStore, Result};

/// Read and decode the JSON document under `key`.
///
/// A missing key yields `T::default()`. So does an undecodable value: corrupt
/// state is logged and treated as empty rather than failing the pass.
pub(crate) async fn read_json<T>(store: &dyn KeyValueStore, key: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = store.get(key).await? else {
        return Ok(T::default());
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            warn!(key, error = %e, "Stored value is unreadable, treating as empty");
            Ok(T::default())
        }
    }
}

#[cfg(test)]
pub(crate) fn temp_path(name: &str) -> std::path::PathBuf {
    use std::sync::atomic::{AtomicUsize, Ordering};
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("ledger-{name}-{}-{n}.json", std::process::id()))
}

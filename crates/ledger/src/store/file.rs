use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use common::{Error, KeyValueStore, Result};

/// Store backed by a single JSON object on disk (`{"key": "value", ...}`).
///
/// Writes go to a sibling temp file that is renamed over the original, so a
/// reader never sees a half-written document. Writers within the process are
/// serialized by a mutex.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                Error::Store(format!("state file '{}' is corrupt: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(entries)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), keys = entries.len(), "State file written");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_all().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_all().await?;
        if entries.remove(key).is_some() {
            self.write_all(&entries).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::temp_path;

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let store = JsonFileStore::new(temp_path("missing"));
        assert_eq!(store.get("anything").await.unwrap(), None);
        store.remove("anything").await.unwrap();
    }

    #[tokio::test]
    async fn values_survive_reopen() {
        let path = temp_path("reopen");
        {
            let store = JsonFileStore::new(&path);
            store.set("a", "1").await.unwrap();
            store.set("b", "[2]").await.unwrap();
            store.remove("a").await.unwrap();
        }
        let store = JsonFileStore::new(&path);
        assert_eq!(store.get("a").await.unwrap(), None);
        assert_eq!(store.get("b").await.unwrap().as_deref(), Some("[2]"));
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn corrupt_file_is_a_store_error() {
        let path = temp_path("corrupt");
        std::fs::write(&path, "not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(matches!(store.get("a").await, Err(Error::Store(_))));
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn creates_parent_directories() {
        let dir = temp_path("nested").with_extension("");
        let path = dir.join("inner").join("state.json");
        let store = JsonFileStore::new(&path);
        store.set("k", "v").await.unwrap();
        assert!(path.exists());
        let _ = std::fs::remove_dir_all(dir);
    }
}

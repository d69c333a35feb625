use async_trait::async_trait;

use crate::Result;

/// Abstraction over the persisted key-value state (trades, zones, settings).
///
/// Values are opaque strings; the typed wrappers in `crates/ledger` encode
/// them as JSON. `MemoryStore`, `JsonFileStore` and `SqliteStore` implement
/// this trait and are interchangeable.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value as one write.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

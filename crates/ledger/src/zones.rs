use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use common::{KeyValueStore, Result, Zone};

use crate::store::read_json;

const ZONES_KEY: &str = "manual_zones";

/// User-drawn support and resistance levels, in insertion order.
///
/// Clones share one edit lock, so concurrent edits through any clone are
/// applied one after another.
#[derive(Clone)]
pub struct ZoneBook {
    store: Arc<dyn KeyValueStore>,
    edit_lock: Arc<Mutex<()>>,
}

impl ZoneBook {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            edit_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn list(&self) -> Result<Vec<Zone>> {
        read_json(self.store.as_ref(), ZONES_KEY).await
    }

    /// Append a zone. Duplicates are kept.
    pub async fn add(&self, zone: Zone) -> Result<Vec<Zone>> {
        let _guard = self.edit_lock.lock().await;
        let mut zones = self.list().await?;
        zones.push(zone);
        self.save(&zones).await?;
        info!(kind = %zone.kind, price = zone.price, "Zone added");
        Ok(zones)
    }

    /// Remove the zone at `index`. Returns `None` when out of range.
    pub async fn remove(&self, index: usize) -> Result<Option<Zone>> {
        let _guard = self.edit_lock.lock().await;
        let mut zones = self.list().await?;
        if index >= zones.len() {
            return Ok(None);
        }
        let removed = zones.remove(index);
        self.save(&zones).await?;
        info!(index, kind = %removed.kind, price = removed.price, "Zone removed");
        Ok(Some(removed))
    }

    async fn save(&self, zones: &[Zone]) -> Result<()> {
        self.store
            .set(ZONES_KEY, &serde_json::to_string(zones)?)
            .await
    }
}

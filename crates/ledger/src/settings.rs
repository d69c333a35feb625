use std::sync::Arc;

use tracing::info;

use common::{KeyValueStore, Result, StrategySettings};

use crate::store::read_json;

const SETTINGS_KEY: &str = "strategy_settings";

/// Persisted user strategy settings.
#[derive(Clone)]
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Stored settings, or defaults when none are stored or they are unreadable.
    pub async fn load(&self) -> Result<StrategySettings> {
        read_json(self.store.as_ref(), SETTINGS_KEY).await
    }

    pub async fn save(&self, settings: &StrategySettings) -> Result<()> {
        self.store
            .set(SETTINGS_KEY, &serde_json::to_string(settings)?)
            .await?;
        info!(
            take_profit_percent = settings.take_profit_percent,
            auto_support = settings.auto_support_enabled,
            "Strategy settings saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    #[tokio::test]
    async fn defaults_when_nothing_stored() {
        let settings = SettingsStore::new(Arc::new(MemoryStore::new()));
        assert_eq!(settings.load().await.unwrap(), StrategySettings::default());
    }

    #[tokio::test]
    async fn save_then_load() {
        let settings = SettingsStore::new(Arc::new(MemoryStore::new()));
        let custom = StrategySettings {
            take_profit_percent: 2.5,
            auto_support_enabled: false,
        };
        settings.save(&custom).await.unwrap();
        assert_eq!(settings.load().await.unwrap(), custom);
    }

    #[tokio::test]
    async fn partial_document_fills_defaults() {
        let store = MemoryStore::new();
        store
            .set(SETTINGS_KEY, r#"{"auto_support_enabled":false}"#)
            .await
            .unwrap();
        let loaded = SettingsStore::new(Arc::new(store)).load().await.unwrap();
        assert_eq!(loaded.take_profit_percent, 4.0);
        assert!(!loaded.auto_support_enabled);
    }
}

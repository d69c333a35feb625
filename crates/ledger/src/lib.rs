pub mod ledger;
pub mod settings;
pub mod store;
pub mod zones;

pub use ledger::TradeLedger;
pub use settings::SettingsStore;
pub use store::{JsonFileStore, MemoryStore, SqliteStore};
pub use zones::ZoneBook;

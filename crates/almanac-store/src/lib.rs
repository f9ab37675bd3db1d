//! `almanac-store` — snapshot persistence for the event collection.
//!
//! The whole collection is written on every change and read once at startup.
//! Two backends share the [`EventStore`] trait:
//!
//! | Backend          | File                       |
//! |------------------|----------------------------|
//! | [`JsonFileStore`]| `calendar_events.json`     |
//! | [`SqliteStore`]  | SQLite `events` table      |

pub mod db;
pub mod error;
pub mod json;
pub mod sqlite;

use almanac_core::{
    config::{StorageBackend, StorageConfig},
    PortableSnapshot,
};
use tracing::info;

pub use error::{Result, StoreError};
pub use json::JsonFileStore;
pub use sqlite::SqliteStore;

/// Load/save the full portable snapshot.
pub trait EventStore: Send {
    /// A store that has never been written loads as an empty snapshot.
    fn load(&self) -> Result<PortableSnapshot>;

    /// Replace the stored snapshot with `snapshot`.
    fn save(&self, snapshot: &PortableSnapshot) -> Result<()>;
}

/// Open the backend selected in config.
pub fn open_store(config: &StorageConfig) -> Result<Box<dyn EventStore>> {
    info!(backend = ?config.backend, path = %config.path, "opening event store");
    let store: Box<dyn EventStore> = match config.backend {
        StorageBackend::Json => Box::new(JsonFileStore::new(&config.path)),
        StorageBackend::Sqlite => Box::new(SqliteStore::open(&config.path)?),
    };
    Ok(store)
}

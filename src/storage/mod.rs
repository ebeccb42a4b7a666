//! Key-value persistence used by the blog cache.
//!
//! The cache only ever needs "read a string", "write a string" and "forget a
//! key", so every backend implements [`KeyValueStore`] and nothing above this
//! module knows which one is in use.

use std::{path::Path, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

mod json_file;
mod memory;
mod sqlite;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrites any previous value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum StoreKind {
    Memory,
    #[default]
    Json,
    Sqlite,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Memory => "memory",
            StoreKind::Json => "json",
            StoreKind::Sqlite => "sqlite",
        }
    }
}

/// Opens the backend selected by `kind`, keeping its files under `data_dir`.
pub fn open_store(kind: StoreKind, data_dir: &Path) -> Result<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match kind {
        StoreKind::Memory => Arc::new(MemoryStore::new()),
        StoreKind::Json => Arc::new(JsonFileStore::open(data_dir.join("storage.json"))?),
        StoreKind::Sqlite => Arc::new(SqliteStore::open(data_dir.join("folio.sqlite3"))?),
    };
    Ok(store)
}

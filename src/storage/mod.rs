use std::sync::Arc;

use tracing::info;

use crate::config::{StaticConfig, StoreBackend};
use crate::errors::Result;

pub mod backend;
pub mod id;
pub mod memory;
pub mod models;
pub mod traits;

pub use backend::SeaOrmStore;
pub use id::IdGenerator;
pub use memory::MemoryStore;
pub use models::{
    AggregateStats, GroupCount, GroupField, LOCALHOST, MapPoint, PageView, UNKNOWN,
    normalize_filter,
};
pub use traits::EventStore;

pub struct StorageFactory;

impl StorageFactory {
    /// 按 `store.backend` 创建存储
    pub async fn create(config: &StaticConfig) -> Result<Arc<dyn EventStore>> {
        match config.store.backend {
            StoreBackend::Memory => {
                let cap = config.store.memory_cap();
                info!("Using in-memory store (cap {})", cap);
                Ok(Arc::new(MemoryStore::new(cap)))
            }
            StoreBackend::Database => {
                let store =
                    SeaOrmStore::new(&config.database, config.store.retention_cap).await?;
                Ok(Arc::new(store))
            }
        }
    }
}

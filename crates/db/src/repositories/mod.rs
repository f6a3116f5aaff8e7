use async_trait::async_trait;
use thiserror::Error;

use stockroom_core::domain::inventory::{InventoryRecord, ItemId};

pub mod inventory;

pub use inventory::SqlInventoryRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Record store primitives. Mutations report rows affected so callers can
/// detect a missing id without a separate read.
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn insert(&self, name: &str, quantity: i64) -> Result<InventoryRecord, RepositoryError>;
    async fn find_by_id(&self, id: ItemId) -> Result<Option<InventoryRecord>, RepositoryError>;
    async fn update(&self, id: ItemId, name: &str, quantity: i64) -> Result<u64, RepositoryError>;
    async fn delete(&self, id: ItemId) -> Result<u64, RepositoryError>;
    async fn list_all(&self) -> Result<Vec<InventoryRecord>, RepositoryError>;
    async fn count(&self) -> Result<i64, RepositoryError>;
}

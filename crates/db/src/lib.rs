pub mod connection;
pub mod repositories;
pub mod schema;

pub use connection::{connect, connect_with_settings, DbPool};
pub use repositories::{InventoryRepository, RepositoryError, SqlInventoryRepository};
pub use schema::{ensure_schema, inspect_store, StoreOrigin};

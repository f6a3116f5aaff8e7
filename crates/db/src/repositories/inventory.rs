use sqlx::Row;
use tracing::debug;

use stockroom_core::domain::inventory::{InventoryRecord, ItemId};

use super::{InventoryRepository, RepositoryError};
use crate::DbPool;

pub struct SqlInventoryRepository {
    pool: DbPool,
}

impl SqlInventoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<InventoryRecord, RepositoryError> {
    let id: i64 = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let quantity: i64 =
        row.try_get("quantity").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(InventoryRecord { id: ItemId(id), name, quantity })
}

// Each mutation owns its transaction. An early return through `?` drops it,
// which rolls back and hands the connection back to the pool.
#[async_trait::async_trait]
impl InventoryRepository for SqlInventoryRepository {
    async fn insert(&self, name: &str, quantity: i64) -> Result<InventoryRecord, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("INSERT INTO inventory (name, quantity) VALUES (?, ?)")
            .bind(name)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;
        let id = ItemId(result.last_insert_rowid());
        tx.commit().await?;

        debug!(event_name = "db.inventory.inserted", item_id = id.0, "inventory row inserted");
        Ok(InventoryRecord { id, name: name.to_string(), quantity })
    }

    async fn find_by_id(&self, id: ItemId) -> Result<Option<InventoryRecord>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, quantity FROM inventory WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_record(r)?)),
            None => Ok(None),
        }
    }

    async fn update(&self, id: ItemId, name: &str, quantity: i64) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let affected = sqlx::query("UPDATE inventory SET name = ?, quantity = ? WHERE id = ?")
            .bind(name)
            .bind(quantity)
            .bind(id.0)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if affected == 0 {
            tx.rollback().await?;
        } else {
            tx.commit().await?;
        }

        debug!(event_name = "db.inventory.updated", item_id = id.0, affected, "inventory update");
        Ok(affected)
    }

    async fn delete(&self, id: ItemId) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let affected = sqlx::query("DELETE FROM inventory WHERE id = ?")
            .bind(id.0)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if affected == 0 {
            tx.rollback().await?;
        } else {
            tx.commit().await?;
        }

        debug!(event_name = "db.inventory.deleted", item_id = id.0, affected, "inventory delete");
        Ok(affected)
    }

    async fn list_all(&self) -> Result<Vec<InventoryRecord>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> =
            sqlx::query("SELECT id, name, quantity FROM inventory ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(row_to_record).collect::<Result<Vec<_>, _>>()
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query("SELECT COUNT(*) AS count FROM inventory")
            .fetch_one(&self.pool)
            .await?
            .try_get::<i64, _>("count")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;
        Ok(count)
    }
}

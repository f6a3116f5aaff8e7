use std::fmt;
use std::path::{Path, PathBuf};

use crate::DbPool;

pub const INVENTORY_TABLE_DDL: &str = "CREATE TABLE IF NOT EXISTS inventory (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    quantity INTEGER NOT NULL
)";

/// Where the store came from, decided before the pool is opened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreOrigin {
    Created(PathBuf),
    Reused(PathBuf),
    InMemory,
}

impl fmt::Display for StoreOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created(path) => write!(
                f,
                "No database file found at '{}'. Initializing a new one.",
                path.display()
            ),
            Self::Reused(path) => write!(
                f,
                "Database file found at '{}'. Re-using existing inventory.",
                path.display()
            ),
            Self::InMemory => f.write_str("Using an in-memory inventory store."),
        }
    }
}

pub fn inspect_store(database_url: &str) -> StoreOrigin {
    match database_file(database_url) {
        Some(path) if path.exists() => StoreOrigin::Reused(path),
        Some(path) => StoreOrigin::Created(path),
        None => StoreOrigin::InMemory,
    }
}

fn database_file(database_url: &str) -> Option<PathBuf> {
    let trimmed = database_url.trim();
    let without_scheme = trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .unwrap_or(trimmed);
    let location = without_scheme.split('?').next().unwrap_or_default();

    if location.is_empty() || location.starts_with(":memory:") {
        return None;
    }

    Some(Path::new(location).to_path_buf())
}

/// Creates the inventory table on first startup. Existing stores are left untouched.
pub async fn ensure_schema(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(INVENTORY_TABLE_DDL).execute(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use sqlx::Row;
    use tempfile::TempDir;

    use super::{ensure_schema, inspect_store, StoreOrigin};
    use crate::connect_with_settings;

    #[test]
    fn memory_urls_are_not_files() {
        assert_eq!(inspect_store("sqlite::memory:"), StoreOrigin::InMemory);
        assert_eq!(inspect_store(":memory:"), StoreOrigin::InMemory);
        assert_eq!(inspect_store("sqlite::memory:?cache=shared"), StoreOrigin::InMemory);
    }

    #[test]
    fn missing_file_is_reported_as_created() {
        let origin = inspect_store("sqlite://does-not-exist-anywhere.db?mode=rwc");
        assert_eq!(origin, StoreOrigin::Created(PathBuf::from("does-not-exist-anywhere.db")));
        assert_eq!(
            origin.to_string(),
            "No database file found at 'does-not-exist-anywhere.db'. Initializing a new one."
        );
    }

    #[tokio::test]
    async fn store_is_created_then_reused() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("inventory.db");
        let url = format!("sqlite://{}", path.display());

        assert_eq!(inspect_store(&url), StoreOrigin::Created(path.clone()));

        let pool = connect_with_settings(&url, 1, 30).await.expect("connect creates file");
        ensure_schema(&pool).await.expect("schema");
        sqlx::query("INSERT INTO inventory (name, quantity) VALUES ('Bolt', 10)")
            .execute(&pool)
            .await
            .expect("insert");
        pool.close().await;

        assert_eq!(inspect_store(&url), StoreOrigin::Reused(path));

        let pool = connect_with_settings(&url, 1, 30).await.expect("reconnect");
        ensure_schema(&pool).await.expect("schema is idempotent");
        let count = sqlx::query("SELECT COUNT(*) AS count FROM inventory")
            .fetch_one(&pool)
            .await
            .expect("count")
            .get::<i64, _>("count");
        assert_eq!(count, 1, "existing rows must survive a restart");
        pool.close().await;
    }

    #[tokio::test]
    async fn schema_matches_declared_columns() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        ensure_schema(&pool).await.expect("schema");

        let columns =
            sqlx::query("SELECT name, type, \"notnull\", pk FROM pragma_table_info('inventory')")
                .fetch_all(&pool)
                .await
                .expect("table info");
        let columns = columns
            .iter()
            .map(|row| {
                (
                    row.get::<String, _>("name"),
                    row.get::<String, _>("type"),
                    row.get::<i64, _>("notnull"),
                    row.get::<i64, _>("pk"),
                )
            })
            .collect::<Vec<_>>();

        assert_eq!(
            columns,
            vec![
                ("id".to_string(), "INTEGER".to_string(), 0, 1),
                ("name".to_string(), "TEXT".to_string(), 1, 0),
                ("quantity".to_string(), "INTEGER".to_string(), 1, 0),
            ]
        );

        let autoincrement = sqlx::query(
            "SELECT COUNT(*) AS count FROM sqlite_master \
             WHERE type = 'table' AND name = 'sqlite_sequence'",
        )
        .fetch_one(&pool)
        .await
        .expect("sqlite_sequence lookup")
        .get::<i64, _>("count");
        assert_eq!(autoincrement, 1, "AUTOINCREMENT keeps a sqlite_sequence table");
    }
}

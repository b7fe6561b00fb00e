use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::time::Duration;

use super::{StoreResult, StoreStats};

pub type DbPool = sqlx::SqlitePool;

/// Handle on the image cache database.
///
/// Cloning is cheap: clones share the same connection pool. The sync
/// components receive a connection from the cycle's transaction, while the
/// query API reads through the pool.
#[derive(Clone, Debug)]
pub struct CacheStore {
    pool: DbPool,
}

impl CacheStore {
    /// Opens (or creates) the cache at `db_path` and brings the schema up to date.
    pub async fn open<P: AsRef<Path>>(db_path: P) -> StoreResult<Self> {
        let db_path = db_path.as_ref();

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // WAL lets viewer queries read a consistent snapshot while a refresh
        // cycle holds the write transaction.
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        info!("Image cache opened at {}", db_path.display());
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Waits for in-flight queries and closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn stats(&self) -> StoreResult<StoreStats> {
        let (folders, files, metas): (i64, i64, i64) = sqlx::query_as(
            "SELECT
                (SELECT COUNT(*) FROM folder),
                (SELECT COUNT(*) FROM file),
                (SELECT COUNT(*) FROM meta)",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(StoreStats {
            folders,
            files,
            metas,
        })
    }

    pub async fn vacuum(&self) -> StoreResult<()> {
        sqlx::query("VACUUM").execute(&self.pool).await?;
        info!("Database vacuum completed");
        Ok(())
    }
}

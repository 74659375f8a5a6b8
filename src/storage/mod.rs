//! Durable dedup store
//!
//! A single SQLite table of already-notified listing ids. Write-once:
//! ids are never updated or expired, so a listing is suppressed forever
//! once an alert for it went out.

use crate::error::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Per-listing dedup operations consumed by the monitor loop.
///
/// A failing store is fatal for the running cycle: without it the
/// at-most-once dispatch guarantee cannot be upheld.
#[async_trait]
pub trait DedupStore: Send + Sync {
    async fn is_sent(&self, id: &str) -> Result<bool>;
    async fn mark_sent(&self, id: &str) -> Result<()>;
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if missing) the dedup database at `path`.
    pub async fn connect(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path))?
            .create_if_missing(true);

        // Single connection: the store is only touched from the monitor
        // loop's execution context.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS sent (
                id TEXT PRIMARY KEY,
                sent_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Has an alert for this listing id already been dispatched?
    pub async fn is_sent(&self, id: &str) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM sent WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Record a dispatched listing id. Idempotent: re-marking is a no-op.
    pub async fn mark_sent(&self, id: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO sent (id, sent_at) VALUES (?, ?)")
            .bind(id)
            .bind(chrono::Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Total ids recorded, for the /status report.
    pub async fn sent_count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sent")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0)
    }
}

#[async_trait]
impl DedupStore for Database {
    async fn is_sent(&self, id: &str) -> Result<bool> {
        Database::is_sent(self, id).await
    }

    async fn mark_sent(&self, id: &str) -> Result<()> {
        Database::mark_sent(self, id).await
    }
}

//! Persistent key-value cache backed by SQLite.
//!
//! Holds two fixed slots: the last snapshot fetched from the backend and the
//! session token. Last write wins, no versioning. Reads are best-effort and
//! report a missing or unreadable slot as `None`.

use std::future::Future;
use std::path::Path;
use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use thiserror::Error;

use crate::models::Snapshot;
use crate::remote::TokenSource;

/// Slot holding the serialized [`Snapshot`].
pub const SNAPSHOT_KEY: &str = "students.snapshot";
/// Slot holding the bearer token.
pub const TOKEN_KEY: &str = "auth.token";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to create cache directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// What the sync controller needs from local persistence.
pub trait SnapshotCache {
    fn read_snapshot(&self) -> impl Future<Output = Option<Snapshot>>;

    fn write_snapshot(&self, snapshot: &Snapshot) -> impl Future<Output = Result<(), CacheError>>;

    fn read_token(&self) -> impl Future<Output = Option<String>>;
}

#[derive(Debug, Clone)]
pub struct LocalCache {
    pool: SqlitePool,
}

impl LocalCache {
    /// Opens (or creates) the cache database at `path` and runs migrations.
    pub async fn open(path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", path.display());
        let options = SqliteConnectOptions::from_str(&db_url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn write_token(&self, token: &str) -> Result<(), CacheError> {
        self.put(TOKEN_KEY, token).await
    }

    pub async fn clear_token(&self) -> Result<(), CacheError> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(TOKEN_KEY)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Option<String> {
        let row: Result<Option<(String,)>, sqlx::Error> =
            sqlx::query_as("SELECT value FROM kv WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await;

        match row {
            Ok(row) => row.map(|(value,)| value),
            Err(e) => {
                tracing::warn!("cache read of '{}' failed: {}", key, e);
                None
            }
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), CacheError> {
        sqlx::query(
            r#"
            INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

impl SnapshotCache for LocalCache {
    async fn read_snapshot(&self) -> Option<Snapshot> {
        let raw = self.get(SNAPSHOT_KEY).await?;
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!("ignoring unreadable cached snapshot: {}", e);
                None
            }
        }
    }

    async fn write_snapshot(&self, snapshot: &Snapshot) -> Result<(), CacheError> {
        let json = serde_json::to_string(snapshot)?;
        self.put(SNAPSHOT_KEY, &json).await
    }

    async fn read_token(&self) -> Option<String> {
        self.get(TOKEN_KEY).await.filter(|t| !t.trim().is_empty())
    }
}

impl TokenSource for LocalCache {
    async fn token(&self) -> Option<String> {
        self.read_token().await
    }
}

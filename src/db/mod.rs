use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::config::Config;

pub mod repository;

pub use repository::ClientRepository;

/// Key under which the whole client collection is stored.
pub const CLIENTS_KEY: &str = "sewing_clients";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("could not serialize clients: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A flat string-to-string store holding serialized blobs.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`, replacing whatever was there.
    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// SQLite-backed key-value store
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database named in the configuration
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let db = Self::connect(config.database_url()).await?;
        Ok(db)
    }

    /// Open a database by URL and make sure the key-value table exists.
    ///
    /// The pool keeps a single long-lived connection so that `sqlite::memory:`
    /// databases survive for the lifetime of the pool.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl KeyValueStore for Database {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(self.get_pool())
            .await?;

        Ok(value)
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value)
            VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(self.get_pool())
        .await?;

        Ok(())
    }
}

/// Initialize the database from configuration
pub async fn init(config: &Config) -> anyhow::Result<Database> {
    Database::new(config).await
}

//! Database layer for VERIFY
//!
//! Provides:
//! - SeaORM entity model for analysis records
//! - Repository for append-only writes and per-user history reads
//! - Connection pool management for file-backed and in-memory SQLite

pub mod models;
mod repository;

pub use models::AnalysisRecord;
pub use repository::Repository;

use crate::config::{StorageBackend, StorageConfig};
use crate::errors::{AppError, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// Keeps the single in-memory connection alive for the life of the process
const PINNED_CONNECTION_LIFETIME: Duration = Duration::from_secs(60 * 60 * 24 * 365);

const CREATE_ANALYSES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS analyses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_identifier TEXT NOT NULL,
    content_type TEXT NOT NULL,
    content_summary TEXT NOT NULL,
    result_payload TEXT NOT NULL,
    created_at TEXT NOT NULL
)
"#;

const CREATE_ANALYSES_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_analyses_user_created
    ON analyses (user_identifier, created_at DESC)
"#;

/// Database connection pool wrapper
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
    backend: StorageBackend,
}

impl DbPool {
    /// Open the configured database and make sure the schema exists
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        let url = config.url();
        info!(backend = ?config.backend, "Opening analysis store...");

        let mut opts = ConnectOptions::new(&url);
        match config.backend {
            StorageBackend::File => {
                opts.max_connections(config.max_connections.max(1))
                    .min_connections(1)
                    .sqlx_logging(false);
            }
            // Every SQLite memory connection is its own database, so exactly one is kept open.
            StorageBackend::Memory => {
                opts.max_connections(1)
                    .min_connections(1)
                    .idle_timeout(PINNED_CONNECTION_LIFETIME)
                    .max_lifetime(PINNED_CONNECTION_LIFETIME)
                    .sqlx_logging(false);
            }
        }

        let conn = Database::connect(opts)
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Failed to open {}: {}", url, e),
            })?;

        let pool = Self {
            conn,
            backend: config.backend,
        };
        pool.ensure_schema().await?;

        info!("Analysis store ready");
        Ok(pool)
    }

    /// Shorthand for an ephemeral store
    pub async fn in_memory() -> Result<Self> {
        Self::connect(&StorageConfig::in_memory()).await
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.conn.execute_unprepared(CREATE_ANALYSES_TABLE).await?;
        self.conn.execute_unprepared(CREATE_ANALYSES_INDEX).await?;
        Ok(())
    }

    /// Underlying connection
    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Which storage backend this pool was opened with
    pub fn backend(&self) -> StorageBackend {
        self.backend
    }

    /// Ping the database to check connectivity
    pub async fn ping(&self) -> Result<()> {
        self.conn
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| AppError::DatabaseConnection {
                message: format!("Ping failed: {}", e),
            })?;
        Ok(())
    }

    /// Close the pool on shutdown
    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }
}

//! Repository for analysis records
//!
//! Append-only: records are inserted and read back, never updated or deleted.

use crate::analysis::ContentKind;
use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.conn()
    }

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    /// Append one analysis record; the id and timestamp are assigned here
    pub async fn record(
        &self,
        user_identifier: &str,
        kind: ContentKind,
        content_summary: String,
        result_payload: String,
    ) -> Result<AnalysisRecord> {
        let record = AnalysisActiveModel {
            id: NotSet,
            user_identifier: Set(user_identifier.to_string()),
            content_type: Set(kind.as_str().to_string()),
            content_summary: Set(content_summary),
            result_payload: Set(result_payload),
            created_at: Set(chrono::Utc::now()),
        };

        let saved = record.insert(self.conn()).await?;

        tracing::debug!(
            id = saved.id,
            content_type = %kind,
            "Analysis recorded"
        );

        Ok(saved)
    }

    /// Most recent records for a user, newest first
    pub async fn recent(&self, user_identifier: &str, limit: u64) -> Result<Vec<AnalysisRecord>> {
        AnalysisEntity::find()
            .filter(AnalysisColumn::UserIdentifier.eq(user_identifier))
            .order_by_desc(AnalysisColumn::CreatedAt)
            .order_by_desc(AnalysisColumn::Id)
            .limit(limit)
            .all(self.conn())
            .await
            .map_err(Into::into)
    }
}

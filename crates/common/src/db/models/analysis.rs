//! Analysis record entity
//!
//! One row per submitted analysis. Rows are written once and never updated.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::ContentKind;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "analyses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Email or "anonymous"; not validated or unique
    #[sea_orm(column_type = "Text")]
    pub user_identifier: String,

    #[sea_orm(column_type = "Text")]
    pub content_type: String,

    /// First 500 characters of text, the URL, or a media label
    #[sea_orm(column_type = "Text")]
    pub content_summary: String,

    /// Normalized report serialized as JSON
    #[sea_orm(column_type = "Text")]
    pub result_payload: String,

    pub created_at: DateTimeUtc,
}

impl Model {
    /// Content type as an enum
    pub fn kind(&self) -> Option<ContentKind> {
        self.content_type.parse().ok()
    }

    /// Stored payload as JSON, falling back to the raw text if it no longer parses
    pub fn result_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.result_payload)
            .unwrap_or_else(|_| serde_json::Value::String(self.result_payload.clone()))
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

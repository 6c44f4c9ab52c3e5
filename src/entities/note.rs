//! Note entity - Staff-only sticky notes about a guild member.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Note database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notes")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Discord guild id
    pub guild_id: String,
    /// Member the note is about
    pub target_id: String,
    /// Staff member who wrote the note
    pub creator_id: String,
    /// Username of the author at the time of writing
    pub creator_name: String,
    /// Note text
    pub content: String,
    /// When the note was written
    pub created_at: DateTimeUtc,
}

/// Notes have no relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

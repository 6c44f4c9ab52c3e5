//! Panel entity - Pointer to a periodically refreshed statistics message.
//!
//! Used to resume refresh tasks after a restart. At most one row exists per
//! `(guild_id, kind)`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Panel pointer database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "panels")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Discord guild id
    pub guild_id: String,
    /// Panel kind: `"live"` or `"profiles"`
    pub kind: String,
    /// Channel holding the panel message
    pub channel_id: String,
    /// The panel message itself
    pub message_id: String,
    /// When the pointer was last written
    pub updated_at: DateTimeUtc,
}

/// Panels have no relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

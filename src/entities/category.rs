//! Category entity - Ticket categories configured per guild.
//!
//! A category decides where ticket channels are created, which roles count as
//! staff for those tickets, and whether claiming and feedback are enabled.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Discord guild id
    pub guild_id: String,
    /// Display name, unique within the guild
    pub name: String,
    /// Discord category channel new ticket channels are created under
    pub channel_id: Option<String>,
    /// JSON array of staff role ids, e.g. `["123", "456"]`
    pub staff_roles: String,
    /// Whether claiming hides the ticket from other staff
    pub claiming: bool,
    /// Whether the creator is asked for a rating after close
    pub enable_feedback: bool,
}

/// Defines relationships between Category and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One category has many tickets
    #[sea_orm(has_many = "super::ticket::Entity")]
    Tickets,
}

impl Related<super::ticket::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tickets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

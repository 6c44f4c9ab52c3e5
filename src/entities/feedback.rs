//! Feedback entity - Post-close rating left by the ticket creator.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Feedback database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "feedback")]
pub struct Model {
    /// Unique identifier for the feedback entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Ticket the feedback is about
    #[sea_orm(unique)]
    pub ticket_id: String,
    /// Guild of the ticket
    pub guild_id: String,
    /// Member who left the feedback
    pub user_id: Option<String>,
    /// Rating from 1 to 5
    pub rating: i32,
    /// Optional free-text comment
    pub comment: Option<String>,
    /// When the feedback was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Feedback and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each feedback entry belongs to one ticket
    #[sea_orm(
        belongs_to = "super::ticket::Entity",
        from = "Column::TicketId",
        to = "super::ticket::Column::Id"
    )]
    Ticket,
}

impl Related<super::ticket::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ticket.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! Ticket entity - One row per ticket channel.
//!
//! The primary key is the Discord channel id of the ticket, so every command run
//! inside a ticket channel can look the ticket up directly. Lifecycle timestamps
//! (`created_at`, `first_response_at`, `closed_at`) feed the staff statistics.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ticket database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tickets")]
pub struct Model {
    /// Discord channel id of the ticket channel
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Discord guild id
    pub guild_id: String,
    /// Category the ticket was opened in, if any
    pub category_id: Option<i64>,
    /// Per-guild sequential ticket number
    pub number: i32,
    /// Discord user id of the member who opened the ticket
    pub created_by_id: String,
    /// Optional topic given when opening
    pub topic: Option<String>,
    /// When the ticket was opened
    pub created_at: DateTimeUtc,
    /// First staff reply
    pub first_response_at: Option<DateTimeUtc>,
    /// Last non-bot message in the channel
    pub last_message_at: Option<DateTimeUtc>,
    /// When the inactivity warning was posted; cleared by the next message
    pub stale_since: Option<DateTimeUtc>,
    /// Staff member currently handling the ticket
    pub claimed_by_id: Option<String>,
    /// When the ticket was closed
    pub closed_at: Option<DateTimeUtc>,
    /// Staff member who closed the ticket
    pub closed_by_id: Option<String>,
    /// Close reason code (e.g. `"issue_resolved"`)
    pub closed_reason: Option<String>,
    /// Whether the ticket is still open
    pub open: bool,
    /// Whether the creator has been prevented from replying
    pub locked: bool,
    /// When the ticket was locked
    pub locked_at: Option<DateTimeUtc>,
    /// When a locked ticket becomes eligible for deletion
    pub scheduled_deletion_at: Option<DateTimeUtc>,
    /// Message carrying the Claim / Transfer / Close buttons
    pub opening_message_id: Option<String>,
}

/// Defines relationships between Ticket and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each ticket optionally belongs to a category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_delete = "SetNull"
    )]
    Category,
    /// A ticket has at most one feedback entry
    #[sea_orm(has_one = "super::feedback::Entity")]
    Feedback,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::feedback::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Feedback.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

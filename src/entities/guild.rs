//! Guild entity - Per-guild presentation settings (footer and embed colours).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Guild settings database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "guilds")]
pub struct Model {
    /// Discord guild id
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Footer text shown on embeds
    pub footer: Option<String>,
    /// Colour for regular embeds (`0xRRGGBB`)
    pub primary_colour: i32,
    /// Colour for success embeds
    pub success_colour: i32,
    /// Colour for error embeds
    pub error_colour: i32,
}

/// Guild settings have no relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

//! Staff profile entity - Self-service bio shown in profile commands and panels.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Staff profile database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "staff_profiles")]
pub struct Model {
    /// Discord user id
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    /// Short biography
    pub bio: String,
    /// Free-form timezone, e.g. `"UTC-5"`
    pub timezone: String,
    /// Active hours as entered, e.g. `"09:00-17:00"`
    pub active_hours: Option<String>,
    /// Optional portfolio link
    pub portfolio: Option<String>,
    /// When the profile was last changed
    pub updated_at: DateTimeUtc,
}

/// Staff profiles have no relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

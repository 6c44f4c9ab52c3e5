//! Self-service staff profiles.

use crate::{
    entities::{StaffProfile, staff_profile},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Fields a staff member sets with `/setprofile`.
#[derive(Debug, Clone, Default)]
pub struct ProfileInput {
    /// Free-text bio
    pub bio: String,
    /// Timezone, e.g. `UTC+2`
    pub timezone: String,
    /// Active hours, free text or a JSON list of lines
    pub active_hours: String,
    /// Optional portfolio link
    pub portfolio: Option<String>,
}

/// Creates or replaces the profile of `user_id`.
pub async fn set_profile(
    db: &DatabaseConnection,
    user_id: &str,
    input: ProfileInput,
    now: DateTime<Utc>,
) -> Result<staff_profile::Model> {
    let bio = input.bio.trim().to_string();
    let timezone = input.timezone.trim().to_string();
    if bio.is_empty() || timezone.is_empty() {
        return Err(Error::InvalidInput {
            message: "Bio and timezone are required.".to_string(),
        });
    }
    let active_hours = Some(input.active_hours.trim().to_string()).filter(|s| !s.is_empty());
    let portfolio = input
        .portfolio
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    let saved = if let Some(existing) = StaffProfile::find_by_id(user_id.to_string()).one(db).await? {
        let mut active: staff_profile::ActiveModel = existing.into();
        active.bio = Set(bio);
        active.timezone = Set(timezone);
        active.active_hours = Set(active_hours);
        active.portfolio = Set(portfolio);
        active.updated_at = Set(now);
        active.update(db).await?
    } else {
        staff_profile::ActiveModel {
            user_id: Set(user_id.to_string()),
            bio: Set(bio),
            timezone: Set(timezone),
            active_hours: Set(active_hours),
            portfolio: Set(portfolio),
            updated_at: Set(now),
        }
        .insert(db)
        .await?
    };
    tracing::info!(user_id, "Profile updated");
    Ok(saved)
}

/// Profile of one user.
pub async fn get_profile(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Option<staff_profile::Model>> {
    StaffProfile::find_by_id(user_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Every stored profile, by user id.
pub async fn list_profiles(db: &DatabaseConnection) -> Result<Vec<staff_profile::Model>> {
    StaffProfile::find()
        .order_by_asc(staff_profile::Column::UserId)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Active hours as display lines.
///
/// Accepts a JSON list of strings; anything else is shown as typed. Blank or
/// empty list yields `None`.
#[must_use]
pub fn active_hours_lines(raw: &str) -> Option<String> {
    let lines = match serde_json::from_str::<Vec<String>>(raw) {
        Ok(lines) => lines.join("\n"),
        Err(_) => raw.trim().to_string(),
    };
    (!lines.trim().is_empty()).then_some(lines)
}

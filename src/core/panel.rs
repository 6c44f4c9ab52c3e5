//! Persisted pointers to auto-refreshing statistics messages.

use crate::{
    entities::{Panel, panel},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use std::fmt;
use std::str::FromStr;

/// Kind of auto-refreshing panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PanelKind {
    /// Guild statistics and staff performance
    Live,
    /// Staff profiles with per-staff averages
    Profiles,
}

impl PanelKind {
    /// Stored code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Profiles => "profiles",
        }
    }
}

impl fmt::Display for PanelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for PanelKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "live" => Ok(Self::Live),
            "profiles" => Ok(Self::Profiles),
            other => Err(format!("unknown panel kind `{other}`")),
        }
    }
}

/// Where a panel message lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelPointer {
    /// Guild id
    pub guild_id: String,
    /// Panel kind
    pub kind: PanelKind,
    /// Channel holding the message
    pub channel_id: String,
    /// The panel message
    pub message_id: String,
}

impl PanelPointer {
    fn from_model(model: panel::Model) -> Option<Self> {
        let kind = match model.kind.parse() {
            Ok(kind) => kind,
            Err(e) => {
                tracing::warn!("Skipping panel row {}: {e}", model.id);
                return None;
            }
        };
        Some(Self {
            guild_id: model.guild_id,
            kind,
            channel_id: model.channel_id,
            message_id: model.message_id,
        })
    }
}

async fn find_row(
    db: &DatabaseConnection,
    guild_id: &str,
    kind: PanelKind,
) -> Result<Option<panel::Model>> {
    Panel::find()
        .filter(panel::Column::GuildId.eq(guild_id))
        .filter(panel::Column::Kind.eq(kind.code()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Stores the pointer, replacing any previous one for the same guild and kind.
pub async fn upsert_pointer(
    db: &DatabaseConnection,
    pointer: &PanelPointer,
    now: DateTime<Utc>,
) -> Result<()> {
    if let Some(existing) = find_row(db, &pointer.guild_id, pointer.kind).await? {
        let mut active: panel::ActiveModel = existing.into();
        active.channel_id = Set(pointer.channel_id.clone());
        active.message_id = Set(pointer.message_id.clone());
        active.updated_at = Set(now);
        active.update(db).await?;
    } else {
        let model = panel::ActiveModel {
            guild_id: Set(pointer.guild_id.clone()),
            kind: Set(pointer.kind.code().to_string()),
            channel_id: Set(pointer.channel_id.clone()),
            message_id: Set(pointer.message_id.clone()),
            updated_at: Set(now),
            ..Default::default()
        };
        model.insert(db).await?;
    }
    tracing::debug!(guild_id = %pointer.guild_id, kind = %pointer.kind, "Panel pointer saved");
    Ok(())
}

/// Pointer for a guild and kind.
pub async fn get_pointer(
    db: &DatabaseConnection,
    guild_id: &str,
    kind: PanelKind,
) -> Result<Option<PanelPointer>> {
    Ok(find_row(db, guild_id, kind)
        .await?
        .and_then(PanelPointer::from_model))
}

/// Removes the pointer. Returns whether one existed.
pub async fn delete_pointer(db: &DatabaseConnection, guild_id: &str, kind: PanelKind) -> Result<bool> {
    let result = Panel::delete_many()
        .filter(panel::Column::GuildId.eq(guild_id))
        .filter(panel::Column::Kind.eq(kind.code()))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Every stored pointer, used once at startup.
pub async fn list_pointers(db: &DatabaseConnection) -> Result<Vec<PanelPointer>> {
    Ok(Panel::find()
        .order_by_asc(panel::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .filter_map(PanelPointer::from_model)
        .collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn pointer(guild: &str, kind: PanelKind, message: &str) -> PanelPointer {
        PanelPointer {
            guild_id: guild.to_string(),
            kind,
            channel_id: "chan".to_string(),
            message_id: message.to_string(),
        }
    }

    #[tokio::test]
    async fn test_upsert_keeps_one_per_kind() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc::now();
        upsert_pointer(&db, &pointer("g1", PanelKind::Live, "m1"), now).await?;
        upsert_pointer(&db, &pointer("g1", PanelKind::Live, "m2"), now).await?;
        upsert_pointer(&db, &pointer("g1", PanelKind::Profiles, "m3"), now).await?;

        let all = list_pointers(&db).await?;
        assert_eq!(all.len(), 2);
        let live = get_pointer(&db, "g1", PanelKind::Live).await?.unwrap();
        assert_eq!(live.message_id, "m2");
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_pointer() -> Result<()> {
        let db = setup_test_db().await?;
        upsert_pointer(&db, &pointer("g1", PanelKind::Live, "m1"), Utc::now()).await?;
        assert!(delete_pointer(&db, "g1", PanelKind::Live).await?);
        assert!(!delete_pointer(&db, "g1", PanelKind::Live).await?);
        assert!(get_pointer(&db, "g1", PanelKind::Live).await?.is_none());
        Ok(())
    }

    #[test]
    fn test_kind_codes() {
        assert_eq!("live".parse::<PanelKind>(), Ok(PanelKind::Live));
        assert_eq!(PanelKind::Profiles.to_string(), "profiles");
        assert!("other".parse::<PanelKind>().is_err());
    }
}

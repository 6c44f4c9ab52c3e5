//! Staff sticky notes about guild members.

use crate::{
    entities::{Note, note},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Longest note accepted.
pub const MAX_NOTE_LEN: usize = 1000;

/// Stores a note about `target_id`.
pub async fn create_note(
    db: &DatabaseConnection,
    guild_id: &str,
    target_id: &str,
    creator_id: &str,
    creator_name: &str,
    content: &str,
    now: DateTime<Utc>,
) -> Result<note::Model> {
    let content = content.trim();
    if content.is_empty() {
        return Err(Error::InvalidInput {
            message: "Note cannot be empty.".to_string(),
        });
    }
    if content.chars().count() > MAX_NOTE_LEN {
        return Err(Error::InvalidInput {
            message: format!("Notes are limited to {MAX_NOTE_LEN} characters."),
        });
    }

    let model = note::ActiveModel {
        guild_id: Set(guild_id.to_string()),
        target_id: Set(target_id.to_string()),
        creator_id: Set(creator_id.to_string()),
        creator_name: Set(creator_name.to_string()),
        content: Set(content.to_string()),
        created_at: Set(now),
        ..Default::default()
    };
    let saved = model.insert(db).await?;
    tracing::info!(guild_id, target_id, creator_id, "Note added");
    Ok(saved)
}

/// Notes about `target_id` in a guild, newest first.
pub async fn list_notes(
    db: &DatabaseConnection,
    guild_id: &str,
    target_id: &str,
) -> Result<Vec<note::Model>> {
    Note::find()
        .filter(note::Column::GuildId.eq(guild_id))
        .filter(note::Column::TargetId.eq(target_id))
        .order_by_desc(note::Column::CreatedAt)
        .order_by_desc(note::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_notes_newest_first() -> Result<()> {
        let db = setup_test_db().await?;
        let t0 = Utc::now();
        create_note(&db, "g1", "u1", "s1", "Staff", "first", t0).await?;
        create_note(&db, "g1", "u1", "s2", "Other", "second", t0 + Duration::minutes(1)).await?;
        create_note(&db, "g1", "u2", "s1", "Staff", "elsewhere", t0).await?;
        create_note(&db, "g2", "u1", "s1", "Staff", "other guild", t0).await?;

        let notes = list_notes(&db, "g1", "u1").await?;
        let contents: Vec<_> = notes.iter().map(|n| n.content.as_str()).collect();
        assert_eq!(contents, vec!["second", "first"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_note_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc::now();
        assert!(matches!(
            create_note(&db, "g1", "u1", "s1", "Staff", "   ", now).await,
            Err(Error::InvalidInput { .. })
        ));
        let long = "x".repeat(MAX_NOTE_LEN + 1);
        assert!(matches!(
            create_note(&db, "g1", "u1", "s1", "Staff", &long, now).await,
            Err(Error::InvalidInput { .. })
        ));
        Ok(())
    }
}

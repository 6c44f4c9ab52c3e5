//! Ticket category management.

use crate::{
    entities::{Category, Ticket, category, ticket},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::Expr};

/// All categories of a guild, oldest first.
pub async fn list_categories(
    db: &DatabaseConnection,
    guild_id: &str,
) -> Result<Vec<category::Model>> {
    Category::find()
        .filter(category::Column::GuildId.eq(guild_id))
        .order_by_asc(category::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Case-insensitive lookup by name within a guild.
pub async fn find_category(
    db: &DatabaseConnection,
    guild_id: &str,
    name: &str,
) -> Result<Option<category::Model>> {
    let name = name.trim().to_lowercase();
    Ok(list_categories(db, guild_id)
        .await?
        .into_iter()
        .find(|c| c.name.to_lowercase() == name))
}

/// Resolves the category for a new ticket: the named one, or the oldest.
pub async fn resolve_category(
    db: &DatabaseConnection,
    guild_id: &str,
    name: Option<&str>,
) -> Result<category::Model> {
    match name {
        Some(name) => find_category(db, guild_id, name)
            .await?
            .ok_or_else(|| Error::CategoryNotFound {
                name: name.to_string(),
            }),
        None => list_categories(db, guild_id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::CategoryNotFound {
                name: "(default)".to_string(),
            }),
    }
}

/// Settings for a new category.
#[derive(Debug, Clone, Default)]
pub struct NewCategory {
    /// Display name, unique per guild
    pub name: String,
    /// Discord category channel new tickets go under
    pub channel_id: Option<String>,
    /// Role ids treated as staff
    pub staff_roles: Vec<String>,
    /// Whether claiming hides the ticket from other staff
    pub claiming: bool,
    /// Whether closed tickets ask the creator for a rating
    pub enable_feedback: bool,
}

/// Creates a category. Names are unique per guild, ignoring case.
pub async fn add_category(
    db: &DatabaseConnection,
    guild_id: &str,
    new: NewCategory,
) -> Result<category::Model> {
    let name = new.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::InvalidInput {
            message: "Category name cannot be empty.".to_string(),
        });
    }
    if find_category(db, guild_id, &name).await?.is_some() {
        return Err(Error::CategoryExists { name });
    }

    let model = category::ActiveModel {
        guild_id: Set(guild_id.to_string()),
        name: Set(name),
        channel_id: Set(new.channel_id),
        staff_roles: Set(serde_json::to_string(&new.staff_roles)?),
        claiming: Set(new.claiming),
        enable_feedback: Set(new.enable_feedback),
        ..Default::default()
    };
    let category = model.insert(db).await?;
    tracing::info!(guild_id, category = %category.name, "Category created");
    Ok(category)
}

/// Deletes a category by name. Its tickets are kept without a category.
pub async fn remove_category(db: &DatabaseConnection, guild_id: &str, name: &str) -> Result<()> {
    let category = find_category(db, guild_id, name)
        .await?
        .ok_or_else(|| Error::CategoryNotFound {
            name: name.to_string(),
        })?;
    Ticket::update_many()
        .col_expr(ticket::Column::CategoryId, Expr::value(Option::<i64>::None))
        .filter(ticket::Column::CategoryId.eq(category.id))
        .exec(db)
        .await?;
    Category::delete_by_id(category.id).exec(db).await?;
    tracing::info!(guild_id, category = %category.name, "Category removed");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_add_and_find_category() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_test_category(&db, "g1", "Support").await?;

        let found = find_category(&db, "g1", "  support ").await?.unwrap();
        assert_eq!(found.id, created.id);
        assert!(find_category(&db, "g2", "Support").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_category(&db, "g1", "Support").await?;
        let result = create_test_category(&db, "g1", "SUPPORT").await;
        assert!(matches!(result, Err(Error::CategoryExists { .. })));
        // Same name in another guild is fine
        create_test_category(&db, "g2", "Support").await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_name_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let result = add_category(
            &db,
            "g1",
            NewCategory {
                name: "   ".to_string(),
                ..NewCategory::default()
            },
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_defaults_to_oldest() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(matches!(
            resolve_category(&db, "g1", None).await,
            Err(Error::CategoryNotFound { .. })
        ));

        create_test_category(&db, "g1", "First").await?;
        create_test_category(&db, "g1", "Second").await?;
        assert_eq!(resolve_category(&db, "g1", None).await?.name, "First");
        assert_eq!(
            resolve_category(&db, "g1", Some("second")).await?.name,
            "Second"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_category() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_category(&db, "g1", "Support").await?;
        remove_category(&db, "g1", "support").await?;
        assert!(list_categories(&db, "g1").await?.is_empty());
        assert!(matches!(
            remove_category(&db, "g1", "support").await,
            Err(Error::CategoryNotFound { .. })
        ));
        Ok(())
    }
}

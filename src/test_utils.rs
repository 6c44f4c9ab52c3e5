//! Shared test utilities for the ticket desk.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        category::{self, NewCategory},
        ticket::{self, NewTicket},
    },
    entities,
    errors::Result,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test category with sensible defaults.
///
/// # Defaults
/// * `channel_id`: None
/// * `staff_roles`: `["100"]`
/// * `claiming`: true
/// * `enable_feedback`: true
pub async fn create_test_category(
    db: &DatabaseConnection,
    guild_id: &str,
    name: &str,
) -> Result<entities::category::Model> {
    create_custom_category(db, guild_id, name, &["100"]).await
}

/// Creates a test category with the given staff roles.
pub async fn create_custom_category(
    db: &DatabaseConnection,
    guild_id: &str,
    name: &str,
    staff_roles: &[&str],
) -> Result<entities::category::Model> {
    category::add_category(
        db,
        guild_id,
        NewCategory {
            name: name.to_string(),
            channel_id: None,
            staff_roles: staff_roles.iter().map(ToString::to_string).collect(),
            claiming: true,
            enable_feedback: true,
        },
    )
    .await
}

/// Creates an open, unclaimed test ticket opened now.
///
/// # Defaults
/// * `category_id`: None
/// * `number`: next free number in the guild
/// * `topic`: None
pub async fn create_test_ticket(
    db: &DatabaseConnection,
    channel_id: &str,
    guild_id: &str,
    created_by_id: &str,
) -> Result<entities::ticket::Model> {
    let number = ticket::next_number(db, guild_id).await?;
    ticket::create_ticket(
        db,
        NewTicket {
            channel_id: channel_id.to_string(),
            guild_id: guild_id.to_string(),
            category_id: None,
            number,
            created_by_id: created_by_id.to_string(),
            topic: None,
        },
        Utc::now(),
    )
    .await
}

/// Sets up a database with one category and one ticket in it.
/// Returns (db, category, ticket) for lifecycle tests.
pub async fn setup_with_ticket() -> Result<(
    DatabaseConnection,
    entities::category::Model,
    entities::ticket::Model,
)> {
    let db = setup_test_db().await?;
    let category = create_test_category(&db, "guild", "Support").await?;
    let ticket = ticket::create_ticket(
        &db,
        NewTicket {
            channel_id: "channel".to_string(),
            guild_id: "guild".to_string(),
            category_id: Some(category.id),
            number: 1,
            created_by_id: "1234".to_string(),
            topic: Some("Help".to_string()),
        },
        Utc::now(),
    )
    .await?;
    Ok((db, category, ticket))
}

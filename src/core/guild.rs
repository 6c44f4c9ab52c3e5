//! Per-guild presentation settings.

use crate::{
    entities::{Guild, guild},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};

/// Default embed colour.
pub const DEFAULT_PRIMARY: i32 = 0x0034_98DB;
/// Default success colour.
pub const DEFAULT_SUCCESS: i32 = 0x002E_CC71;
/// Default error colour.
pub const DEFAULT_ERROR: i32 = 0x00E7_4C3C;
/// Default footer text.
pub const DEFAULT_FOOTER: &str = "Ticket Desk";

/// Settings of a guild, defaults when none are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildSettings {
    /// Embed footer
    pub footer: String,
    /// Neutral embed colour
    pub primary_colour: u32,
    /// Success embed colour
    pub success_colour: u32,
    /// Error embed colour
    pub error_colour: u32,
}

impl Default for GuildSettings {
    fn default() -> Self {
        Self::from_model(None)
    }
}

impl GuildSettings {
    #[allow(clippy::cast_sign_loss)]
    fn from_model(model: Option<guild::Model>) -> Self {
        match model {
            Some(m) => Self {
                footer: m.footer.unwrap_or_else(|| DEFAULT_FOOTER.to_string()),
                primary_colour: m.primary_colour as u32,
                success_colour: m.success_colour as u32,
                error_colour: m.error_colour as u32,
            },
            None => Self {
                footer: DEFAULT_FOOTER.to_string(),
                primary_colour: DEFAULT_PRIMARY as u32,
                success_colour: DEFAULT_SUCCESS as u32,
                error_colour: DEFAULT_ERROR as u32,
            },
        }
    }
}

/// Which colour `/settings colour` changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColourSlot {
    /// Neutral embeds
    Primary,
    /// Success embeds
    Success,
    /// Error embeds
    Error,
}

/// Loads the settings of a guild.
pub async fn get_settings(db: &DatabaseConnection, guild_id: &str) -> Result<GuildSettings> {
    let model = Guild::find_by_id(guild_id.to_string()).one(db).await?;
    Ok(GuildSettings::from_model(model))
}

async fn get_or_create(db: &DatabaseConnection, guild_id: &str) -> Result<guild::Model> {
    if let Some(existing) = Guild::find_by_id(guild_id.to_string()).one(db).await? {
        return Ok(existing);
    }
    let model = guild::ActiveModel {
        id: Set(guild_id.to_string()),
        footer: Set(None),
        primary_colour: Set(DEFAULT_PRIMARY),
        success_colour: Set(DEFAULT_SUCCESS),
        error_colour: Set(DEFAULT_ERROR),
    };
    Ok(model.insert(db).await?)
}

/// Sets the footer. An empty footer restores the default.
pub async fn set_footer(db: &DatabaseConnection, guild_id: &str, footer: &str) -> Result<GuildSettings> {
    let footer = footer.trim();
    let mut active: guild::ActiveModel = get_or_create(db, guild_id).await?.into();
    active.footer = Set(Some(footer.to_string()).filter(|f| !f.is_empty()));
    let updated = active.update(db).await?;
    Ok(GuildSettings::from_model(Some(updated)))
}

/// Parses `#RRGGBB` or `RRGGBB`.
pub fn parse_colour(input: &str) -> Result<i32> {
    let hex = input.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid_colour(input));
    }
    i32::from_str_radix(hex, 16).map_err(|_| invalid_colour(input))
}

fn invalid_colour(input: &str) -> Error {
    Error::InvalidInput {
        message: format!("`{input}` is not a hex colour like `#5865F2`."),
    }
}

/// Sets one of the embed colours.
pub async fn set_colour(
    db: &DatabaseConnection,
    guild_id: &str,
    slot: ColourSlot,
    colour: &str,
) -> Result<GuildSettings> {
    let value = parse_colour(colour)?;
    let mut active: guild::ActiveModel = get_or_create(db, guild_id).await?.into();
    match slot {
        ColourSlot::Primary => active.primary_colour = Set(value),
        ColourSlot::Success => active.success_colour = Set(value),
        ColourSlot::Error => active.error_colour = Set(value),
    }
    let updated = active.update(db).await?;
    tracing::info!(guild_id, ?slot, colour, "Guild colour updated");
    Ok(GuildSettings::from_model(Some(updated)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_missing_row_gives_defaults() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(get_settings(&db, "g1").await?, GuildSettings::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_footer_and_colour() -> Result<()> {
        let db = setup_test_db().await?;
        set_footer(&db, "g1", "Powered by us").await?;
        let settings = set_colour(&db, "g1", ColourSlot::Error, "#ff0000").await?;
        assert_eq!(settings.footer, "Powered by us");
        assert_eq!(settings.error_colour, 0x00FF_0000);
        assert_eq!(settings.primary_colour, 0x0034_98DB);

        let settings = set_footer(&db, "g1", "  ").await?;
        assert_eq!(settings.footer, DEFAULT_FOOTER);
        Ok(())
    }

    #[test]
    fn test_parse_colour() {
        assert_eq!(parse_colour("#5865F2").ok(), Some(0x0058_65F2));
        assert_eq!(parse_colour("00ff00").ok(), Some(0x0000_FF00));
        assert!(parse_colour("red").is_err());
        assert!(parse_colour("#12345").is_err());
        assert!(parse_colour("#zzzzzz").is_err());
    }
}

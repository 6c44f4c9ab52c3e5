//! Server administration - ticket categories and embed appearance.
//!
//! Every command here requires the Manage Server permission, checked by poise
//! before the command body runs.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::guild_of, embeds, handlers::autocomplete},
        core::{
            category::{self as ticket_category, NewCategory},
            guild::{self, ColourSlot},
            staff,
        },
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use std::fmt::Write;

    /// Embed colour option.
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum ColourChoice {
        #[name = "Primary"]
        Primary,
        #[name = "Success"]
        Success,
        #[name = "Error"]
        Error,
    }

    impl From<ColourChoice> for ColourSlot {
        fn from(value: ColourChoice) -> Self {
            match value {
                ColourChoice::Primary => Self::Primary,
                ColourChoice::Success => Self::Success,
                ColourChoice::Error => Self::Error,
            }
        }
    }

    async fn reply(ctx: poise::Context<'_, BotData, Error>, embed: serenity::CreateEmbed) -> Result<()> {
        ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
            .await?;
        Ok(())
    }

    /// Parent command for managing ticket categories.
    #[poise::command(
        slash_command,
        guild_only,
        default_member_permissions = "MANAGE_GUILD",
        required_permissions = "MANAGE_GUILD",
        subcommands("category_add", "category_remove", "category_list")
    )]
    pub async fn category(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Category management command. Available subcommands:\n\
            `/category add` - Add a ticket category\n\
            `/category remove` - Remove a ticket category\n\
            `/category list` - List ticket categories";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Adds a ticket category.
    #[poise::command(
        slash_command,
        guild_only,
        required_permissions = "MANAGE_GUILD",
        rename = "add"
    )]
    pub async fn category_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Category name"] name: String,
        #[description = "Role that handles these tickets"] staff_role: serenity::Role,
        #[description = "Discord category to create ticket channels in"]
        #[channel_types("Category")]
        parent: Option<serenity::GuildChannel>,
        #[description = "Hide claimed tickets from other staff (default: yes)"] claiming: Option<bool>,
        #[description = "Ask the creator for a rating after close (default: yes)"] feedback: Option<
            bool,
        >,
    ) -> Result<()> {
        let guild_id = guild_of(ctx)?;
        let db = &ctx.data().database;
        let created = ticket_category::add_category(
            db,
            &guild_id.to_string(),
            NewCategory {
                name,
                channel_id: parent.map(|c| c.id.to_string()),
                staff_roles: vec![staff_role.id.to_string()],
                claiming: claiming.unwrap_or(true),
                enable_feedback: feedback.unwrap_or(true),
            },
        )
        .await?;

        let settings = embeds::settings_for(db, Some(guild_id)).await;
        reply(
            ctx,
            embeds::success(
                &settings,
                "Category added",
                format!("`{}` is handled by <@&{}>.", created.name, staff_role.id),
            ),
        )
        .await
    }

    /// Removes a ticket category. Its tickets are kept without a category.
    #[poise::command(
        slash_command,
        guild_only,
        required_permissions = "MANAGE_GUILD",
        rename = "remove"
    )]
    pub async fn category_remove(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Category to remove"]
        #[autocomplete = "autocomplete::autocomplete_category_name"]
        name: String,
    ) -> Result<()> {
        let guild_id = guild_of(ctx)?;
        let db = &ctx.data().database;
        ticket_category::remove_category(db, &guild_id.to_string(), &name).await?;

        let settings = embeds::settings_for(db, Some(guild_id)).await;
        reply(
            ctx,
            embeds::success(&settings, "Category removed", format!("`{}` was removed.", name.trim())),
        )
        .await
    }

    /// Lists the ticket categories of this server.
    #[poise::command(
        slash_command,
        guild_only,
        required_permissions = "MANAGE_GUILD",
        rename = "list"
    )]
    pub async fn category_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let guild_id = guild_of(ctx)?;
        let db = &ctx.data().database;
        let categories = ticket_category::list_categories(db, &guild_id.to_string()).await?;
        let settings = embeds::settings_for(db, Some(guild_id)).await;

        let mut description = String::new();
        if categories.is_empty() {
            description.push_str("No categories yet. Add one with `/category add`.");
        }
        for (i, c) in categories.iter().enumerate() {
            let roles = staff::parse_staff_roles(&c.staff_roles)
                .iter()
                .map(|r| format!("<@&{r}>"))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(
                description,
                "**{}**{}: staff {}, claiming {}, feedback {}",
                c.name,
                if i == 0 { " (default)" } else { "" },
                if roles.is_empty() { "none".to_string() } else { roles },
                if c.claiming { "on" } else { "off" },
                if c.enable_feedback { "on" } else { "off" },
            )?;
        }

        reply(
            ctx,
            embeds::primary(&settings)
                .title("🗂 Ticket Categories")
                .description(description),
        )
        .await
    }

    /// Parent command for embed appearance.
    #[poise::command(
        slash_command,
        guild_only,
        default_member_permissions = "MANAGE_GUILD",
        required_permissions = "MANAGE_GUILD",
        subcommands("settings_show", "settings_footer", "settings_colour")
    )]
    pub async fn settings(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Settings command. Available subcommands:\n\
            `/settings show` - Show the current settings\n\
            `/settings footer` - Change the embed footer\n\
            `/settings colour` - Change an embed colour";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Shows the embed settings of this server.
    #[poise::command(
        slash_command,
        guild_only,
        required_permissions = "MANAGE_GUILD",
        rename = "show"
    )]
    pub async fn settings_show(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let guild_id = guild_of(ctx)?;
        let settings = guild::get_settings(&ctx.data().database, &guild_id.to_string()).await?;
        let embed = embeds::primary(&settings)
            .title("⚙ Settings")
            .field("Footer", &settings.footer, false)
            .field("Primary", format!("#{:06X}", settings.primary_colour), true)
            .field("Success", format!("#{:06X}", settings.success_colour), true)
            .field("Error", format!("#{:06X}", settings.error_colour), true);
        reply(ctx, embed).await
    }

    /// Changes the embed footer. Leave empty to restore the default.
    #[poise::command(
        slash_command,
        guild_only,
        required_permissions = "MANAGE_GUILD",
        rename = "footer"
    )]
    pub async fn settings_footer(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Footer text"] text: Option<String>,
    ) -> Result<()> {
        let guild_id = guild_of(ctx)?;
        let settings = guild::set_footer(
            &ctx.data().database,
            &guild_id.to_string(),
            text.as_deref().unwrap_or_default(),
        )
        .await?;
        let embed = embeds::success(
            &settings,
            "Footer updated",
            format!("Embeds now show `{}`.", settings.footer),
        );
        reply(ctx, embed).await
    }

    /// Changes one of the embed colours.
    #[poise::command(
        slash_command,
        guild_only,
        required_permissions = "MANAGE_GUILD",
        rename = "colour"
    )]
    pub async fn settings_colour(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Which colour"] slot: ColourChoice,
        #[description = "Hex colour, e.g. #5865F2"] colour: String,
    ) -> Result<()> {
        let guild_id = guild_of(ctx)?;
        let slot = ColourSlot::from(slot);
        let settings =
            guild::set_colour(&ctx.data().database, &guild_id.to_string(), slot, &colour).await?;
        let embed = embeds::success(
            &settings,
            "Colour updated",
            format!("{slot:?} colour set to `{}`.", colour.trim()),
        );
        reply(ctx, embed).await
    }
}

// Re-export all commands
pub use inner::*;

//! Auto-refreshing panel commands.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            commands::{guild_of, staff_guild},
            embeds, panels,
        },
        core::panel::PanelKind,
        errors::{Error, Result},
    };

    /// Panel kind option.
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum PanelChoice {
        #[name = "Live statistics"]
        Live,
        #[name = "Staff profiles"]
        Profiles,
    }

    impl From<PanelChoice> for PanelKind {
        fn from(value: PanelChoice) -> Self {
            match value {
                PanelChoice::Live => Self::Live,
                PanelChoice::Profiles => Self::Profiles,
            }
        }
    }

    async fn post(ctx: poise::Context<'_, BotData, Error>, kind: PanelKind) -> Result<()> {
        let guild_id = guild_of(ctx)?;
        ctx.defer_ephemeral().await?;
        let data = ctx.data();
        let message =
            panels::publish(ctx.serenity_context(), data, guild_id, ctx.channel_id(), kind).await?;

        let settings = embeds::settings_for(&data.database, Some(guild_id)).await;
        let embed = embeds::success(
            &settings,
            "Panel posted",
            format!(
                "The {kind} panel refreshes every {} seconds. [Jump to it]({})",
                data.config.panels.refresh_period().as_secs(),
                message.link()
            ),
        );
        ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
            .await?;
        Ok(())
    }

    /// Parent command for auto-refreshing statistics panels.
    #[poise::command(slash_command, guild_only, subcommands("panel_live", "panel_profiles", "panel_stop"))]
    pub async fn panel(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Panel command. Available subcommands:\n\
            `/panel live` - Post the live statistics panel (super users)\n\
            `/panel profiles` - Post the staff profiles panel (staff)\n\
            `/panel stop` - Stop refreshing a panel";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Posts the live statistics panel in this channel.
    ///
    /// Replaces any live panel already refreshing in this server.
    #[poise::command(slash_command, guild_only, rename = "live")]
    pub async fn panel_live(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        if !ctx.data().config.is_super(&ctx.author().id.to_string()) {
            return Err(Error::NotSuperUser {
                action: "post the live statistics panel".to_string(),
            });
        }
        post(ctx, PanelKind::Live).await
    }

    /// Posts the staff profiles panel in this channel.
    #[poise::command(slash_command, guild_only, rename = "profiles")]
    pub async fn panel_profiles(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        staff_guild(ctx, "post the profiles panel").await?;
        post(ctx, PanelKind::Profiles).await
    }

    /// Stops refreshing a panel and forgets it.
    #[poise::command(slash_command, guild_only, rename = "stop")]
    pub async fn panel_stop(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Which panel (default: live statistics)"] kind: Option<PanelChoice>,
    ) -> Result<()> {
        let kind = kind.map_or(PanelKind::Live, PanelKind::from);
        let data = ctx.data();
        let guild_id = guild_of(ctx)?;
        let author = ctx.author().id.to_string();
        if kind == PanelKind::Live && !data.config.is_super(&author) {
            return Err(Error::NotSuperUser {
                action: "stop the live statistics panel".to_string(),
            });
        }
        if kind == PanelKind::Profiles {
            staff_guild(ctx, "stop the profiles panel").await?;
        }

        let stopped = panels::stop(data, guild_id, kind).await?;
        let settings = embeds::settings_for(&data.database, Some(guild_id)).await;
        let embed = if stopped {
            embeds::success(&settings, "Panel stopped", format!("The {kind} panel will no longer refresh."))
        } else {
            embeds::primary(&settings).description(format!("No {kind} panel is running."))
        };
        ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;

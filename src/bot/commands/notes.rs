//! Staff notes about guild members, and private staff threads on tickets.

/// Prefix shared by every staff notes thread.
const THREAD_PREFIX: &str = "💬 Staff Notes";

/// Name of the staff notes thread of ticket `number`.
#[must_use]
pub fn staff_thread_name(number: i32) -> String {
    format!("{THREAD_PREFIX} - #{number}")
}

/// Whether a thread name belongs to a staff notes thread.
#[must_use]
pub fn is_staff_thread(name: &str) -> bool {
    name.starts_with(THREAD_PREFIX)
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::{is_staff_thread, staff_thread_name};
    use crate::{
        bot::{BotData, commands::staff_guild, embeds, tickets},
        core::{guild::GuildSettings, notes, ticket},
        entities::ticket as ticket_entity,
        errors::{Error, Result},
    };
    use chrono::Utc;
    use poise::serenity_prelude as serenity;
    use std::fmt::Write;

    /// Notes listed by `/viewnotes`.
    const MAX_LISTED: usize = 10;
    /// Characters shown per note; embed descriptions are capped at 4096.
    const PREVIEW_LEN: usize = 300;

    /// Leaves a note about a member for other staff.
    #[poise::command(slash_command, guild_only)]
    pub async fn stickynote(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Member the note is about"] member: serenity::User,
        #[description = "The note"] note: String,
    ) -> Result<()> {
        let guild_id = staff_guild(ctx, "add notes").await?;
        let db = &ctx.data().database;
        let author = ctx.author();
        notes::create_note(
            db,
            &guild_id.to_string(),
            &member.id.to_string(),
            &author.id.to_string(),
            &author.name,
            &note,
            Utc::now(),
        )
        .await?;

        let settings = embeds::settings_for(db, Some(guild_id)).await;
        let embed = embeds::success(
            &settings,
            "📝 Note saved",
            format!("Note added for <@{}>.", member.id),
        );
        ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
            .await?;
        Ok(())
    }

    /// Lists the notes staff left about a member, newest first.
    #[poise::command(slash_command, guild_only)]
    pub async fn viewnotes(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Member to look up"] member: serenity::User,
    ) -> Result<()> {
        let guild_id = staff_guild(ctx, "view notes").await?;
        let db = &ctx.data().database;
        let all = notes::list_notes(db, &guild_id.to_string(), &member.id.to_string()).await?;
        let settings = embeds::settings_for(db, Some(guild_id)).await;

        let mut description = String::new();
        if all.is_empty() {
            write!(description, "No notes for <@{}>.", member.id)?;
        }
        for note in all.iter().take(MAX_LISTED) {
            let mut content: String = note.content.chars().take(PREVIEW_LEN).collect();
            if note.content.chars().count() > PREVIEW_LEN {
                content.push('…');
            }
            writeln!(
                description,
                "**{}** <t:{}:R>\n{}\n",
                note.creator_name,
                note.created_at.timestamp(),
                content
            )?;
        }
        if all.len() > MAX_LISTED {
            write!(description, "…and {} older notes", all.len() - MAX_LISTED)?;
        }

        let embed = embeds::primary(&settings)
            .title(format!("📝 Notes for {}", member.name))
            .description(description);
        ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
            .await?;
        Ok(())
    }

    /// Active private staff thread under `channel_id`, if one is open.
    async fn find_staff_thread(
        ctx: poise::Context<'_, BotData, Error>,
        guild_id: serenity::GuildId,
        channel_id: serenity::ChannelId,
    ) -> Result<Option<serenity::GuildChannel>> {
        let active = guild_id.get_active_threads(ctx.http()).await?;
        Ok(active.threads.into_iter().find(|thread| {
            thread.parent_id == Some(channel_id)
                && thread.kind == serenity::ChannelType::PrivateThread
                && is_staff_thread(&thread.name)
        }))
    }

    /// Opens the private staff thread of a ticket and pins its intro.
    async fn open_staff_thread(
        ctx: poise::Context<'_, BotData, Error>,
        settings: &GuildSettings,
        channel_id: serenity::ChannelId,
        ticket: &ticket_entity::Model,
    ) -> Result<serenity::GuildChannel> {
        let thread = channel_id
            .create_thread(
                ctx,
                serenity::CreateThread::new(staff_thread_name(ticket.number))
                    .kind(serenity::ChannelType::PrivateThread)
                    .invitable(false)
                    .auto_archive_duration(serenity::AutoArchiveDuration::OneWeek),
            )
            .await?;
        tracing::info!(ticket = %ticket.id, thread = %thread.id, "Staff notes thread created");

        if let Ok(creator) = ticket::creator_id(ticket) {
            // Not a member of a fresh thread; removal only fails then.
            if let Err(e) = thread.id.remove_thread_member(ctx.http(), serenity::UserId::new(creator)).await {
                tracing::debug!(thread = %thread.id, "Creator was not in the staff thread: {e}");
            }
        }

        let intro = embeds::primary(settings)
            .title("📝 Staff Notes Thread")
            .description(
                "Private thread for staff notes about this ticket. \
                 The ticket creator cannot see it.",
            );
        let message = thread
            .id
            .send_message(ctx, serenity::CreateMessage::new().embed(intro))
            .await?;
        if let Err(e) = message.pin(ctx).await {
            tracing::warn!(thread = %thread.id, "Could not pin staff thread intro: {e}");
        }
        Ok(thread)
    }

    /// Adds a note to the ticket's private staff thread, opening it if needed.
    #[poise::command(slash_command, guild_only)]
    pub async fn note(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "The note"] text: String,
    ) -> Result<()> {
        let guild_id = staff_guild(ctx, "create notes").await?;
        ctx.defer_ephemeral().await?;
        let data = ctx.data();
        let channel_id = ctx.channel_id();
        let ticket = ticket::require_ticket(&data.database, &channel_id.to_string()).await?;
        let settings = embeds::settings_for(&data.database, Some(guild_id)).await;

        let (thread, created) = match find_staff_thread(ctx, guild_id, channel_id).await? {
            Some(thread) => (thread, false),
            None => (open_staff_thread(ctx, &settings, channel_id, &ticket).await?, true),
        };
        let author = ctx.author();
        thread.id.add_thread_member(ctx.http(), author.id).await?;

        let name = tickets::display_name(ctx.serenity_context(), guild_id, &author.id.to_string()).await;
        let embed = embeds::primary(&settings)
            .author(serenity::CreateEmbedAuthor::new(name).icon_url(author.face()))
            .description(text)
            .timestamp(serenity::Timestamp::now());
        thread
            .id
            .send_message(ctx, serenity::CreateMessage::new().embed(embed))
            .await?;
        tracing::info!(ticket = %ticket.id, thread = %thread.id, author = %author.id, "Staff note added");

        let (title, description) = if created {
            ("✅ Note created", format!("Created a private staff notes thread: <#{}>", thread.id))
        } else {
            ("✅ Note added", format!("Added note to the staff thread: <#{}>", thread.id))
        };
        ctx.send(
            poise::CreateReply::default()
                .embed(embeds::success(&settings, title, description))
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staff_thread_names() {
        let name = staff_thread_name(42);
        assert_eq!(name, "💬 Staff Notes - #42");
        assert!(is_staff_thread(&name));
        assert!(!is_staff_thread("ticket-42"));
        assert!(!is_staff_thread("Staff Notes - #42"));
    }
}

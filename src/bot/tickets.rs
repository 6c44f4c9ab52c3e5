//! Ticket actions shared by slash commands, buttons and modals.
//!
//! Each action checks the staff policy, applies the state change through
//! [`crate::core::ticket`], then mirrors it into channel permissions and the
//! opening message. The database is updated first; a Discord failure after that
//! is reported to the user without rolling the change back.

use crate::{
    bot::{BotData, embeds},
    core::{
        category,
        payload::ComponentPayload,
        staff::{self, MemberReference, StaffPolicy},
        sweep,
        ticket::{self, CloseReason, NewTicket},
    },
    entities::{category as category_entity, ticket as ticket_entity},
    errors::{Error, Result},
};
use chrono::Utc;
use poise::serenity_prelude as serenity;
use serenity::{PermissionOverwrite, PermissionOverwriteType, Permissions};
use std::time::Duration;

/// How long the close message stays visible before the channel is deleted.
const CLOSE_DELAY: Duration = Duration::from_secs(5);

/// Who acts on which ticket channel.
#[derive(Debug, Clone, Copy)]
pub struct TicketRequest {
    /// Guild of the ticket
    pub guild_id: serenity::GuildId,
    /// Ticket channel
    pub channel_id: serenity::ChannelId,
    /// Acting user
    pub actor: serenity::UserId,
}

fn participant() -> Permissions {
    Permissions::VIEW_CHANNEL
        | Permissions::SEND_MESSAGES
        | Permissions::READ_MESSAGE_HISTORY
        | Permissions::ATTACH_FILES
        | Permissions::EMBED_LINKS
}

fn member_overwrite(user_id: serenity::UserId, allow: Permissions, deny: Permissions) -> PermissionOverwrite {
    PermissionOverwrite {
        allow,
        deny,
        kind: PermissionOverwriteType::Member(user_id),
    }
}

fn role_overwrite(role_id: serenity::RoleId, allow: Permissions, deny: Permissions) -> PermissionOverwrite {
    PermissionOverwrite {
        allow,
        deny,
        kind: PermissionOverwriteType::Role(role_id),
    }
}

fn role_ids(raw: &str) -> Vec<serenity::RoleId> {
    staff::parse_staff_roles(raw)
        .iter()
        .filter_map(|r| r.parse::<u64>().ok())
        .filter(|id| *id > 0)
        .map(serenity::RoleId::new)
        .collect()
}

/// Fetches a member, mapping any failure to `None`.
pub async fn fetch_member(
    ctx: &serenity::Context,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
) -> Option<serenity::Member> {
    match guild_id.member(ctx, user_id).await {
        Ok(member) => Some(member),
        Err(e) => {
            tracing::debug!(%guild_id, %user_id, "Member lookup failed: {e}");
            None
        }
    }
}

/// Display name of a guild member, or a mention when the lookup fails.
pub async fn display_name(
    ctx: &serenity::Context,
    guild_id: serenity::GuildId,
    user_id: &str,
) -> String {
    let Some(id) = user_id.parse::<u64>().ok().filter(|id| *id > 0) else {
        return user_id.to_string();
    };
    fetch_member(ctx, guild_id, serenity::UserId::new(id))
        .await
        .map_or_else(|| format!("<@{id}>"), |m| m.display_name().to_string())
}

/// Staff check for a member of `guild_id`. A member that cannot be fetched is
/// not staff.
pub async fn is_staff(
    ctx: &serenity::Context,
    data: &BotData,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
) -> Result<bool> {
    let policy = StaffPolicy::load(&data.database, &guild_id.to_string(), &data.config.bot.supers).await?;
    if policy.is_super(&user_id.to_string()) {
        return Ok(true);
    }
    let Some(member) = fetch_member(ctx, guild_id, user_id).await else {
        return Ok(false);
    };
    let manage_guild = ctx
        .cache
        .guild(guild_id)
        .is_some_and(|g| g.member_permissions(&member).manage_guild());
    let roles: Vec<String> = member.roles.iter().map(ToString::to_string).collect();
    Ok(policy.is_staff(&user_id.to_string(), &roles, manage_guild))
}

/// Fails with [`Error::NotStaff`] unless `user_id` is staff.
pub async fn require_staff(
    ctx: &serenity::Context,
    data: &BotData,
    guild_id: serenity::GuildId,
    user_id: serenity::UserId,
    action: &str,
) -> Result<()> {
    if is_staff(ctx, data, guild_id, user_id).await? {
        Ok(())
    } else {
        Err(Error::NotStaff {
            action: action.to_string(),
        })
    }
}

async fn ticket_category(
    data: &BotData,
    ticket: &ticket_entity::Model,
) -> Result<Option<category_entity::Model>> {
    let Some(category_id) = ticket.category_id else {
        return Ok(None);
    };
    Ok(category::list_categories(&data.database, &ticket.guild_id)
        .await?
        .into_iter()
        .find(|c| c.id == category_id))
}

/// Claim / Transfer / Close buttons for the opening message.
pub fn ticket_buttons(claimed: bool, claiming: bool) -> Result<Vec<serenity::CreateActionRow>> {
    let mut buttons = Vec::new();
    if claiming {
        buttons.push(if claimed {
            serenity::CreateButton::new(ComponentPayload::Unclaim.encode()?)
                .label("Unclaim")
                .emoji('♻')
                .style(serenity::ButtonStyle::Secondary)
        } else {
            serenity::CreateButton::new(ComponentPayload::Claim.encode()?)
                .label("Claim")
                .emoji('🙌')
                .style(serenity::ButtonStyle::Success)
        });
        buttons.push(
            serenity::CreateButton::new(ComponentPayload::Transfer.encode()?)
                .label("Transfer")
                .emoji('🔀')
                .style(serenity::ButtonStyle::Primary)
                .disabled(!claimed),
        );
    }
    buttons.push(
        serenity::CreateButton::new(ComponentPayload::Close.encode()?)
            .label("Close")
            .emoji('✖')
            .style(serenity::ButtonStyle::Danger),
    );
    Ok(vec![serenity::CreateActionRow::Buttons(buttons)])
}

/// Rebuilds the opening message buttons. Failures are logged only.
async fn refresh_buttons(ctx: &serenity::Context, ticket: &ticket_entity::Model, claiming: bool) {
    let Some(message_id) = ticket
        .opening_message_id
        .as_deref()
        .and_then(|id| id.parse::<u64>().ok())
        .filter(|id| *id > 0)
    else {
        return;
    };
    let Ok(channel_id) = channel_of(ticket) else {
        return;
    };
    let rows = match ticket_buttons(ticket.claimed_by_id.is_some(), claiming) {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(ticket = %ticket.id, "Could not build ticket buttons: {e}");
            return;
        }
    };
    if let Err(e) = channel_id
        .edit_message(
            ctx,
            serenity::MessageId::new(message_id),
            serenity::EditMessage::new().components(rows),
        )
        .await
    {
        tracing::warn!(ticket = %ticket.id, "Could not update ticket buttons: {e}");
    }
}

/// Hides the channel from every staff role of the category.
async fn hide_from_staff_roles(
    ctx: &serenity::Context,
    channel_id: serenity::ChannelId,
    category: &category_entity::Model,
) -> Result<()> {
    for role in role_ids(&category.staff_roles) {
        channel_id
            .create_permission(ctx, role_overwrite(role, Permissions::empty(), Permissions::VIEW_CHANNEL))
            .await?;
    }
    Ok(())
}

/// Gives every staff role of the category its normal access back.
async fn restore_staff_roles(
    ctx: &serenity::Context,
    channel_id: serenity::ChannelId,
    category: &category_entity::Model,
) -> Result<()> {
    for role in role_ids(&category.staff_roles) {
        channel_id
            .create_permission(ctx, role_overwrite(role, participant(), Permissions::empty()))
            .await?;
    }
    Ok(())
}

/// Opens a ticket: creates the private channel, stores the row and posts the
/// opening message. Returns the new channel.
pub async fn create(
    ctx: &serenity::Context,
    data: &BotData,
    guild_id: serenity::GuildId,
    creator: &serenity::User,
    category_name: Option<&str>,
    topic: Option<String>,
) -> Result<serenity::ChannelId> {
    let guild = guild_id.to_string();
    let category = category::resolve_category(&data.database, &guild, category_name).await?;
    let number = ticket::next_number(&data.database, &guild).await?;
    let bot_id = ctx.cache.current_user().id;

    let mut overwrites = vec![
        role_overwrite(guild_id.everyone_role(), Permissions::empty(), Permissions::VIEW_CHANNEL),
        member_overwrite(creator.id, participant(), Permissions::empty()),
        member_overwrite(bot_id, participant() | Permissions::MANAGE_CHANNELS, Permissions::empty()),
    ];
    overwrites.extend(
        role_ids(&category.staff_roles)
            .into_iter()
            .map(|role| role_overwrite(role, participant(), Permissions::empty())),
    );

    let name = format!("{}-{number}", data.config.tickets.channel_prefix);
    let mut builder = serenity::CreateChannel::new(&name)
        .kind(serenity::ChannelType::Text)
        .permissions(overwrites);
    if let Some(parent) = category
        .channel_id
        .as_deref()
        .and_then(|id| id.parse::<u64>().ok())
        .filter(|id| *id > 0)
    {
        builder = builder.category(serenity::ChannelId::new(parent));
    }
    if let Some(topic) = topic.as_deref() {
        builder = builder.topic(topic);
    }
    let channel = guild_id.create_channel(ctx, builder).await?;

    let ticket = ticket::create_ticket(
        &data.database,
        NewTicket {
            channel_id: channel.id.to_string(),
            guild_id: guild,
            category_id: Some(category.id),
            number,
            created_by_id: creator.id.to_string(),
            topic: topic.clone(),
        },
        Utc::now(),
    )
    .await?;

    let settings = embeds::settings_for(&data.database, Some(guild_id)).await;
    let mut welcome = embeds::primary(&settings)
        .title(format!("🎫 Ticket #{number}"))
        .description(format!(
            "Hello <@{}>, a member of staff will be with you shortly.",
            creator.id
        ))
        .field("Category", &category.name, true);
    if let Some(topic) = topic {
        welcome = welcome.field("Topic", topic, false);
    }

    let message = channel
        .id
        .send_message(
            ctx,
            serenity::CreateMessage::new()
                .content(format!("<@{}>", creator.id))
                .embed(welcome)
                .components(ticket_buttons(false, category.claiming)?),
        )
        .await?;
    ticket::set_opening_message(&data.database, &ticket.id, &message.id.to_string()).await?;

    tracing::info!(%guild_id, channel = %channel.id, number, "Ticket channel opened");
    Ok(channel.id)
}

/// Claims the ticket for the actor.
pub async fn claim(ctx: &serenity::Context, data: &BotData, req: TicketRequest) -> Result<serenity::CreateEmbed> {
    require_staff(ctx, data, req.guild_id, req.actor, "claim tickets").await?;
    let ticket = ticket::claim(&data.database, &req.channel_id.to_string(), &req.actor.to_string()).await?;
    let category = ticket_category(data, &ticket).await?;
    let claiming = category.as_ref().is_some_and(|c| c.claiming);

    if let Some(category) = category.as_ref().filter(|c| c.claiming) {
        req.channel_id
            .create_permission(ctx, member_overwrite(req.actor, participant(), Permissions::empty()))
            .await?;
        hide_from_staff_roles(ctx, req.channel_id, category).await?;
    }
    refresh_buttons(ctx, &ticket, claiming).await;

    let settings = embeds::settings_for(&data.database, Some(req.guild_id)).await;
    Ok(embeds::success(
        &settings,
        "🙌 Ticket claimed",
        format!("<@{}> has claimed this ticket.", req.actor),
    ))
}

/// Releases the claim.
pub async fn unclaim(ctx: &serenity::Context, data: &BotData, req: TicketRequest) -> Result<serenity::CreateEmbed> {
    require_staff(ctx, data, req.guild_id, req.actor, "release tickets").await?;
    let (ticket, previous) = ticket::unclaim(&data.database, &req.channel_id.to_string()).await?;
    let category = ticket_category(data, &ticket).await?;
    let claiming = category.as_ref().is_some_and(|c| c.claiming);

    if let Some(category) = category.as_ref().filter(|c| c.claiming) {
        if let Ok(previous_id) = previous.parse::<u64>() {
            req.channel_id
                .delete_permission(
                    ctx,
                    PermissionOverwriteType::Member(serenity::UserId::new(previous_id)),
                )
                .await?;
        }
        restore_staff_roles(ctx, req.channel_id, category).await?;
    }
    refresh_buttons(ctx, &ticket, claiming).await;

    let settings = embeds::settings_for(&data.database, Some(req.guild_id)).await;
    Ok(embeds::success(
        &settings,
        "♻ Ticket released",
        format!("<@{}> has released this ticket.", req.actor),
    ))
}

/// Resolves an id, mention, or name to a guild member.
///
/// Names match exactly (username or display name, ignoring case) before
/// partially.
pub async fn resolve_member(
    ctx: &serenity::Context,
    guild_id: serenity::GuildId,
    query: &str,
) -> Result<serenity::Member> {
    let not_found = || Error::MemberNotFound {
        query: query.trim().to_string(),
    };
    match staff::parse_member_reference(query) {
        MemberReference::Id(id) => fetch_member(ctx, guild_id, serenity::UserId::new(id))
            .await
            .ok_or_else(not_found),
        MemberReference::Name(name) => {
            let members = guild_id
                .search_members(&ctx.http, &name, Some(25))
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(%guild_id, "Member search failed: {e}");
                    Vec::new()
                });
            let candidates: Vec<(usize, String, String)> = members
                .iter()
                .enumerate()
                .map(|(i, m)| (i, m.user.name.clone(), m.display_name().to_string()))
                .collect();
            staff::best_name_match(&name, &candidates)
                .and_then(|i| members.get(*i).cloned())
                .ok_or_else(not_found)
        }
    }
}

/// Hands the ticket to the member described by `target`.
pub async fn transfer(
    ctx: &serenity::Context,
    data: &BotData,
    req: TicketRequest,
    target: &str,
) -> Result<serenity::CreateEmbed> {
    require_staff(ctx, data, req.guild_id, req.actor, "transfer tickets").await?;
    let channel = req.channel_id.to_string();
    let current = ticket::require_ticket(&data.database, &channel).await?;
    if current.claimed_by_id.is_none() {
        return Err(Error::NotClaimed);
    }

    let member = resolve_member(ctx, req.guild_id, target).await?;
    let new_id = member.user.id;
    if !is_staff(ctx, data, req.guild_id, new_id).await? {
        return Err(Error::TargetNotStaff {
            user_id: new_id.to_string(),
        });
    }

    let (ticket, previous) = ticket::transfer(&data.database, &channel, &new_id.to_string()).await?;
    let category = ticket_category(data, &ticket).await?;

    if let Ok(previous_id) = previous.parse::<u64>() {
        if let Err(e) = req
            .channel_id
            .delete_permission(
                ctx,
                PermissionOverwriteType::Member(serenity::UserId::new(previous_id)),
            )
            .await
        {
            tracing::warn!(%channel, "Could not remove previous claimant overwrite: {e}");
        }
    }
    if let Some(category) = category.as_ref().filter(|c| c.claiming) {
        hide_from_staff_roles(ctx, req.channel_id, category).await?;
    }
    req.channel_id
        .create_permission(ctx, member_overwrite(new_id, participant(), Permissions::empty()))
        .await?;
    refresh_buttons(ctx, &ticket, category.as_ref().is_some_and(|c| c.claiming)).await;

    let settings = embeds::settings_for(&data.database, Some(req.guild_id)).await;
    Ok(embeds::success(
        &settings,
        "🔀 Ticket transferred",
        format!(
            "Ticket transferred from <@{previous}> to <@{new_id}> by <@{}>.",
            req.actor
        ),
    ))
}

/// Checks the creator is valid and still a member, returning their id.
async fn present_creator(
    ctx: &serenity::Context,
    req: TicketRequest,
    ticket: &ticket_entity::Model,
) -> Result<serenity::UserId> {
    let creator = serenity::UserId::new(ticket::creator_id(ticket)?);
    fetch_member(ctx, req.guild_id, creator)
        .await
        .map(|_| creator)
        .ok_or(Error::CreatorLeft)
}

/// Stops the creator from sending messages and schedules the ticket for deletion.
pub async fn lock(ctx: &serenity::Context, data: &BotData, req: TicketRequest) -> Result<serenity::CreateEmbed> {
    require_staff(ctx, data, req.guild_id, req.actor, "lock tickets").await?;
    let channel = req.channel_id.to_string();
    let current = ticket::require_ticket(&data.database, &channel).await?;
    if current.locked {
        return Err(Error::AlreadyLocked);
    }
    let creator = present_creator(ctx, req, &current).await?;

    let ticket = ticket::lock(
        &data.database,
        &channel,
        Utc::now(),
        data.config.tickets.lock_deletion_hours,
    )
    .await?;
    req.channel_id
        .create_permission(
            ctx,
            member_overwrite(
                creator,
                Permissions::VIEW_CHANNEL | Permissions::READ_MESSAGE_HISTORY,
                Permissions::SEND_MESSAGES,
            ),
        )
        .await?;

    let mut description = format!("<@{creator}> can no longer send messages in this ticket.");
    if let Some(at) = ticket.scheduled_deletion_at {
        description.push_str(&format!(
            "\nIt is scheduled for deletion <t:{}:R> unless unlocked.",
            at.timestamp()
        ));
    }
    let settings = embeds::settings_for(&data.database, Some(req.guild_id)).await;
    Ok(embeds::success(&settings, "🔒 Locked", description))
}

/// Lets the creator talk again and cancels the scheduled deletion.
pub async fn unlock(ctx: &serenity::Context, data: &BotData, req: TicketRequest) -> Result<serenity::CreateEmbed> {
    require_staff(ctx, data, req.guild_id, req.actor, "unlock tickets").await?;
    let channel = req.channel_id.to_string();
    let current = ticket::require_ticket(&data.database, &channel).await?;
    if !current.locked {
        return Err(Error::NotLocked);
    }
    let creator = present_creator(ctx, req, &current).await?;

    ticket::unlock(&data.database, &channel).await?;
    req.channel_id
        .create_permission(ctx, member_overwrite(creator, participant(), Permissions::empty()))
        .await?;

    let settings = embeds::settings_for(&data.database, Some(req.guild_id)).await;
    Ok(embeds::success(
        &settings,
        "🔓 Unlocked",
        format!("<@{creator}> can send messages in this ticket again."),
    ))
}

/// Closes the ticket. The caller shows the returned embed, then calls
/// [`finish_close`].
pub async fn close(
    ctx: &serenity::Context,
    data: &BotData,
    req: TicketRequest,
    reason: CloseReason,
) -> Result<(serenity::CreateEmbed, ticket_entity::Model)> {
    require_staff(ctx, data, req.guild_id, req.actor, "close tickets").await?;
    let ticket = ticket::close(
        &data.database,
        &req.channel_id.to_string(),
        &req.actor.to_string(),
        reason,
        Utc::now(),
    )
    .await?;

    let settings = embeds::settings_for(&data.database, Some(req.guild_id)).await;
    let embed = embeds::success(
        &settings,
        "✅ Ticket closed",
        format!(
            "{}\nClosed by <@{}>. This channel will be deleted in a few seconds.",
            reason.description(),
            req.actor
        ),
    );
    Ok((embed, ticket))
}

/// Rating buttons sent to the creator after close.
pub fn feedback_buttons(ticket_id: &str) -> Result<Vec<serenity::CreateActionRow>> {
    let buttons = (1..=5)
        .map(|rating| {
            let payload = ComponentPayload::Feedback {
                ticket: ticket_id.to_string(),
                rating,
            };
            Ok(serenity::CreateButton::new(payload.encode()?)
                .label("⭐".repeat(usize::try_from(rating).unwrap_or(1)))
                .style(serenity::ButtonStyle::Secondary))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(vec![serenity::CreateActionRow::Buttons(buttons)])
}

/// Channel of a ticket row.
pub fn channel_of(ticket: &ticket_entity::Model) -> Result<serenity::ChannelId> {
    ticket
        .id
        .parse::<u64>()
        .ok()
        .filter(|id| *id > 0)
        .map(serenity::ChannelId::new)
        .ok_or(Error::NotATicket)
}

fn guild_of(ticket: &ticket_entity::Model) -> Option<serenity::GuildId> {
    parse_guild_id(&ticket.guild_id)
}

fn parse_guild_id(guild_id: &str) -> Option<serenity::GuildId> {
    guild_id
        .parse::<u64>()
        .ok()
        .filter(|id| *id > 0)
        .map(serenity::GuildId::new)
}

/// DMs the creator the rating buttons when the category asks for feedback.
/// DM failures are logged only.
async fn request_feedback(ctx: &serenity::Context, data: &BotData, ticket: &ticket_entity::Model) -> Result<()> {
    let category = ticket_category(data, ticket).await?;
    if !category.as_ref().is_some_and(|c| c.enable_feedback) {
        return Ok(());
    }
    let Ok(creator) = ticket::creator_id(ticket) else {
        return Ok(());
    };

    let settings = embeds::settings_for(&data.database, guild_of(ticket)).await;
    let embed = embeds::primary(&settings)
        .title("How did we do?")
        .description(format!(
            "Your ticket #{} has been closed. Please rate the support you received.",
            ticket.number
        ));
    let message = serenity::CreateMessage::new()
        .embed(embed)
        .components(feedback_buttons(&ticket.id)?);
    if let Err(e) = serenity::UserId::new(creator).direct_message(ctx, message).await {
        tracing::warn!(ticket = %ticket.id, "Could not DM feedback request: {e}");
    }
    Ok(())
}

async fn delete_channel(ctx: &serenity::Context, ticket: &ticket_entity::Model) -> Result<()> {
    tokio::time::sleep(CLOSE_DELAY).await;
    channel_of(ticket)?.delete(ctx).await?;
    tracing::info!(ticket = %ticket.id, "Ticket channel deleted");
    Ok(())
}

/// Asks the creator for feedback (when the category wants it) and deletes the
/// channel. DM failures are swallowed.
pub async fn finish_close(ctx: &serenity::Context, data: &BotData, ticket: &ticket_entity::Model) -> Result<()> {
    request_feedback(ctx, data, ticket).await?;
    delete_channel(ctx, ticket).await
}

/// Closes a ticket nobody asked to close: after inactivity, or when a lock
/// runs out. Expired locks skip the feedback request.
pub async fn close_unattended(
    ctx: &serenity::Context,
    data: &BotData,
    ticket: &ticket_entity::Model,
    reason: CloseReason,
) -> Result<()> {
    let closed = sweep::close_unattended(&data.database, &ticket.id, reason, Utc::now()).await?;

    let settings = embeds::settings_for(&data.database, guild_of(&closed)).await;
    let embed = embeds::primary(&settings).title("🔒 Ticket closed").description(format!(
        "{}\nThis channel will be deleted in a few seconds.",
        reason.description()
    ));
    if let Err(e) = channel_of(&closed)?
        .send_message(ctx, serenity::CreateMessage::new().embed(embed))
        .await
    {
        tracing::warn!(ticket = %closed.id, "Could not announce automatic close: {e}");
    }

    if reason != CloseReason::LockExpired {
        request_feedback(ctx, data, &closed).await?;
    }
    delete_channel(ctx, &closed).await
}

/// Records a rating from the feedback DM.
pub async fn feedback(
    data: &BotData,
    user_id: serenity::UserId,
    ticket_id: &str,
    rating: i32,
) -> Result<serenity::CreateEmbed> {
    let saved = ticket::record_feedback(
        &data.database,
        ticket_id,
        &user_id.to_string(),
        rating,
        None,
        Utc::now(),
    )
    .await?;
    let settings = embeds::settings_for(&data.database, parse_guild_id(&saved.guild_id)).await;
    Ok(embeds::success(
        &settings,
        "Thank you!",
        format!(
            "You rated your support {}.",
            crate::core::ranking::star_rating(f64::from(saved.rating))
        ),
    ))
}

//! Button, select menu and modal submit handling.
//!
//! Every component this bot sends carries a [`ComponentPayload`] as its custom
//! id. Leaderboard controls belong to the collector of the command that posted
//! them; everything else is dispatched from here.

use crate::{
    bot::{BotData, embeds, tickets},
    core::{payload::ComponentPayload, ticket::CloseReason},
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;

/// Reply for component ids that cannot be decoded.
pub const INVALID_INTERACTION: &str = "This interaction is no longer valid.";

/// Input id of the member field in the transfer modal.
const TRANSFER_INPUT: &str = "member";

/// The two interaction kinds answered here.
#[derive(Clone, Copy)]
enum Responder<'a> {
    Component(&'a serenity::ComponentInteraction),
    Modal(&'a serenity::ModalInteraction),
}

impl Responder<'_> {
    async fn respond(
        self,
        ctx: &serenity::Context,
        response: serenity::CreateInteractionResponse,
    ) -> Result<()> {
        match self {
            Self::Component(c) => c.create_response(ctx, response).await?,
            Self::Modal(m) => m.create_response(ctx, response).await?,
        }
        Ok(())
    }

    fn guild_id(self) -> Option<serenity::GuildId> {
        match self {
            Self::Component(c) => c.guild_id,
            Self::Modal(m) => m.guild_id,
        }
    }

    fn request(self) -> Result<tickets::TicketRequest> {
        let (channel_id, actor) = match self {
            Self::Component(c) => (c.channel_id, c.user.id),
            Self::Modal(m) => (m.channel_id, m.user.id),
        };
        Ok(tickets::TicketRequest {
            guild_id: self.guild_id().ok_or(Error::NotInGuild)?,
            channel_id,
            actor,
        })
    }
}

fn message(embed: serenity::CreateEmbed, ephemeral: bool) -> serenity::CreateInteractionResponse {
    serenity::CreateInteractionResponse::Message(
        serenity::CreateInteractionResponseMessage::new()
            .embed(embed)
            .ephemeral(ephemeral),
    )
}

async fn reject(
    ctx: &serenity::Context,
    data: &BotData,
    responder: Responder<'_>,
    text: &str,
) -> Result<()> {
    let settings = embeds::settings_for(&data.database, responder.guild_id()).await;
    responder
        .respond(ctx, message(embeds::error(&settings, text), true))
        .await
}

async fn report_error(ctx: &serenity::Context, data: &BotData, responder: Responder<'_>, err: &Error) {
    if err.is_user_facing() {
        tracing::debug!("Interaction rejected: {err}");
    } else {
        tracing::error!("Error handling interaction: {err:?}");
    }
    let settings = embeds::settings_for(&data.database, responder.guild_id()).await;
    if let Err(e) = responder
        .respond(ctx, message(embeds::for_error(&settings, err), true))
        .await
    {
        tracing::warn!("Could not report interaction error: {e}");
    }
}

/// Entry point for `InteractionCreate` events. Slash commands and autocomplete
/// are left to poise.
pub async fn handle_interaction(ctx: &serenity::Context, data: &BotData, interaction: &serenity::Interaction) {
    let (responder, custom_id) = match interaction {
        serenity::Interaction::Component(c) => (Responder::Component(c), c.data.custom_id.as_str()),
        serenity::Interaction::Modal(m) => (Responder::Modal(m), m.data.custom_id.as_str()),
        _ => return,
    };

    let payload = match ComponentPayload::parse(custom_id) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::debug!(custom_id, "Rejecting interaction: {e}");
            if let Err(e) = reject(ctx, data, responder, INVALID_INTERACTION).await {
                tracing::warn!("Could not reject interaction: {e}");
            }
            return;
        }
    };

    if let Some(session) = payload.session() {
        // A live session is answered by its own collector.
        if data.sessions.is_active(session) {
            return;
        }
        report_error(ctx, data, responder, &Error::SessionExpired).await;
        return;
    }

    if let Err(e) = dispatch(ctx, data, responder, payload).await {
        report_error(ctx, data, responder, &e).await;
    }
}

async fn dispatch(
    ctx: &serenity::Context,
    data: &BotData,
    responder: Responder<'_>,
    payload: ComponentPayload,
) -> Result<()> {
    match payload {
        ComponentPayload::Claim => {
            let embed = tickets::claim(ctx, data, responder.request()?).await?;
            responder.respond(ctx, message(embed, false)).await
        }
        ComponentPayload::Unclaim => {
            let embed = tickets::unclaim(ctx, data, responder.request()?).await?;
            responder.respond(ctx, message(embed, false)).await
        }
        ComponentPayload::Transfer => {
            let req = responder.request()?;
            tickets::require_staff(ctx, data, req.guild_id, req.actor, "transfer tickets").await?;
            responder.respond(ctx, transfer_modal()?).await
        }
        ComponentPayload::TransferTicket => {
            let Responder::Modal(modal) = responder else {
                return Err(invalid("transfer submit outside a modal"));
            };
            let target = modal_value(modal, TRANSFER_INPUT).unwrap_or_default();
            let embed = tickets::transfer(ctx, data, responder.request()?, &target).await?;
            responder.respond(ctx, message(embed, false)).await
        }
        ComponentPayload::Close => {
            let (embed, ticket) =
                tickets::close(ctx, data, responder.request()?, CloseReason::TicketAnswered).await?;
            responder.respond(ctx, message(embed, false)).await?;
            if let Err(e) = tickets::finish_close(ctx, data, &ticket).await {
                tracing::error!(ticket = %ticket.id, "Could not finish closing ticket: {e}");
            }
            Ok(())
        }
        ComponentPayload::Feedback { ticket, rating } => {
            let user_id = match responder {
                Responder::Component(c) => c.user.id,
                Responder::Modal(m) => m.user.id,
            };
            let embed = tickets::feedback(data, user_id, &ticket, rating).await?;
            // Replacing the message drops the rating buttons.
            responder
                .respond(
                    ctx,
                    serenity::CreateInteractionResponse::UpdateMessage(
                        serenity::CreateInteractionResponseMessage::new()
                            .embed(embed)
                            .components(Vec::new()),
                    ),
                )
                .await
        }
        ComponentPayload::Leaderboard { .. } | ComponentPayload::Page { .. } => {
            Err(invalid("leaderboard control without a session"))
        }
    }
}

fn invalid(reason: &str) -> Error {
    Error::InvalidPayload {
        reason: reason.to_string(),
    }
}

fn transfer_modal() -> Result<serenity::CreateInteractionResponse> {
    let input = serenity::CreateInputText::new(
        serenity::InputTextStyle::Short,
        "Staff member",
        TRANSFER_INPUT,
    )
    .placeholder("User id, @mention or name")
    .required(true);
    Ok(serenity::CreateInteractionResponse::Modal(
        serenity::CreateModal::new(ComponentPayload::TransferTicket.encode()?, "Transfer Ticket")
            .components(vec![serenity::CreateActionRow::InputText(input)]),
    ))
}

fn modal_value(modal: &serenity::ModalInteraction, input_id: &str) -> Option<String> {
    modal
        .data
        .components
        .iter()
        .flat_map(|row| row.components.iter())
        .find_map(|component| match component {
            serenity::ActionRowComponent::InputText(input) if input.custom_id == input_id => {
                input.value.clone()
            }
            _ => None,
        })
}

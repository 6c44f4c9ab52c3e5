//! Unified error type for the ticket desk.
//!
//! Variants fall into two groups. Precondition failures (not a ticket channel,
//! not staff, member left, ...) are user-facing and their `Display` text is shown
//! to the invoking user. Everything else is internal: it is logged and the user
//! only sees a generic message.

use poise::serenity_prelude as serenity;
use thiserror::Error;

/// All errors produced by the ticket desk.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong
        message: String,
    },

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Discord API or gateway error
    #[error("Discord error: {0}")]
    Discord(Box<serenity::Error>),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// JSON (de)serialization of stored data failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing into a string buffer failed
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// A component or modal id could not be decoded
    #[error("Invalid interaction payload: {reason}")]
    InvalidPayload {
        /// Decoder message
        reason: String,
    },

    /// Navigation on a paginator that already timed out
    #[error("This menu has expired. Run the command again.")]
    SessionExpired,

    /// Command was used outside a guild
    #[error("This command can only be used in a server.")]
    NotInGuild,

    /// Command was used outside a ticket channel
    #[error("This command can only be used in a ticket channel.")]
    NotATicket,

    /// The acting user is not a staff member
    #[error("You must be a staff member to {action}.")]
    NotStaff {
        /// What the user tried to do
        action: String,
    },

    /// The acting user is not a configured super user
    #[error("Only super users can {action}.")]
    NotSuperUser {
        /// What the user tried to do
        action: String,
    },

    /// The transfer target is not staff
    #[error("<@{user_id}> is not a staff member.")]
    TargetNotStaff {
        /// Target user id
        user_id: String,
    },

    /// A member lookup came back empty
    #[error("Could not find member `{query}` in this server.")]
    MemberNotFound {
        /// The id, mention, or name that was looked up
        query: String,
    },

    /// Ticket has no claimant
    #[error("This ticket must be claimed first.")]
    NotClaimed,

    /// Ticket already has a claimant
    #[error("This ticket has already been claimed by <@{staff_id}>.")]
    AlreadyClaimed {
        /// Current claimant
        staff_id: String,
    },

    /// Ticket is already closed
    #[error("This ticket is already closed.")]
    TicketClosed,

    /// Ticket is already locked
    #[error("This ticket is already locked.")]
    AlreadyLocked,

    /// Ticket is not locked
    #[error("This ticket is not locked.")]
    NotLocked,

    /// Stored creator id is not a usable snowflake
    #[error("Could not determine a valid ticket creator.")]
    InvalidCreator,

    /// Ticket creator is no longer a guild member
    #[error("Ticket creator is no longer in the server.")]
    CreatorLeft,

    /// Category lookup failed
    #[error("No ticket category named `{name}` exists.")]
    CategoryNotFound {
        /// Requested category name
        name: String,
    },

    /// Category name already used in the guild
    #[error("A ticket category named `{name}` already exists.")]
    CategoryExists {
        /// Duplicate category name
        name: String,
    },

    /// Feedback already recorded for the ticket
    #[error("Feedback has already been submitted for this ticket.")]
    FeedbackExists,

    /// Rating outside 1..=5
    #[error("Rating must be between 1 and 5, got {rating}.")]
    InvalidRating {
        /// Rejected rating
        rating: i32,
    },

    /// Free-text input failed validation
    #[error("{message}")]
    InvalidInput {
        /// What was wrong
        message: String,
    },
}

impl Error {
    /// Whether the error text is meant for the invoking user.
    ///
    /// Internal errors (database, Discord, I/O, ...) are logged and replaced by a
    /// generic message before reaching the user.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            Self::Config { .. }
                | Self::Database(_)
                | Self::Discord(_)
                | Self::Io(_)
                | Self::EnvVar(_)
                | Self::Json(_)
                | Self::Fmt(_)
        )
    }
}

impl From<serenity::Error> for Error {
    fn from(value: serenity::Error) -> Self {
        Self::Discord(Box::new(value))
    }
}

impl From<toml::de::Error> for Error {
    fn from(value: toml::de::Error) -> Self {
        Self::Config {
            message: format!("Failed to parse config.toml: {value}"),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_errors_are_user_facing() {
        assert!(Error::NotATicket.is_user_facing());
        assert!(Error::NotClaimed.is_user_facing());
        assert!(
            Error::NotStaff {
                action: "claim tickets".to_string()
            }
            .is_user_facing()
        );
    }

    #[test]
    fn test_internal_errors_are_hidden() {
        let err = Error::Database(sea_orm::DbErr::Custom("boom".to_string()));
        assert!(!err.is_user_facing());
        let err = Error::Config {
            message: "bad".to_string(),
        };
        assert!(!err.is_user_facing());
    }

    #[test]
    fn test_not_staff_message() {
        let err = Error::NotStaff {
            action: "view the leaderboard".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "You must be a staff member to view the leaderboard."
        );
    }
}

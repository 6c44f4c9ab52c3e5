//! Typed payloads carried in component and modal custom ids.
//!
//! Custom ids are JSON objects tagged by `action`, e.g.
//! `{"action":"page","session":"123","direction":"next"}`.

use crate::core::pagination::Direction;
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};

/// Every interaction the bot attaches to a message or modal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ComponentPayload {
    /// Claim button on the ticket opening message
    Claim,
    /// Unclaim button on the ticket opening message
    Unclaim,
    /// Transfer button; opens the transfer modal
    Transfer,
    /// Close button on the ticket opening message
    Close,
    /// Transfer modal submission
    TransferTicket,
    /// Rating button sent to the ticket creator after close
    Feedback {
        /// Ticket channel id
        ticket: String,
        /// Chosen rating (1-5)
        rating: i32,
    },
    /// Metric select menu of a leaderboard session
    Leaderboard {
        /// Session the menu belongs to
        session: String,
    },
    /// Prev/next buttons of a leaderboard session
    Page {
        /// Session the button belongs to
        session: String,
        /// Which way to move
        direction: Direction,
    },
}

impl ComponentPayload {
    /// Encodes the payload as a custom id.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes a custom id.
    ///
    /// # Errors
    /// [`Error::InvalidPayload`] when the id is not a known payload.
    pub fn parse(custom_id: &str) -> Result<Self> {
        serde_json::from_str(custom_id).map_err(|e| Error::InvalidPayload {
            reason: e.to_string(),
        })
    }

    /// Session id for leaderboard payloads.
    #[must_use]
    pub fn session(&self) -> Option<&str> {
        match self {
            Self::Leaderboard { session } | Self::Page { session, .. } => Some(session),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_wire_format() {
        assert_eq!(
            ComponentPayload::Claim.encode().unwrap(),
            r#"{"action":"claim"}"#
        );
        assert_eq!(
            ComponentPayload::TransferTicket.encode().unwrap(),
            r#"{"action":"transferTicket"}"#
        );
        assert_eq!(
            ComponentPayload::Page {
                session: "42".to_string(),
                direction: Direction::Next,
            }
            .encode()
            .unwrap(),
            r#"{"action":"page","session":"42","direction":"next"}"#
        );
    }

    #[test]
    fn test_parse_feedback() {
        let payload =
            ComponentPayload::parse(r#"{"action":"feedback","ticket":"99","rating":4}"#).unwrap();
        assert_eq!(
            payload,
            ComponentPayload::Feedback {
                ticket: "99".to_string(),
                rating: 4,
            }
        );
        assert_eq!(payload.session(), None);
    }

    #[test]
    fn test_malformed_payload_is_rejected() {
        for raw in [
            "",
            "claim",
            r#"{"action":"explode"}"#,
            r#"{"action":"page","session":"1"}"#,
            r#"{"ticket":"1"}"#,
        ] {
            assert!(
                matches!(
                    ComponentPayload::parse(raw),
                    Err(Error::InvalidPayload { .. })
                ),
                "{raw} should not parse"
            );
        }
    }

    #[test]
    fn test_session_accessor() {
        let payload = ComponentPayload::Leaderboard {
            session: "7".to_string(),
        };
        assert_eq!(payload.session(), Some("7"));
    }
}

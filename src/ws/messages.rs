//! Wire shapes for the realtime gateway.
//!
//! Every server-to-client frame is a single JSON object with a `success`
//! flag. Successful frames carry a human-readable `message` and an
//! optional `data` payload; failures carry an `error` string instead.

use serde::Serialize;

use crate::domain::Session;

/// One server-to-client gateway frame.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayReply {
    /// `true` for acknowledgements and events, `false` for failures.
    pub success: bool,
    /// Human-readable status message on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Error description on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Event payload, present on pairing and establishment frames.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ReplyData>,
}

/// Payload attached to a successful gateway frame.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ReplyData {
    /// Pairing code for the observer to render.
    Pairing {
        /// Display-ready pairing code.
        #[serde(rename = "pairingCode")]
        pairing_code: String,
    },
    /// Session snapshot once the connection is established.
    Established {
        /// The now-active session.
        session: Session,
    },
}

impl GatewayReply {
    /// Plain acknowledgement frame.
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            data: None,
        }
    }

    /// Failure frame.
    #[must_use]
    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            data: None,
        }
    }

    /// Pairing-code frame.
    #[must_use]
    pub fn pairing(code: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some("pairing code issued".to_string()),
            error: None,
            data: Some(ReplyData::Pairing {
                pairing_code: code.into(),
            }),
        }
    }

    /// Connection-established frame.
    #[must_use]
    pub fn established(session: Session) -> Self {
        Self {
            success: true,
            message: Some("connection established".to_string()),
            error: None,
            data: Some(ReplyData::Established { session }),
        }
    }

    /// Serializes the frame to its JSON wire form.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

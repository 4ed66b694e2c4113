//! Protocol-engine boundary.
//!
//! The messaging protocol itself (pairing-code generation, wire
//! encryption, multi-device sync) lives behind [`ProtocolEngine`]. The
//! supervisor only sees an opaque [`ConnectionHandle`] plus a stream of
//! [`EngineEvent`]s, so loosely-typed engine payloads never leak past
//! this module.

pub mod simulated;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use utoipa::ToSchema;

use crate::domain::TenantId;

/// Opaque persisted authentication state for one tenant.
///
/// The gateway never interprets these bytes; it only moves them between
/// the credential store and the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialState(Vec<u8>);

impl CredentialState {
    /// Wraps raw credential bytes.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns an empty state (fresh tenant, pairing required).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns `true` when no credentials have been persisted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Reason attached to a connection close, as classified by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DisconnectReason {
    /// Tenant logged the device out; the session is over for good.
    LoggedOut,
    /// Engine requested a restart of the transport.
    RestartRequired,
    /// Transport closed without further detail.
    ConnectionClosed,
    /// Transport dropped mid-session.
    ConnectionLost,
    /// Persisted credentials were rejected by the server.
    BadSession,
    /// Another connection took over this session.
    ConnectionReplaced,
    /// Multi-device state diverged from the server.
    MultideviceMismatch,
    /// Pairing or connection setup timed out.
    TimedOut,
    /// The engine could not classify the close.
    Unknown,
}

impl DisconnectReason {
    /// Returns `true` for the one reason that permanently retires the
    /// session and purges its credentials.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::LoggedOut)
    }

    /// Returns `true` for reasons the supervisor answers with a fresh
    /// connection attempt for the same tenant.
    #[must_use]
    pub const fn should_reconnect(self) -> bool {
        matches!(
            self,
            Self::RestartRequired | Self::ConnectionClosed | Self::ConnectionLost | Self::Unknown
        )
    }
}

/// Tagged connection-state update emitted by a handle.
#[derive(Debug, Clone)]
pub enum StateUpdate {
    /// The transport is being set up.
    Starting,
    /// A pairing payload was issued; the raw payload still needs
    /// display encoding.
    PairingIssued(String),
    /// The connection is authorized and usable.
    Open,
    /// The connection closed with the given reason.
    Closed(DisconnectReason),
}

/// Delivery status of a message as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Accepted by the engine, not yet on the wire.
    Pending,
    /// Sent to the protocol server.
    Sent,
    /// Delivered to the recipient device.
    Delivered,
    /// Read by the recipient.
    Read,
    /// Delivery failed.
    Failed,
}

/// Result of a send operation.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeliveryResult {
    /// Engine-assigned message identifier.
    pub message_id: String,
    /// Delivery status at the time the send call returned.
    pub status: DeliveryStatus,
    /// Send timestamp.
    pub timestamp: DateTime<Utc>,
}

/// Asynchronous status update for a previously sent message.
#[derive(Debug, Clone)]
pub struct MessageStatusUpdate {
    /// Engine-assigned message identifier.
    pub message_id: String,
    /// New delivery status.
    pub status: DeliveryStatus,
}

/// Kind of message payload to deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Plain text body.
    Text,
    /// Document attachment (payload is a file path or URL).
    File,
    /// Image attachment (payload is a file path or URL).
    Image,
}

/// Event emitted by a live connection.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The engine rotated its credentials; persist the new state.
    CredentialUpdate(CredentialState),
    /// The connection state changed.
    State(StateUpdate),
    /// A previously sent message changed delivery status.
    MessageStatus(MessageStatusUpdate),
}

/// Errors surfaced by the protocol engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Opening a connection failed.
    #[error("connection attempt failed: {0}")]
    Connect(String),
    /// A send operation failed.
    #[error("send failed: {0}")]
    Send(String),
    /// Logout could not be delivered to the server.
    #[error("logout failed: {0}")]
    Logout(String),
}

/// Live, opaque connection for one tenant's protocol session.
///
/// Owned exclusively by the supervisor for the lifetime of one physical
/// connection attempt; destroyed and replaced, never reused, on
/// reconnect.
#[async_trait]
pub trait ConnectionHandle: Send + Sync + fmt::Debug {
    /// Sends a text message.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Send`] if delivery to the protocol server
    /// fails.
    async fn send_text(&self, to: &str, content: &str) -> Result<DeliveryResult, EngineError>;

    /// Sends a document attachment.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Send`] if delivery to the protocol server
    /// fails.
    async fn send_file(&self, to: &str, content: &str) -> Result<DeliveryResult, EngineError>;

    /// Sends an image attachment.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Send`] if delivery to the protocol server
    /// fails.
    async fn send_image(&self, to: &str, content: &str) -> Result<DeliveryResult, EngineError>;

    /// Logs the session out server-side. The handle subsequently emits
    /// `Closed(LoggedOut)`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Logout`] if the request cannot be sent.
    async fn logout(&self) -> Result<(), EngineError>;

    /// Forcibly closes the transport without logging out. Credentials
    /// stay valid for a later reconnect.
    fn force_close(&self);
}

/// A freshly opened connection: the handle plus its event stream.
#[derive(Debug)]
pub struct EngineConnection {
    /// Operations on the live connection.
    pub handle: Arc<dyn ConnectionHandle>,
    /// Ordered stream of events for this connection attempt.
    pub events: mpsc::Receiver<EngineEvent>,
}

/// Factory for per-tenant protocol connections.
#[async_trait]
pub trait ProtocolEngine: Send + Sync + fmt::Debug {
    /// Opens a connection for `tenant` using the given persisted
    /// credentials (empty state starts a fresh pairing flow).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Connect`] if the transport cannot be set
    /// up at all. Failures after setup are reported through the event
    /// stream as `Closed(reason)`.
    async fn open(
        &self,
        tenant: &TenantId,
        credentials: CredentialState,
    ) -> Result<EngineConnection, EngineError>;
}

//! Message delivery log sink.
//!
//! Every successful send is recorded through [`MessageLog`], and later
//! engine-side status updates are applied through the same sink. Both
//! calls are fire-and-forget from the supervisor's perspective: a
//! failing sink is logged and never affects the session state machine.

use async_trait::async_trait;

use crate::domain::TenantId;
use crate::engine::DeliveryStatus;

/// One recorded outbound message.
#[derive(Debug, Clone)]
pub struct MessageRecord {
    /// Recipient address.
    pub to: String,
    /// Engine-assigned message identifier.
    pub message_id: String,
    /// Message content or attachment reference.
    pub content: String,
    /// Delivery status at record time.
    pub status: DeliveryStatus,
    /// Tenant that requested the send.
    pub requester: TenantId,
}

/// Errors surfaced by a message log sink.
#[derive(Debug, thiserror::Error)]
#[error("message log: {0}")]
pub struct MessageLogError(pub String);

/// Sink for outbound-message records and delivery-status updates.
#[async_trait]
pub trait MessageLog: Send + Sync + std::fmt::Debug {
    /// Records a sent message.
    ///
    /// # Errors
    ///
    /// Returns [`MessageLogError`] if the sink rejects the record; the
    /// caller logs and continues.
    async fn record(&self, record: MessageRecord) -> Result<(), MessageLogError>;

    /// Applies a delivery-status update to a previously recorded
    /// message.
    ///
    /// # Errors
    ///
    /// Returns [`MessageLogError`] if the sink rejects the update; the
    /// caller logs and continues.
    async fn update_status(
        &self,
        message_id: &str,
        status: DeliveryStatus,
    ) -> Result<(), MessageLogError>;
}

/// Message log that emits structured tracing events instead of
/// persisting anything. Stands in until a durable sink is wired up by
/// the embedding system.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMessageLog;

#[async_trait]
impl MessageLog for TracingMessageLog {
    async fn record(&self, record: MessageRecord) -> Result<(), MessageLogError> {
        tracing::info!(
            to = %record.to,
            message_id = %record.message_id,
            status = ?record.status,
            requester = %record.requester,
            "message recorded"
        );
        Ok(())
    }

    async fn update_status(
        &self,
        message_id: &str,
        status: DeliveryStatus,
    ) -> Result<(), MessageLogError> {
        tracing::info!(%message_id, ?status, "message status updated");
        Ok(())
    }
}

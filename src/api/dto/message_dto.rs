//! Message-sending DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::TenantId;
use crate::engine::{DeliveryResult, MessageKind};

/// Request body for `POST /messages`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    /// Tenant whose connection carries the message.
    #[schema(value_type = String)]
    pub tenant: TenantId,
    /// Recipient address.
    pub to: String,
    /// Payload kind.
    pub kind: MessageKind,
    /// Message text, or a file/image reference for attachment kinds.
    pub payload: String,
}

/// Response body for `POST /messages`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SendMessageResponse {
    /// Delivery result reported by the engine.
    pub data: DeliveryResult,
}

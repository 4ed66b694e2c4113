//! Outbound message handler.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{SendMessageRequest, SendMessageResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, GatewayError};

/// `POST /messages` — Send a message through a tenant's live
/// connection.
///
/// # Errors
///
/// Returns [`GatewayError::NoActiveConnection`] when the tenant has no
/// live connection and [`GatewayError::Engine`] when the engine rejects
/// the send.
#[utoipa::path(
    post,
    path = "/api/v1/messages",
    tag = "Messages",
    summary = "Send a message",
    description = "Delivers a text, file, or image payload through the tenant's live protocol connection. Fails with 422 when the tenant is not connected.",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Message accepted by the engine", body = SendMessageResponse),
        (status = 422, description = "Tenant has no live connection", body = ErrorResponse),
        (status = 502, description = "Engine rejected the send", body = ErrorResponse),
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    if req.to.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "recipient must not be empty".to_string(),
        ));
    }

    let data = state
        .supervisor
        .send_message(&req.tenant, &req.to, req.kind, &req.payload)
        .await?;

    Ok(Json(SendMessageResponse { data }))
}

/// Message routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/messages", post(send_message))
}

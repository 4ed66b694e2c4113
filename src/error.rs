//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each
//! variant maps to a specific HTTP status code and structured JSON error
//! response. Protocol-engine close reasons never surface here; they are
//! classified and handled inside the connection supervisor.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::domain::TenantId;
use crate::engine::EngineError;

/// Structured JSON error response body.
///
/// All REST error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2002,
///     "message": "session already active for tenant acme",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`GatewayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                |
/// |-----------|-------------------|----------------------------|
/// | 1000–1999 | Validation        | 400 Bad Request            |
/// | 2000–2999 | Session state     | 404 / 409 / 422            |
/// | 3000–3999 | Server / engine   | 500 / 502                  |
/// | 4000–4999 | Authentication    | 401 Unauthorized           |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Tenant already has an active session; no second connection is
    /// created. Recoverable and caller-visible, no state change.
    #[error("session already active for tenant {0}")]
    SessionAlreadyActive(TenantId),

    /// No session exists for the tenant.
    #[error("session not found for tenant {0}")]
    SessionNotFound(TenantId),

    /// Send attempted while the tenant has no live connection handle.
    #[error("no active connection for tenant {0}")]
    NoActiveConnection(TenantId),

    /// Credential-store or protocol-engine failure during session
    /// initialization. Any newly created registry entry is rolled back.
    #[error("session creation failed: {0}")]
    SessionCreation(String),

    /// Error propagated from the protocol engine outside initialization
    /// (typically a failed send).
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// Observer token missing, invalid, or expired.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Token signature verified but the tenant claim is absent.
    #[error("token carries no tenant claim")]
    MissingTenantClaim,

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::SessionNotFound(_) => 2001,
            Self::SessionAlreadyActive(_) => 2002,
            Self::NoActiveConnection(_) => 2003,
            Self::Internal(_) => 3000,
            Self::SessionCreation(_) => 3002,
            Self::Engine(_) => 3003,
            Self::Unauthorized(_) => 4001,
            Self::MissingTenantClaim => 4002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::SessionAlreadyActive(_) => StatusCode::CONFLICT,
            Self::NoActiveConnection(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::SessionCreation(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Engine(_) => StatusCode::BAD_GATEWAY,
            Self::Unauthorized(_) | Self::MissingTenantClaim => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

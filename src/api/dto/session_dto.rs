//! Session DTOs for list and detail responses.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::Session;

/// Response body for `GET /sessions`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionListResponse {
    /// All known sessions, active or not.
    pub data: Vec<Session>,
    /// Number of sessions in `data`.
    pub count: usize,
}

/// Response body for single-session endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    /// The requested session.
    pub data: Session,
}

/// Response body for `DELETE /sessions/{tenant}` and
/// `POST /sessions/{tenant}/deactivate`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionActionResponse {
    /// Tenant the action applied to.
    pub tenant: String,
    /// Human-readable outcome.
    pub message: String,
}

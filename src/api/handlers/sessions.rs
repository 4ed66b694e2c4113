//! Session administration handlers: list, get, deactivate, delete.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{SessionActionResponse, SessionListResponse, SessionResponse};
use crate::app_state::AppState;
use crate::domain::TenantId;
use crate::error::{ErrorResponse, GatewayError};

/// `GET /sessions` — List all known sessions.
#[utoipa::path(
    get,
    path = "/api/v1/sessions",
    tag = "Sessions",
    summary = "List sessions",
    description = "Returns every known session with its activity flag, whether or not a live connection currently exists.",
    responses(
        (status = 200, description = "Session list", body = SessionListResponse),
    )
)]
pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let data = state.supervisor.list_sessions().await;
    let count = data.len();
    Json(SessionListResponse { data, count })
}

/// `GET /sessions/{tenant}` — Get one session.
///
/// # Errors
///
/// Returns [`GatewayError::SessionNotFound`] when no session exists for
/// the tenant.
#[utoipa::path(
    get,
    path = "/api/v1/sessions/{tenant}",
    tag = "Sessions",
    summary = "Get a session",
    params(("tenant" = String, Path, description = "Tenant identifier")),
    responses(
        (status = 200, description = "Session detail", body = SessionResponse),
        (status = 404, description = "No session for this tenant", body = ErrorResponse),
    )
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let tenant = TenantId::new(tenant);
    let session = state
        .supervisor
        .get_session(&tenant)
        .await
        .ok_or(GatewayError::SessionNotFound(tenant))?;
    Ok(Json(SessionResponse { data: session }))
}

/// `DELETE /sessions/{tenant}` — Log the tenant out and purge its
/// session state, including persisted credentials.
///
/// # Errors
///
/// Returns [`GatewayError::SessionNotFound`] when no session exists for
/// the tenant.
#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{tenant}",
    tag = "Sessions",
    summary = "Delete a session",
    description = "Administrative logout: closes the connection, purges persisted credentials, and removes the session. The tenant must pair again to reconnect.",
    params(("tenant" = String, Path, description = "Tenant identifier")),
    responses(
        (status = 200, description = "Session deleted", body = SessionActionResponse),
        (status = 404, description = "No session for this tenant", body = ErrorResponse),
    )
)]
pub async fn delete_session(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let tenant = TenantId::new(tenant);
    state.supervisor.delete_session(&tenant).await?;
    Ok(Json(SessionActionResponse {
        tenant: tenant.to_string(),
        message: "session deleted".to_string(),
    }))
}

/// `POST /sessions/{tenant}/deactivate` — Force-close the tenant's
/// transport without logging out. Credentials are kept; a no-op for
/// open sessions and unknown tenants.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{tenant}/deactivate",
    tag = "Sessions",
    summary = "Deactivate a session",
    description = "Closes an in-flight pairing connection without logging the tenant out. Sessions that already reached open are left untouched.",
    params(("tenant" = String, Path, description = "Tenant identifier")),
    responses(
        (status = 200, description = "Deactivation applied (or no-op)", body = SessionActionResponse),
    )
)]
pub async fn deactivate_session(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
) -> impl IntoResponse {
    let tenant = TenantId::new(tenant);
    state.supervisor.deactivate_session(&tenant).await;
    Json(SessionActionResponse {
        tenant: tenant.to_string(),
        message: "session deactivated".to_string(),
    })
}

/// Session routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(list_sessions))
        .route("/sessions/{tenant}", get(get_session).delete(delete_session))
        .route("/sessions/{tenant}/deactivate", post(deactivate_session))
}

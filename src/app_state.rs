//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::supervisor::ConnectionSupervisor;
use crate::ws::ObserverBindings;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Connection supervisor for all session operations.
    pub supervisor: Arc<ConnectionSupervisor>,
    /// Tenant-to-observer binding table for the realtime gateway.
    pub bindings: Arc<ObserverBindings>,
    /// Observer token verifier.
    pub verifier: TokenVerifier,
}

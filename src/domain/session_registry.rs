//! Authoritative tenant → session mapping.
//!
//! [`SessionRegistry`] is the single source of truth for "is this
//! tenant's session usable right now". It holds no retry logic; the
//! connection supervisor is the only caller of its mutation paths.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::{Session, TenantId};
use crate::error::GatewayError;

/// Central store for per-tenant session records.
///
/// Backed by a `RwLock<HashMap<...>>`. All operations take the lock for
/// the duration of the in-memory mutation only; no I/O happens under it.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<TenantId, Session>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the start of an initialization attempt for `tenant`.
    ///
    /// Inserts an inactive session if none exists. Returns `true` when a
    /// new record was created (the caller rolls it back if handle
    /// creation fails) and `false` when an inactive record already
    /// existed and initialization may proceed over it.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionAlreadyActive`] if the tenant
    /// already has an active session. No state is changed in that case.
    pub async fn initialize(&self, tenant: &TenantId) -> Result<bool, GatewayError> {
        let mut map = self.sessions.write().await;
        match map.get(tenant) {
            Some(session) if session.active => {
                Err(GatewayError::SessionAlreadyActive(tenant.clone()))
            }
            Some(_) => Ok(false),
            None => {
                map.insert(tenant.clone(), Session::new(tenant.clone()));
                Ok(true)
            }
        }
    }

    /// Returns the session for `tenant`, if any.
    pub async fn get(&self, tenant: &TenantId) -> Option<Session> {
        self.sessions.read().await.get(tenant).cloned()
    }

    /// Returns all sessions.
    pub async fn list(&self) -> Vec<Session> {
        self.sessions.read().await.values().cloned().collect()
    }

    /// Sets the active flag for `tenant`.
    ///
    /// When activating a tenant that has no record (a restore race), the
    /// record is created on the spot. Deactivating an unknown tenant is
    /// a no-op. Returns `true` if a record was written.
    pub async fn set_active(&self, tenant: &TenantId, active: bool) -> bool {
        let mut map = self.sessions.write().await;
        if let Some(session) = map.get_mut(tenant) {
            session.active = active;
            return true;
        }
        if active {
            map.insert(
                tenant.clone(),
                Session {
                    name: tenant.clone(),
                    active: true,
                },
            );
            return true;
        }
        false
    }

    /// Removes the session for `tenant`. Returns `true` if one existed.
    pub async fn remove(&self, tenant: &TenantId) -> bool {
        self.sessions.write().await.remove(tenant).is_some()
    }

    /// Returns the number of known sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` if no sessions are known.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

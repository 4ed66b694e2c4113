//! Ephemeral events emitted while a tenant's connection is negotiated.
//!
//! Both event types are broadcast through the [`super::EventBus`] and
//! consumed at most once by the tenant's currently bound observer. They
//! are never persisted; publishing with no interested subscriber drops
//! the event.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Session, TenantId};

/// Emitted when the protocol engine issues a pairing payload for a
/// tenant whose connection is not yet authorized.
#[derive(Debug, Clone, Serialize)]
pub struct PairingEvent {
    /// Tenant the pairing code belongs to.
    pub tenant: TenantId,
    /// Display-ready pairing code (already encoded).
    pub code: String,
    /// Issuance timestamp.
    pub timestamp: DateTime<Utc>,
}

impl PairingEvent {
    /// Creates a pairing event stamped with the current time.
    #[must_use]
    pub fn new(tenant: TenantId, code: String) -> Self {
        Self {
            tenant,
            code,
            timestamp: Utc::now(),
        }
    }
}

/// Emitted when a tenant's connection reaches the open state.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionEstablishedEvent {
    /// Tenant whose connection opened.
    pub tenant: TenantId,
    /// Session snapshot at the moment the connection opened
    /// (`active` is always `true` here).
    pub session: Session,
    /// Establishment timestamp.
    pub timestamp: DateTime<Utc>,
}

impl ConnectionEstablishedEvent {
    /// Creates a connection-established event for an open session.
    #[must_use]
    pub fn new(tenant: TenantId) -> Self {
        let session = Session {
            name: tenant.clone(),
            active: true,
        };
        Self {
            tenant,
            session,
            timestamp: Utc::now(),
        }
    }
}

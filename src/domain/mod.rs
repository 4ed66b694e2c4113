//! Domain layer: core types, session registry, and event system.
//!
//! This module contains the server-side domain model including tenant
//! identity, session records, the event bus for broadcasting pairing
//! and connection events, and the session registry that is the single
//! source of truth for per-tenant session state.

pub mod event_bus;
pub mod session;
pub mod session_event;
pub mod session_registry;
pub mod tenant_id;

pub use event_bus::EventBus;
pub use session::Session;
pub use session_event::{ConnectionEstablishedEvent, PairingEvent};
pub use session_registry::SessionRegistry;
pub use tenant_id::TenantId;

//! Supervision layer: per-tenant connection lifecycle orchestration.
//!
//! [`ConnectionSupervisor`] owns one protocol connection per tenant,
//! drives its state machine from engine events, and decides between
//! retry and termination on every disconnect.

pub mod connection_supervisor;

pub use connection_supervisor::{ConnectionSupervisor, ReconnectPolicy};

//! Realtime observer gateway.
//!
//! Observers connect over WebSocket to drive a tenant through pairing:
//! authenticate, bind, receive the pairing code, and learn when the
//! connection is established. See [`connection`] for the full protocol.

pub mod bindings;
pub mod connection;
pub mod handler;
pub mod messages;

pub use bindings::ObserverBindings;
pub use handler::ws_handler;
pub use messages::GatewayReply;

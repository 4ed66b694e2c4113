//! # pairlink-gateway
//!
//! Session orchestration layer for a multi-tenant messaging gateway.
//!
//! Each tenant owns at most one protocol connection, driven through a
//! pairing handshake by a WebSocket observer and supervised across
//! disconnects. The messaging protocol itself lives behind the
//! [`engine::ProtocolEngine`] boundary — this service is a coordination
//! layer.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── Realtime Gateway (ws/)
//!     │
//!     ├── ConnectionSupervisor (supervisor/)
//!     ├── EventBus + SessionRegistry (domain/)
//!     │
//!     ├── ProtocolEngine (engine/)
//!     └── CredentialStore (store/)
//! ```

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod msglog;
pub mod pairing;
pub mod store;
pub mod supervisor;
pub mod ws;

//! Pairing payload encoding.
//!
//! The protocol engine emits raw pairing payloads; before they reach an
//! observer they are turned into a display-ready form by a
//! [`PairingEncoder`]. The default encoder base64-encodes the payload so
//! clients can embed it directly in a QR rendering data URL.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// Turns a raw pairing payload into its display-ready form.
pub trait PairingEncoder: Send + Sync + std::fmt::Debug {
    /// Encodes `raw` for client display.
    fn encode(&self, raw: &str) -> String;
}

/// Base64 encoder for pairing payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64PairingEncoder;

impl PairingEncoder for Base64PairingEncoder {
    fn encode(&self, raw: &str) -> String {
        STANDARD.encode(raw.as_bytes())
    }
}

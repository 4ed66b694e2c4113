//! Broadcast channels for session events.
//!
//! [`EventBus`] wraps two independent [`tokio::sync::broadcast`] streams:
//! one for pairing codes and one for connection establishment. Every
//! bound observer subscribes to both and filters by tenant on receipt.

use tokio::sync::broadcast;

use super::{ConnectionEstablishedEvent, PairingEvent};

/// Broadcast bus for pairing and connection-established events.
///
/// Backed by `tokio::broadcast` channels with a configurable capacity.
/// There is no persistence and no backpressure: an event published with
/// zero subscribers is dropped, not queued, and is never redelivered to
/// observers that bind later.
#[derive(Debug, Clone)]
pub struct EventBus {
    pairing: broadcast::Sender<PairingEvent>,
    established: broadcast::Sender<ConnectionEstablishedEvent>,
}

impl EventBus {
    /// Creates a new `EventBus` with the given per-stream capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (pairing, _) = broadcast::channel(capacity);
        let (established, _) = broadcast::channel(capacity);
        Self {
            pairing,
            established,
        }
    }

    /// Publishes a pairing event. Returns the number of receivers that
    /// got it; zero means the event was dropped.
    pub fn publish_pairing(&self, event: PairingEvent) -> usize {
        self.pairing.send(event).unwrap_or(0)
    }

    /// Publishes a connection-established event. Returns the number of
    /// receivers that got it; zero means the event was dropped.
    pub fn publish_established(&self, event: ConnectionEstablishedEvent) -> usize {
        self.established.send(event).unwrap_or(0)
    }

    /// Creates a receiver for future pairing events.
    #[must_use]
    pub fn subscribe_pairing(&self) -> broadcast::Receiver<PairingEvent> {
        self.pairing.subscribe()
    }

    /// Creates a receiver for future connection-established events.
    #[must_use]
    pub fn subscribe_established(&self) -> broadcast::Receiver<ConnectionEstablishedEvent> {
        self.established.subscribe()
    }

    /// Returns the number of live pairing-stream receivers.
    #[must_use]
    pub fn pairing_receiver_count(&self) -> usize {
        self.pairing.receiver_count()
    }
}

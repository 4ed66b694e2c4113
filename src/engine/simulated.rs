//! In-process protocol engine used for local runs and end-to-end tests.
//!
//! [`SimulatedEngine`] reproduces the observable behavior of a real
//! engine: a fresh tenant gets a pairing payload followed by a
//! credential update and an open; a tenant with persisted credentials
//! opens directly. Logout and force-close emit the matching close
//! reasons through the event stream.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;

use super::{
    ConnectionHandle, CredentialState, DeliveryResult, DeliveryStatus, DisconnectReason,
    EngineConnection, EngineError, EngineEvent, ProtocolEngine, StateUpdate,
};
use crate::domain::TenantId;

/// Simulated protocol engine.
#[derive(Debug, Clone)]
pub struct SimulatedEngine {
    /// Delay between issuing the pairing payload and reporting open,
    /// imitating the time a tenant takes to scan the code.
    pairing_delay: Duration,
}

impl SimulatedEngine {
    /// Creates an engine with the given simulated pairing delay.
    #[must_use]
    pub fn new(pairing_delay: Duration) -> Self {
        Self { pairing_delay }
    }
}

impl Default for SimulatedEngine {
    fn default() -> Self {
        Self::new(Duration::from_millis(200))
    }
}

#[async_trait]
impl ProtocolEngine for SimulatedEngine {
    async fn open(
        &self,
        tenant: &TenantId,
        credentials: CredentialState,
    ) -> Result<EngineConnection, EngineError> {
        let (tx, rx) = mpsc::channel(32);
        let handle = Arc::new(SimulatedHandle { events: tx.clone() });

        let pairing_delay = self.pairing_delay;
        let tenant = tenant.clone();
        tokio::spawn(async move {
            let _ = tx.send(EngineEvent::State(StateUpdate::Starting)).await;

            if credentials.is_empty() {
                let payload = uuid::Uuid::new_v4().simple().to_string();
                let _ = tx
                    .send(EngineEvent::State(StateUpdate::PairingIssued(payload)))
                    .await;
                tokio::time::sleep(pairing_delay).await;
                let issued = CredentialState::new(
                    format!("simulated-creds:{tenant}").into_bytes(),
                );
                let _ = tx.send(EngineEvent::CredentialUpdate(issued)).await;
            }

            let _ = tx.send(EngineEvent::State(StateUpdate::Open)).await;
        });

        Ok(EngineConnection { handle, events: rx })
    }
}

/// Handle side of the simulated engine.
#[derive(Debug)]
struct SimulatedHandle {
    events: mpsc::Sender<EngineEvent>,
}

impl SimulatedHandle {
    fn deliver(&self) -> DeliveryResult {
        DeliveryResult {
            message_id: uuid::Uuid::new_v4().to_string(),
            status: DeliveryStatus::Sent,
            timestamp: Utc::now(),
        }
    }
}

#[async_trait]
impl ConnectionHandle for SimulatedHandle {
    async fn send_text(&self, _to: &str, _content: &str) -> Result<DeliveryResult, EngineError> {
        Ok(self.deliver())
    }

    async fn send_file(&self, _to: &str, _content: &str) -> Result<DeliveryResult, EngineError> {
        Ok(self.deliver())
    }

    async fn send_image(&self, _to: &str, _content: &str) -> Result<DeliveryResult, EngineError> {
        Ok(self.deliver())
    }

    async fn logout(&self) -> Result<(), EngineError> {
        self.events
            .send(EngineEvent::State(StateUpdate::Closed(
                DisconnectReason::LoggedOut,
            )))
            .await
            .map_err(|e| EngineError::Logout(e.to_string()))
    }

    fn force_close(&self) {
        let _ = self.events.try_send(EngineEvent::State(StateUpdate::Closed(
            DisconnectReason::ConnectionClosed,
        )));
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    async fn next_state(rx: &mut mpsc::Receiver<EngineEvent>) -> Option<StateUpdate> {
        loop {
            match rx.recv().await? {
                EngineEvent::State(update) => return Some(update),
                _ => continue,
            }
        }
    }

    #[tokio::test]
    async fn fresh_credentials_run_pairing_flow() {
        let engine = SimulatedEngine::new(Duration::from_millis(1));
        let conn = engine
            .open(&TenantId::new("t1"), CredentialState::empty())
            .await;
        let Ok(mut conn) = conn else {
            panic!("open failed");
        };

        assert!(matches!(
            next_state(&mut conn.events).await,
            Some(StateUpdate::Starting)
        ));
        assert!(matches!(
            next_state(&mut conn.events).await,
            Some(StateUpdate::PairingIssued(_))
        ));
        assert!(matches!(
            next_state(&mut conn.events).await,
            Some(StateUpdate::Open)
        ));
    }

    #[tokio::test]
    async fn restored_credentials_skip_pairing() {
        let engine = SimulatedEngine::new(Duration::from_millis(1));
        let creds = CredentialState::new(b"persisted".to_vec());
        let conn = engine.open(&TenantId::new("t1"), creds).await;
        let Ok(mut conn) = conn else {
            panic!("open failed");
        };

        assert!(matches!(
            next_state(&mut conn.events).await,
            Some(StateUpdate::Starting)
        ));
        assert!(matches!(
            next_state(&mut conn.events).await,
            Some(StateUpdate::Open)
        ));
    }

    #[tokio::test]
    async fn logout_emits_terminal_close() {
        let engine = SimulatedEngine::new(Duration::from_millis(1));
        let conn = engine
            .open(&TenantId::new("t1"), CredentialState::new(b"c".to_vec()))
            .await;
        let Ok(mut conn) = conn else {
            panic!("open failed");
        };

        // Drain Starting + Open first
        let _ = next_state(&mut conn.events).await;
        let _ = next_state(&mut conn.events).await;

        assert!(conn.handle.logout().await.is_ok());
        assert!(matches!(
            next_state(&mut conn.events).await,
            Some(StateUpdate::Closed(DisconnectReason::LoggedOut))
        ));
    }
}

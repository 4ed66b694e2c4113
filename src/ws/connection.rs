//! Realtime gateway connection state machine.
//!
//! Protocol, per socket:
//! 1. The first text frame must be a bearer token. Verification failure
//!    sends one error frame and closes.
//! 2. The observer is bound to its tenant (evicting any previous
//!    observer) and acknowledged.
//! 3. A session initialization is kicked off; an already-active session
//!    is acknowledged rather than treated as a failure.
//! 4. Pairing and establishment events for the tenant are relayed while
//!    the binding is held; after the establishment frame the server
//!    closes the socket.
//!
//! On any exit the observer unbinds (only if it still holds the
//! binding), and a connection that never reached open is torn down so
//! the next observer starts a fresh pairing flow.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::{broadcast, mpsc};

use super::messages::GatewayReply;
use crate::app_state::AppState;
use crate::domain::TenantId;
use crate::error::GatewayError;

/// Runs one observer socket from token handshake to teardown.
pub async fn run_connection(socket: WebSocket, state: AppState) {
    let (ws_tx, ws_rx) = socket.split();
    drive_socket(ws_tx, ws_rx, state).await;
}

/// Socket loop, generic over the transport halves so tests can drive it
/// with in-process channels.
async fn drive_socket<Tx, Rx>(mut ws_tx: Tx, mut ws_rx: Rx, state: AppState)
where
    Tx: Sink<Message> + Unpin,
    Rx: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    // First frame: bearer token.
    let token = loop {
        match ws_rx.next().await {
            Some(Ok(Message::Text(text))) => break text.to_string(),
            Some(Ok(Message::Close(_))) | None => return,
            Some(Ok(_)) => {}
            Some(Err(_)) => return,
        }
    };

    let observer = match state.verifier.verify(&token) {
        Ok(observer) => observer,
        Err(e) => {
            let _ = ws_tx
                .send(Message::text(GatewayReply::error(e.to_string()).to_json()))
                .await;
            let _ = ws_tx.send(Message::Close(None)).await;
            return;
        }
    };
    let tenant = observer.tenant.clone();
    if !observer.tenant_active {
        tracing::warn!(%tenant, "issuer marks tenant inactive; observing anyway");
    }

    // Subscribe before initializing so no event is missed.
    let mut pairing_rx = state.supervisor.event_bus().subscribe_pairing();
    let mut established_rx = state.supervisor.event_bus().subscribe_established();

    let (evict_tx, mut evict_rx) = mpsc::channel(1);
    let observer_id = state.bindings.bind(&tenant, evict_tx).await;

    if ws_tx
        .send(Message::text(GatewayReply::ok("authenticated").to_json()))
        .await
        .is_err()
    {
        teardown(&state, &tenant, observer_id).await;
        return;
    }

    match state.supervisor.initialize_session(&tenant).await {
        Ok(()) => {}
        Err(GatewayError::SessionAlreadyActive(_)) => {
            // Benign: the observer attaches to the in-flight session.
            let _ = ws_tx
                .send(Message::text(
                    GatewayReply::ok("session already active").to_json(),
                ))
                .await;
        }
        Err(e) => {
            let _ = ws_tx
                .send(Message::text(GatewayReply::error(e.to_string()).to_json()))
                .await;
            let _ = ws_tx.send(Message::Close(None)).await;
            teardown(&state, &tenant, observer_id).await;
            return;
        }
    }

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // No further client commands exist; ignore.
                    Some(Ok(_)) => {}
                }
            }
            _ = evict_rx.recv() => {
                let _ = ws_tx
                    .send(Message::text(
                        GatewayReply::error("replaced by a newer observer").to_json(),
                    ))
                    .await;
                let _ = ws_tx.send(Message::Close(None)).await;
                break;
            }
            event = pairing_rx.recv() => {
                match event {
                    Ok(event) => {
                        if event.tenant == tenant
                            && state.bindings.is_current(&tenant, observer_id).await
                            && ws_tx
                                .send(Message::text(GatewayReply::pairing(event.code).to_json()))
                                .await
                                .is_err()
                        {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(%tenant, lagged = n, "observer lagged behind pairing stream");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            event = established_rx.recv() => {
                match event {
                    Ok(event) => {
                        if event.tenant == tenant
                            && state.bindings.is_current(&tenant, observer_id).await
                        {
                            let _ = ws_tx
                                .send(Message::text(
                                    GatewayReply::established(event.session).to_json(),
                                ))
                                .await;
                            // The observer's job is done once the session
                            // is established.
                            let _ = ws_tx.send(Message::Close(None)).await;
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(%tenant, lagged = n, "observer lagged behind establishment stream");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    teardown(&state, &tenant, observer_id).await;
}

/// Unbinds the observer and, if it still held the binding, tears down a
/// connection that never reached open so the tenant's next observer
/// starts cleanly.
async fn teardown(state: &AppState, tenant: &TenantId, observer_id: uuid::Uuid) {
    let held_binding = state.bindings.unbind_if_current(tenant, observer_id).await;
    if held_binding {
        // No-op for open sessions; only an unfinished pairing flow is
        // torn down here.
        state.supervisor.deactivate_session(tenant).await;
    }
    tracing::debug!(%tenant, held_binding, "observer socket closed");
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use futures_util::stream;
    use jsonwebtoken::{EncodingKey, Header};

    use super::*;
    use crate::auth::{AuthClaims, TokenVerifier};
    use crate::domain::{EventBus, PairingEvent, SessionRegistry};
    use crate::engine::simulated::SimulatedEngine;
    use crate::msglog::TracingMessageLog;
    use crate::pairing::Base64PairingEncoder;
    use crate::store::FsCredentialStore;
    use crate::supervisor::{ConnectionSupervisor, ReconnectPolicy};
    use crate::ws::ObserverBindings;

    const SECRET: &str = "test-secret";

    fn sign_token(tenant: &str) -> String {
        let claims = AuthClaims {
            tenant_id: Some(tenant.to_string()),
            is_tenant_active: true,
            exp: (chrono::Utc::now().timestamp() as u64).saturating_add(3600),
        };
        let key = EncodingKey::from_secret(SECRET.as_bytes());
        let Ok(token) = jsonwebtoken::encode(&Header::default(), &claims, &key) else {
            panic!("token encoding failed");
        };
        token
    }

    fn test_state(credentials_dir: &std::path::Path, pairing_delay: Duration) -> AppState {
        let supervisor = Arc::new(ConnectionSupervisor::new(
            Arc::new(SessionRegistry::new()),
            EventBus::new(64),
            Arc::new(FsCredentialStore::new(credentials_dir)),
            Arc::new(SimulatedEngine::new(pairing_delay)),
            Arc::new(Base64PairingEncoder),
            Arc::new(TracingMessageLog),
            ReconnectPolicy::default(),
        ));
        AppState {
            supervisor,
            bindings: Arc::new(ObserverBindings::new()),
            verifier: TokenVerifier::new(SECRET),
        }
    }

    /// Spawns the socket loop over in-process halves: the given frames
    /// are the client's input (the stream then stays open), and every
    /// server frame lands on the returned receiver.
    fn connect(state: AppState, frames: Vec<Message>) -> mpsc::Receiver<Message> {
        let input = stream::iter(frames.into_iter().map(Ok)).chain(stream::pending());
        let (out_tx, out_rx) = mpsc::channel::<Message>(32);
        let output = Box::pin(futures_util::sink::unfold(
            out_tx,
            |tx, msg: Message| async move {
                let _ = tx.send(msg).await;
                Ok::<_, axum::Error>(tx)
            },
        ));
        tokio::spawn(async move {
            drive_socket(output, Box::pin(input), state).await;
        });
        out_rx
    }

    async fn next_frame(rx: &mut mpsc::Receiver<Message>) -> Message {
        let frame = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        let Ok(Some(frame)) = frame else {
            panic!("expected a server frame");
        };
        frame
    }

    async fn next_json(rx: &mut mpsc::Receiver<Message>) -> serde_json::Value {
        loop {
            if let Message::Text(text) = next_frame(rx).await {
                let Ok(value) = serde_json::from_str(&text) else {
                    panic!("frame is not JSON");
                };
                return value;
            }
        }
    }

    #[tokio::test]
    async fn full_pairing_flow_end_to_end() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir failed");
        };
        let state = test_state(dir.path(), Duration::from_millis(5));
        let mut rx = connect(state.clone(), vec![Message::text(sign_token("t1"))]);

        let ack = next_json(&mut rx).await;
        assert_eq!(ack["success"], true);
        assert_eq!(ack["message"], "authenticated");

        let pairing = next_json(&mut rx).await;
        assert_eq!(pairing["success"], true);
        assert!(pairing["data"]["pairingCode"].is_string());

        let established = next_json(&mut rx).await;
        assert_eq!(
            established["data"]["session"],
            serde_json::json!({ "name": "t1", "active": true })
        );

        // The gateway closes the observer after establishment.
        assert!(matches!(next_frame(&mut rx).await, Message::Close(_)));

        let session = state.supervisor.get_session(&TenantId::new("t1")).await;
        assert!(session.is_some_and(|s| s.active));
    }

    #[tokio::test]
    async fn invalid_token_gets_error_then_close() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir failed");
        };
        let state = test_state(dir.path(), Duration::from_millis(5));
        let mut rx = connect(state.clone(), vec![Message::text("not-a-token")]);

        let reply = next_json(&mut rx).await;
        assert_eq!(reply["success"], false);
        assert!(reply["error"].is_string());
        assert!(matches!(next_frame(&mut rx).await, Message::Close(_)));

        // Nothing was initialized.
        assert!(state.supervisor.list_sessions().await.is_empty());
    }

    #[tokio::test]
    async fn pairing_events_are_filtered_by_tenant() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir failed");
        };
        // Long pairing delay keeps the session in the pairing phase for
        // the whole test.
        let state = test_state(dir.path(), Duration::from_secs(30));
        let mut rx = connect(state.clone(), vec![Message::text(sign_token("t1"))]);

        let ack = next_json(&mut rx).await;
        assert_eq!(ack["message"], "authenticated");

        // The engine's own pairing code arrives first.
        let own = next_json(&mut rx).await;
        assert!(own["data"]["pairingCode"].is_string());

        // A foreign event followed by one for our tenant: only the
        // latter is relayed (broadcast order is preserved).
        let bus = state.supervisor.event_bus();
        let _ = bus.publish_pairing(PairingEvent::new(TenantId::new("other"), "ZZZ".into()));
        let _ = bus.publish_pairing(PairingEvent::new(TenantId::new("t1"), "QUJD".into()));

        let relayed = next_json(&mut rx).await;
        assert_eq!(relayed["data"]["pairingCode"], "QUJD");
    }
}

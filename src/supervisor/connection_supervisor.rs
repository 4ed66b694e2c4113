//! Per-tenant connection state machine and retry policy.
//!
//! The supervisor owns exactly one connection seat per tenant. Each seat
//! runs a dedicated task that consumes the engine's event stream and
//! walks the session through `STARTING → (PAIRING)* → OPEN →
//! CLOSED(reason)`. A close either loops back into a fresh connection
//! attempt (transient reasons, with capped exponential backoff) or
//! retires the session (logout purges credentials; non-retryable reasons
//! leave it inactive).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, mpsc, watch};

use crate::domain::{
    ConnectionEstablishedEvent, EventBus, PairingEvent, Session, SessionRegistry, TenantId,
};
use crate::engine::{
    ConnectionHandle, DeliveryResult, EngineEvent, MessageKind, ProtocolEngine, StateUpdate,
};
use crate::error::GatewayError;
use crate::msglog::{MessageLog, MessageRecord};
use crate::pairing::PairingEncoder;
use crate::store::CredentialStore;

/// Backoff policy for reconnecting after transient disconnects.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnect attempt; doubles per attempt.
    pub base_delay: Duration,
    /// Attempts before the tenant is left inactive.
    pub max_attempts: u32,
}

impl ReconnectPolicy {
    /// Returns the delay before the given attempt (1-based), capped at
    /// one minute.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        const CAP: Duration = Duration::from_secs(60);
        let exp = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1_u32 << exp);
        delay.min(CAP)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            max_attempts: 10,
        }
    }
}

/// One tenant's connection seat.
///
/// `handle` is `None` only between seat reservation and the first
/// successful engine open, and during a reconnect gap.
#[derive(Debug)]
struct TenantConnection {
    handle: Option<Arc<dyn ConnectionHandle>>,
    open: bool,
    shutdown: watch::Sender<bool>,
}

/// How one connection attempt ended.
#[derive(Debug)]
enum CloseOutcome {
    /// Deactivate/logout/shutdown asked the loop to stop; the caller
    /// already cleaned up.
    Shutdown,
    /// The tenant logged out; purge everything.
    Terminal,
    /// Transient close; reconnect the same tenant.
    Reconnect(crate::engine::DisconnectReason),
    /// Non-retryable close; leave the session inactive.
    Halt(crate::engine::DisconnectReason),
}

/// Supervises all per-tenant protocol connections.
///
/// Construction is explicit: the registry, bus, and collaborators are
/// injected, and a single instance is shared behind an `Arc` by the
/// gateway and the REST layer.
#[derive(Debug)]
pub struct ConnectionSupervisor {
    registry: Arc<SessionRegistry>,
    event_bus: EventBus,
    store: Arc<dyn CredentialStore>,
    engine: Arc<dyn ProtocolEngine>,
    encoder: Arc<dyn PairingEncoder>,
    message_log: Arc<dyn MessageLog>,
    connections: RwLock<HashMap<TenantId, TenantConnection>>,
    reconnect: ReconnectPolicy,
}

impl ConnectionSupervisor {
    /// Creates a supervisor over the given collaborators.
    #[must_use]
    pub fn new(
        registry: Arc<SessionRegistry>,
        event_bus: EventBus,
        store: Arc<dyn CredentialStore>,
        engine: Arc<dyn ProtocolEngine>,
        encoder: Arc<dyn PairingEncoder>,
        message_log: Arc<dyn MessageLog>,
        reconnect: ReconnectPolicy,
    ) -> Self {
        Self {
            registry,
            event_bus,
            store,
            engine,
            encoder,
            message_log,
            connections: RwLock::new(HashMap::new()),
            reconnect,
        }
    }

    /// Returns a reference to the inner [`SessionRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Initializes a session for `tenant`: reserves the connection
    /// seat, loads credentials, opens an engine connection, and spawns
    /// the event loop that drives the state machine.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionAlreadyActive`] if the tenant
    /// already has an active session or an initialization in flight,
    /// and [`GatewayError::SessionCreation`] on credential-store or
    /// engine failure (a newly created registry entry is rolled back).
    pub async fn initialize_session(
        self: &Arc<Self>,
        tenant: &TenantId,
    ) -> Result<(), GatewayError> {
        // Reserve the seat before any I/O so concurrent callers for the
        // same tenant observe the in-flight initialization.
        let (created, shutdown_rx) = {
            let mut conns = self.connections.write().await;
            if conns.contains_key(tenant) {
                return Err(GatewayError::SessionAlreadyActive(tenant.clone()));
            }
            let created = self.registry.initialize(tenant).await?;
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            conns.insert(
                tenant.clone(),
                TenantConnection {
                    handle: None,
                    open: false,
                    shutdown: shutdown_tx,
                },
            );
            (created, shutdown_rx)
        };

        tracing::info!(%tenant, "initializing session");

        match self.connect(tenant).await {
            Ok(events) => {
                let supervisor = Arc::clone(self);
                let tenant = tenant.clone();
                tokio::spawn(async move {
                    supervisor.connection_loop(tenant, events, shutdown_rx).await;
                });
                Ok(())
            }
            Err(e) => {
                // Roll back so a later attempt is not blocked by a
                // half-initialized session.
                self.connections.write().await.remove(tenant);
                if created {
                    self.registry.remove(tenant).await;
                }
                tracing::warn!(%tenant, error = %e, "session initialization failed");
                Err(e)
            }
        }
    }

    /// Loads credentials, opens a fresh engine connection, and installs
    /// its handle into the tenant's seat.
    async fn connect(
        &self,
        tenant: &TenantId,
    ) -> Result<mpsc::Receiver<EngineEvent>, GatewayError> {
        let credentials = self
            .store
            .load(tenant)
            .await
            .map_err(|e| GatewayError::SessionCreation(format!("credential load failed: {e}")))?;

        let connection = self
            .engine
            .open(tenant, credentials)
            .await
            .map_err(|e| GatewayError::SessionCreation(e.to_string()))?;

        let mut conns = self.connections.write().await;
        let Some(seat) = conns.get_mut(tenant) else {
            // Seat was torn down while the engine was connecting.
            connection.handle.force_close();
            return Err(GatewayError::SessionCreation(
                "initialization cancelled".to_string(),
            ));
        };
        seat.handle = Some(Arc::clone(&connection.handle));
        seat.open = false;
        Ok(connection.events)
    }

    /// Drives one tenant's connection across reconnects until the
    /// session ends.
    async fn connection_loop(
        self: Arc<Self>,
        tenant: TenantId,
        mut events: mpsc::Receiver<EngineEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut attempt: u32 = 0;

        'run: loop {
            let outcome = self
                .drive_connection(&tenant, &mut events, &mut shutdown, &mut attempt)
                .await;

            let reason = match outcome {
                CloseOutcome::Shutdown => break 'run,
                CloseOutcome::Terminal => {
                    self.finish_logout(&tenant).await;
                    break 'run;
                }
                CloseOutcome::Halt(reason) => {
                    self.registry.set_active(&tenant, false).await;
                    self.connections.write().await.remove(&tenant);
                    tracing::warn!(%tenant, ?reason, "connection closed; not retrying");
                    break 'run;
                }
                CloseOutcome::Reconnect(reason) => reason,
            };

            self.registry.set_active(&tenant, false).await;
            if let Some(seat) = self.connections.write().await.get_mut(&tenant) {
                seat.handle = None;
                seat.open = false;
            }
            tracing::info!(%tenant, ?reason, "transient disconnect; reconnecting");

            loop {
                attempt = attempt.saturating_add(1);
                if attempt > self.reconnect.max_attempts {
                    self.connections.write().await.remove(&tenant);
                    tracing::error!(
                        %tenant,
                        attempts = attempt - 1,
                        "reconnect ceiling reached; leaving session inactive"
                    );
                    break 'run;
                }

                let delay = self.reconnect.delay_for(attempt);
                tokio::select! {
                    () = tokio::time::sleep(delay) => {}
                    _ = shutdown.changed() => break 'run,
                }

                match self.connect(&tenant).await {
                    Ok(rx) => {
                        events = rx;
                        continue 'run;
                    }
                    Err(e) => {
                        tracing::warn!(%tenant, attempt, error = %e, "reconnect attempt failed");
                    }
                }
            }
        }

        tracing::debug!(%tenant, "connection loop ended");
    }

    /// Consumes events from one physical connection until it closes or
    /// the seat is shut down.
    async fn drive_connection(
        &self,
        tenant: &TenantId,
        events: &mut mpsc::Receiver<EngineEvent>,
        shutdown: &mut watch::Receiver<bool>,
        attempt: &mut u32,
    ) -> CloseOutcome {
        loop {
            tokio::select! {
                _ = shutdown.changed() => return CloseOutcome::Shutdown,
                event = events.recv() => match event {
                    // Engine dropped the stream without a close event;
                    // indistinguishable from an unclassified disconnect.
                    None => return CloseOutcome::Reconnect(crate::engine::DisconnectReason::Unknown),
                    Some(EngineEvent::CredentialUpdate(state)) => {
                        if let Err(e) = self.store.save(tenant, &state).await {
                            tracing::warn!(%tenant, error = %e, "credential persistence failed");
                        }
                    }
                    Some(EngineEvent::State(update)) => match update {
                        StateUpdate::Starting => {
                            tracing::debug!(%tenant, "connection starting");
                        }
                        StateUpdate::PairingIssued(raw) => {
                            let code = self.encoder.encode(&raw);
                            let delivered = self
                                .event_bus
                                .publish_pairing(PairingEvent::new(tenant.clone(), code));
                            tracing::info!(%tenant, delivered, "pairing code issued");
                        }
                        StateUpdate::Open => {
                            *attempt = 0;
                            self.mark_open(tenant).await;
                        }
                        StateUpdate::Closed(reason) => {
                            if reason.is_terminal() {
                                return CloseOutcome::Terminal;
                            }
                            if reason.should_reconnect() {
                                return CloseOutcome::Reconnect(reason);
                            }
                            return CloseOutcome::Halt(reason);
                        }
                    },
                    Some(EngineEvent::MessageStatus(update)) => {
                        if let Err(e) = self
                            .message_log
                            .update_status(&update.message_id, update.status)
                            .await
                        {
                            tracing::warn!(%tenant, error = %e, "message status update failed");
                        }
                    }
                },
            }
        }
    }

    /// Marks the tenant's connection open and announces it.
    async fn mark_open(&self, tenant: &TenantId) {
        if let Some(seat) = self.connections.write().await.get_mut(tenant) {
            seat.open = true;
        }
        self.registry.set_active(tenant, true).await;
        let delivered = self
            .event_bus
            .publish_established(ConnectionEstablishedEvent::new(tenant.clone()));
        tracing::info!(%tenant, delivered, "connection established");
    }

    /// Terminal cleanup after a logout: seat, credentials, and registry
    /// entry all go. Idempotent.
    async fn finish_logout(&self, tenant: &TenantId) {
        self.connections.write().await.remove(tenant);
        if let Err(e) = self.store.delete(tenant).await {
            tracing::warn!(%tenant, error = %e, "credential purge failed");
        }
        self.registry.remove(tenant).await;
        tracing::info!(%tenant, "session logged out; credentials purged");
    }

    /// Sends a message through the tenant's live connection and records
    /// the delivery (fire-and-forget).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NoActiveConnection`] when the tenant has
    /// no live handle, or [`GatewayError::Engine`] when the engine
    /// rejects the send.
    pub async fn send_message(
        &self,
        tenant: &TenantId,
        to: &str,
        kind: MessageKind,
        content: &str,
    ) -> Result<DeliveryResult, GatewayError> {
        let handle = {
            let conns = self.connections.read().await;
            conns.get(tenant).and_then(|seat| seat.handle.clone())
        };
        let Some(handle) = handle else {
            return Err(GatewayError::NoActiveConnection(tenant.clone()));
        };

        let result = match kind {
            MessageKind::Text => handle.send_text(to, content).await,
            MessageKind::File => handle.send_file(to, content).await,
            MessageKind::Image => handle.send_image(to, content).await,
        }?;

        let record = MessageRecord {
            to: to.to_string(),
            message_id: result.message_id.clone(),
            content: content.to_string(),
            status: result.status,
            requester: tenant.clone(),
        };
        let log = Arc::clone(&self.message_log);
        tokio::spawn(async move {
            if let Err(e) = log.record(record).await {
                tracing::warn!(error = %e, "message record failed");
            }
        });

        Ok(result)
    }

    /// Forcibly closes the tenant's transport without logging out.
    ///
    /// Used when the bound observer disconnects before pairing
    /// completed: credentials are kept so the next initialization can
    /// reuse them. A no-op once the connection has reached open, and
    /// for unknown tenants.
    pub async fn deactivate_session(&self, tenant: &TenantId) {
        let seat = {
            let mut conns = self.connections.write().await;
            match conns.get(tenant) {
                Some(seat) if seat.open => return,
                Some(_) => {}
                None => return,
            }
            conns.remove(tenant)
        };

        if let Some(seat) = seat {
            let _ = seat.shutdown.send(true);
            if let Some(handle) = &seat.handle {
                handle.force_close();
            }
            self.registry.set_active(tenant, false).await;
            tracing::info!(%tenant, "session deactivated before pairing completed");
        }
    }

    /// Explicitly logs the tenant out and removes all session state,
    /// including persisted credentials.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`] when the tenant has
    /// neither a seat nor a registry entry.
    pub async fn delete_session(&self, tenant: &TenantId) -> Result<(), GatewayError> {
        let seat = self.connections.write().await.remove(tenant);
        if seat.is_none() && self.registry.get(tenant).await.is_none() {
            return Err(GatewayError::SessionNotFound(tenant.clone()));
        }

        if let Some(seat) = seat {
            let _ = seat.shutdown.send(true);
            if let Some(handle) = &seat.handle
                && let Err(e) = handle.logout().await
            {
                tracing::warn!(%tenant, error = %e, "engine logout failed");
            }
        }

        if let Err(e) = self.store.delete(tenant).await {
            tracing::warn!(%tenant, error = %e, "credential purge failed");
        }
        self.registry.remove(tenant).await;
        tracing::info!(%tenant, "session deleted");
        Ok(())
    }

    /// Returns all known sessions.
    pub async fn list_sessions(&self) -> Vec<Session> {
        self.registry.list().await
    }

    /// Returns the session for `tenant`, if any.
    pub async fn get_session(&self, tenant: &TenantId) -> Option<Session> {
        self.registry.get(tenant).await
    }

    /// Startup sweep: initializes a session for every tenant with
    /// non-empty persisted credentials. Per-tenant failures are logged
    /// and do not abort the sweep. Returns the number of sessions
    /// restored.
    pub async fn restore_sessions(self: &Arc<Self>) -> usize {
        let tenants = match self.store.list().await {
            Ok(tenants) => tenants,
            Err(e) => {
                tracing::error!(error = %e, "credential listing failed; nothing restored");
                return 0;
            }
        };

        tracing::info!(count = tenants.len(), "restoring persisted sessions");
        let mut restored = 0_usize;
        for tenant in tenants {
            match self.initialize_session(&tenant).await {
                Ok(()) => restored += 1,
                Err(e) => {
                    tracing::warn!(%tenant, error = %e, "session restore failed; continuing");
                }
            }
        }
        tracing::info!(restored, "session restore sweep complete");
        restored
    }

    /// Shutdown sweep: closes every live transport without logging
    /// anyone out, leaving credentials for the next process start.
    pub async fn shutdown_all(&self) {
        let seats: Vec<(TenantId, TenantConnection)> =
            self.connections.write().await.drain().collect();
        for (tenant, seat) in seats {
            let _ = seat.shutdown.send(true);
            if let Some(handle) = &seat.handle {
                handle.force_close();
            }
            self.registry.set_active(&tenant, false).await;
            tracing::info!(%tenant, "connection closed for shutdown");
        }
    }
}

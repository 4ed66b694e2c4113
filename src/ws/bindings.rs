//! Tenant-to-observer binding table.
//!
//! At most one socket observes a tenant's events at a time. A new bind
//! for an already-bound tenant wins: the previous observer is asked to
//! close and the binding moves to the newcomer. Unbinding is guarded by
//! the observer's own id so a stale teardown never removes a successor's
//! binding.

use std::collections::HashMap;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::domain::TenantId;

/// Currently bound observer for one tenant.
#[derive(Debug)]
struct BoundObserver {
    id: Uuid,
    evict: mpsc::Sender<()>,
}

/// Table of tenant-to-observer bindings with last-bind-wins semantics.
#[derive(Debug, Default)]
pub struct ObserverBindings {
    inner: RwLock<HashMap<TenantId, BoundObserver>>,
}

impl ObserverBindings {
    /// Creates an empty binding table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds an observer to `tenant`, evicting any previous observer by
    /// signalling its eviction channel. Returns the new observer's id,
    /// which the caller must present to [`Self::unbind_if_current`] at
    /// teardown.
    pub async fn bind(&self, tenant: &TenantId, evict: mpsc::Sender<()>) -> Uuid {
        let id = Uuid::new_v4();
        let previous = self
            .inner
            .write()
            .await
            .insert(tenant.clone(), BoundObserver { id, evict });
        if let Some(previous) = previous {
            tracing::info!(%tenant, "observer replaced; evicting previous socket");
            let _ = previous.evict.try_send(());
        }
        id
    }

    /// Removes the binding for `tenant` only if it still belongs to the
    /// observer with `id`. Returns `true` when the caller held the
    /// current binding.
    pub async fn unbind_if_current(&self, tenant: &TenantId, id: Uuid) -> bool {
        let mut inner = self.inner.write().await;
        if inner.get(tenant).is_some_and(|bound| bound.id == id) {
            inner.remove(tenant);
            return true;
        }
        false
    }

    /// Returns `true` if the observer with `id` currently holds the
    /// binding for `tenant`.
    pub async fn is_current(&self, tenant: &TenantId, id: Uuid) -> bool {
        self.inner
            .read()
            .await
            .get(tenant)
            .is_some_and(|bound| bound.id == id)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bind_then_unbind_round_trip() {
        let bindings = ObserverBindings::new();
        let tenant = TenantId::new("t1");
        let (tx, _rx) = mpsc::channel(1);

        let id = bindings.bind(&tenant, tx).await;
        assert!(bindings.is_current(&tenant, id).await);
        assert!(bindings.unbind_if_current(&tenant, id).await);
        assert!(!bindings.is_current(&tenant, id).await);
    }

    #[tokio::test]
    async fn later_bind_evicts_earlier_observer() {
        let bindings = ObserverBindings::new();
        let tenant = TenantId::new("t1");
        let (tx1, mut rx1) = mpsc::channel(1);
        let (tx2, _rx2) = mpsc::channel(1);

        let first = bindings.bind(&tenant, tx1).await;
        let second = bindings.bind(&tenant, tx2).await;

        assert!(rx1.try_recv().is_ok(), "first observer was evicted");
        assert!(!bindings.is_current(&tenant, first).await);
        assert!(bindings.is_current(&tenant, second).await);
    }

    #[tokio::test]
    async fn stale_unbind_does_not_remove_successor() {
        let bindings = ObserverBindings::new();
        let tenant = TenantId::new("t1");
        let (tx1, _rx1) = mpsc::channel(1);
        let (tx2, _rx2) = mpsc::channel(1);

        let first = bindings.bind(&tenant, tx1).await;
        let second = bindings.bind(&tenant, tx2).await;

        assert!(!bindings.unbind_if_current(&tenant, first).await);
        assert!(bindings.is_current(&tenant, second).await);
    }

    #[tokio::test]
    async fn bindings_are_per_tenant() {
        let bindings = ObserverBindings::new();
        let (tx1, mut rx1) = mpsc::channel(1);
        let (tx2, _rx2) = mpsc::channel(1);

        let a = bindings.bind(&TenantId::new("a"), tx1).await;
        let _b = bindings.bind(&TenantId::new("b"), tx2).await;

        assert!(rx1.try_recv().is_err(), "different tenant, no eviction");
        assert!(bindings.is_current(&TenantId::new("a"), a).await);
    }
}

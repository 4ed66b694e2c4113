//! Credential persistence boundary.
//!
//! The supervisor persists, loads, and purges per-tenant credential
//! state through [`CredentialStore`]. The default implementation keeps
//! one directory per tenant on the local filesystem; tests swap in an
//! in-memory store.

pub mod fs_store;

use async_trait::async_trait;

use crate::domain::TenantId;
use crate::engine::CredentialState;

pub use fs_store::FsCredentialStore;

/// Errors surfaced by a credential store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying I/O failure.
    #[error("credential store i/o: {0}")]
    Io(#[from] std::io::Error),
    /// Tenant identifier cannot be used as a store key.
    #[error("invalid tenant key: {0}")]
    InvalidTenant(TenantId),
}

/// Per-tenant persisted authentication state.
#[async_trait]
pub trait CredentialStore: Send + Sync + std::fmt::Debug {
    /// Loads the credential state for `tenant`. A tenant with nothing
    /// persisted yields an empty state (fresh pairing).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on I/O failure or an unusable tenant key.
    async fn load(&self, tenant: &TenantId) -> Result<CredentialState, StoreError>;

    /// Persists the credential state for `tenant`, replacing any
    /// previous state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on I/O failure or an unusable tenant key.
    async fn save(&self, tenant: &TenantId, state: &CredentialState) -> Result<(), StoreError>;

    /// Deletes all persisted state for `tenant`. Deleting an unknown
    /// tenant is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on I/O failure or an unusable tenant key.
    async fn delete(&self, tenant: &TenantId) -> Result<(), StoreError>;

    /// Lists the tenants with non-empty persisted state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on I/O failure.
    async fn list(&self) -> Result<Vec<TenantId>, StoreError>;
}

//! Filesystem credential store: one directory per tenant.
//!
//! Layout mirrors the historical token folders: `<root>/<tenant>/` holds
//! the tenant's credential file. [`FsCredentialStore::list`] returns the
//! tenants whose directories are non-empty and prunes empty leftovers.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{CredentialStore, StoreError};
use crate::domain::TenantId;
use crate::engine::CredentialState;

const STATE_FILE: &str = "state.bin";

/// Credential store backed by a local directory tree.
#[derive(Debug, Clone)]
pub struct FsCredentialStore {
    root: PathBuf,
}

impl FsCredentialStore {
    /// Creates a store rooted at `root`. The directory is created on
    /// first write, not here.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn tenant_dir(&self, tenant: &TenantId) -> Result<PathBuf, StoreError> {
        if !tenant.is_path_safe() {
            return Err(StoreError::InvalidTenant(tenant.clone()));
        }
        Ok(self.root.join(tenant.as_str()))
    }

    async fn dir_is_empty(path: &Path) -> std::io::Result<bool> {
        let mut entries = tokio::fs::read_dir(path).await?;
        Ok(entries.next_entry().await?.is_none())
    }
}

#[async_trait]
impl CredentialStore for FsCredentialStore {
    async fn load(&self, tenant: &TenantId) -> Result<CredentialState, StoreError> {
        let path = self.tenant_dir(tenant)?.join(STATE_FILE);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(CredentialState::new(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CredentialState::empty()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn save(&self, tenant: &TenantId, state: &CredentialState) -> Result<(), StoreError> {
        let dir = self.tenant_dir(tenant)?;
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(STATE_FILE), state.as_bytes()).await?;
        Ok(())
    }

    async fn delete(&self, tenant: &TenantId) -> Result<(), StoreError> {
        let dir = self.tenant_dir(tenant)?;
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn list(&self) -> Result<Vec<TenantId>, StoreError> {
        let mut tenants = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(tenants),
            Err(e) => return Err(StoreError::Io(e)),
        };

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let path = entry.path();
            if Self::dir_is_empty(&path).await? {
                // Leftover from an interrupted pairing; reclaim it.
                let _ = tokio::fs::remove_dir(&path).await;
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                tenants.push(TenantId::new(name));
            }
        }

        Ok(tenants)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FsCredentialStore) {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir failed");
        };
        let store = FsCredentialStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn load_missing_tenant_returns_empty_state() {
        let (_dir, store) = store();
        let state = store.load(&TenantId::new("t1")).await;
        assert!(state.is_ok_and(|s| s.is_empty()));
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let (_dir, store) = store();
        let tenant = TenantId::new("t1");
        let state = CredentialState::new(b"creds".to_vec());

        assert!(store.save(&tenant, &state).await.is_ok());
        let loaded = store.load(&tenant).await;
        assert_eq!(loaded.ok(), Some(state));
    }

    #[tokio::test]
    async fn delete_removes_tenant_directory() {
        let (_dir, store) = store();
        let tenant = TenantId::new("t1");
        let _ = store
            .save(&tenant, &CredentialState::new(b"creds".to_vec()))
            .await;

        assert!(store.delete(&tenant).await.is_ok());
        let listed = store.list().await;
        assert_eq!(listed.ok(), Some(vec![]));
        // Deleting again is not an error
        assert!(store.delete(&tenant).await.is_ok());
    }

    #[tokio::test]
    async fn list_returns_only_non_empty_tenants() {
        let (dir, store) = store();
        let _ = store
            .save(&TenantId::new("x"), &CredentialState::new(b"creds".to_vec()))
            .await;
        // Empty directory: never written, only created
        let Ok(()) = std::fs::create_dir(dir.path().join("y")) else {
            panic!("mkdir failed");
        };

        let listed = store.list().await;
        assert_eq!(listed.ok(), Some(vec![TenantId::new("x")]));
        // The empty directory was pruned
        assert!(!dir.path().join("y").exists());
    }

    #[tokio::test]
    async fn unsafe_tenant_names_are_rejected() {
        let (_dir, store) = store();
        let result = store.load(&TenantId::new("../escape")).await;
        assert!(matches!(result, Err(StoreError::InvalidTenant(_))));
    }
}

//! Type-safe tenant identifier.
//!
//! [`TenantId`] is a newtype wrapper around an opaque string. It doubles
//! as the credential-store key and the session-registry key, so it cannot
//! be confused with other string-typed values such as message recipients.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier for an isolated tenant.
///
/// Used as the dictionary key in [`super::SessionRegistry`], the
/// credential-store directory name, and the event discriminator for
/// observer routing. At most one live protocol connection exists per
/// `TenantId` at any time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Creates a `TenantId` from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the identifier is safe to use as a single
    /// filesystem path component (no separators, no traversal).
    #[must_use]
    pub fn is_path_safe(&self) -> bool {
        !self.0.is_empty()
            && self.0 != "."
            && self.0 != ".."
            && !self.0.contains(['/', '\\', '\0'])
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TenantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TenantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

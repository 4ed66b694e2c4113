//! Session record: one per tenant, mutated across the connection lifecycle.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::TenantId;

/// Per-tenant session record.
///
/// Born inactive when initialization begins, flipped active when the
/// underlying protocol connection reports open, and removed only on a
/// terminal logout. All other disconnects leave the record present but
/// inactive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Session {
    /// Tenant this session belongs to.
    #[schema(value_type = String)]
    pub name: TenantId,
    /// Whether the underlying connection is currently open.
    pub active: bool,
}

impl Session {
    /// Creates a new inactive session for the given tenant.
    #[must_use]
    pub fn new(name: TenantId) -> Self {
        Self {
            name,
            active: false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_inactive() {
        let session = Session::new(TenantId::new("t1"));
        assert!(!session.active);
        assert_eq!(session.name.as_str(), "t1");
    }

    #[test]
    fn serializes_with_plain_field_names() {
        let session = Session {
            name: TenantId::new("t1"),
            active: true,
        };
        let json = serde_json::to_value(&session).ok();
        assert_eq!(
            json,
            Some(serde_json::json!({ "name": "t1", "active": true }))
        );
    }
}

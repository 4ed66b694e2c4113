//! Observer token verification.
//!
//! Observers authenticate their WebSocket connection by sending a signed
//! bearer token as the first frame. [`TokenVerifier`] checks the HS256
//! signature and extracts the tenant claims; the gateway never issues
//! tokens itself.

use std::fmt;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::domain::TenantId;
use crate::error::GatewayError;

/// Claims carried by an observer token.
///
/// Field names follow the issuing service's wire contract (camelCase).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    /// Tenant the observer acts for. Optional at the serde level so a
    /// valid signature with a missing claim can be reported distinctly.
    #[serde(rename = "tenantId", default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Whether the tenant's subscription is active per the issuer.
    #[serde(rename = "isTenantActive", default)]
    pub is_tenant_active: bool,
    /// Expiry as a Unix timestamp.
    pub exp: u64,
}

/// Verified observer identity.
#[derive(Debug, Clone)]
pub struct VerifiedObserver {
    /// Tenant extracted from the token.
    pub tenant: TenantId,
    /// Issuer-side tenant active flag, logged but not enforced here.
    pub tenant_active: bool,
}

/// Verifies observer bearer tokens with a shared HS256 secret.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Creates a verifier for the given shared secret.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verifies `token` and extracts the tenant claims.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unauthorized`] for a missing, malformed,
    /// expired, or not-yet-valid token, and
    /// [`GatewayError::MissingTenantClaim`] when the signature verifies
    /// but no tenant claim is present.
    pub fn verify(&self, token: &str) -> Result<VerifiedObserver, GatewayError> {
        let token = token.trim().trim_start_matches("Bearer ").trim();
        if token.is_empty() {
            return Err(GatewayError::Unauthorized("token not provided".into()));
        }

        let data = jsonwebtoken::decode::<AuthClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => GatewayError::Unauthorized("token expired".into()),
                ErrorKind::ImmatureSignature => {
                    GatewayError::Unauthorized("token not yet valid".into())
                }
                ErrorKind::InvalidSignature => {
                    GatewayError::Unauthorized("token signature verification failed".into())
                }
                _ => GatewayError::Unauthorized("invalid token".into()),
            })?;

        let tenant = data
            .claims
            .tenant_id
            .filter(|id| !id.is_empty())
            .ok_or(GatewayError::MissingTenantClaim)?;

        Ok(VerifiedObserver {
            tenant: TenantId::new(tenant),
            tenant_active: data.claims.is_tenant_active,
        })
    }
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenVerifier").finish_non_exhaustive()
    }
}

//! Admin session providers.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::domain::{AppError, AuthProvider, Session};

/// Constant-time comparison of two byte slices to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Authenticates admins by a shared API key.
///
/// Keys are compared via their SHA-256 digests so the comparison time does
/// not depend on the key length or the position of the first mismatch.
pub struct ApiKeyAuthProvider {
    key_digest: [u8; 32],
}

impl ApiKeyAuthProvider {
    #[must_use]
    pub fn new(api_key: &SecretString) -> Self {
        Self {
            key_digest: Sha256::digest(api_key.expose_secret().as_bytes()).into(),
        }
    }
}

#[async_trait]
impl AuthProvider for ApiKeyAuthProvider {
    async fn authenticate(&self, token: Option<&str>) -> Result<Session, AppError> {
        let Some(provided) = token else {
            warn!("admin auth failed: missing credentials");
            return Err(AppError::Authentication("missing credentials".to_string()));
        };

        let provided_hash = Sha256::digest(provided.as_bytes());
        if !constant_time_eq(&self.key_digest, provided_hash.as_slice()) {
            warn!("admin auth failed: invalid api key");
            return Err(AppError::Authentication("invalid credentials".to_string()));
        }

        Ok(Session::new("admin", self.name()))
    }

    fn name(&self) -> &'static str {
        "api-key"
    }
}

/// Lets every request through. Local development only.
pub struct DevAuthProvider;

#[async_trait]
impl AuthProvider for DevAuthProvider {
    async fn authenticate(&self, _token: Option<&str>) -> Result<Session, AppError> {
        Ok(Session::new("developer", self.name()))
    }

    fn name(&self) -> &'static str {
        "dev"
    }
}

//! Ed25519-signed upload tokens.
//!
//! A token is `<base58 grant json>.<base58 signature>`. Only the server holds
//! the signing key; clients present the token back on `PUT /api/upload`.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use crate::domain::{StorageError, UploadGrant};

/// Parse a base58-encoded private key (32-byte seed or 64-byte keypair).
fn signing_key_from_secret(secret: &SecretString) -> Result<SigningKey, StorageError> {
    let key_bytes = bs58::decode(secret.expose_secret())
        .into_vec()
        .map_err(|e| StorageError::InvalidToken(format!("signing key: {e}")))?;

    let key_array: [u8; 32] = match key_bytes.len() {
        64 => key_bytes[..32]
            .try_into()
            .map_err(|_| StorageError::InvalidToken("invalid keypair format".to_string()))?,
        32 => key_bytes.try_into().map_err(|v: Vec<u8>| {
            StorageError::InvalidToken(format!("key must be 32 bytes, got {}", v.len()))
        })?,
        n => {
            return Err(StorageError::InvalidToken(format!(
                "key must be 32 or 64 bytes, got {n}"
            )));
        }
    };

    Ok(SigningKey::from_bytes(&key_array))
}

pub struct UploadTokenSigner {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl UploadTokenSigner {
    /// Build a signer from a base58-encoded secret.
    pub fn from_secret(secret: &SecretString) -> Result<Self, StorageError> {
        Ok(Self::from_key(signing_key_from_secret(secret)?))
    }

    /// Ephemeral key; tokens do not survive a restart.
    #[must_use]
    pub fn generate() -> Self {
        Self::from_key(SigningKey::generate(&mut OsRng))
    }

    fn from_key(signing_key: SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    #[must_use]
    pub fn public_key(&self) -> String {
        bs58::encode(self.verifying_key.as_bytes()).into_string()
    }

    pub fn issue(&self, grant: &UploadGrant) -> Result<String, StorageError> {
        let payload = serde_json::to_vec(grant)
            .map_err(|e| StorageError::InvalidToken(format!("encode grant: {e}")))?;
        let signature = self.signing_key.sign(&payload);
        Ok(format!(
            "{}.{}",
            bs58::encode(&payload).into_string(),
            bs58::encode(signature.to_bytes()).into_string()
        ))
    }

    /// Checks the signature and expiry; `now` is unix seconds.
    pub fn verify(&self, token: &str, now: i64) -> Result<UploadGrant, StorageError> {
        let invalid = |reason: &str| StorageError::InvalidToken(reason.to_string());

        let (payload_b58, signature_b58) = token.split_once('.').ok_or_else(|| invalid("malformed"))?;
        let payload = bs58::decode(payload_b58)
            .into_vec()
            .map_err(|_| invalid("malformed payload"))?;
        let signature_bytes: [u8; 64] = bs58::decode(signature_b58)
            .into_vec()
            .map_err(|_| invalid("malformed signature"))?
            .try_into()
            .map_err(|_| invalid("malformed signature"))?;

        let signature = Signature::from_bytes(&signature_bytes);
        if self.verifying_key.verify(&payload, &signature).is_err() {
            warn!("upload token signature mismatch");
            return Err(invalid("bad signature"));
        }

        let grant: UploadGrant =
            serde_json::from_slice(&payload).map_err(|_| invalid("malformed grant"))?;
        if grant.expires_at <= now {
            return Err(StorageError::TokenExpired);
        }
        Ok(grant)
    }
}

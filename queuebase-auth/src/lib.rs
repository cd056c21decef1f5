//! Request authentication for the Queuebase gateway.
//!
//! Provides:
//! - Signing secret resolution from inbound request headers
//! - HMAC-SHA256 signature computation and constant-time verification
//! - A composed [`RequestAuthenticator`] used by both gateway operations

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use hmac::{Hmac, Mac};
use http::HeaderMap;
use sha2::Sha256;
use thiserror::Error;

/// Header carrying the caller's hex-encoded HMAC signature.
pub const SIGNATURE_HEADER: &str = "x-queuebase-signature";

/// Header selecting a secret from a keyring.
pub const KEY_ID_HEADER: &str = "x-queuebase-key-id";

type HmacSha256 = Hmac<Sha256>;

// ============================================================================
// Signing Secret
// ============================================================================

/// Shared secret used to sign and verify requests.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret(Arc<[u8]>);

impl SigningSecret {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self(Arc::from(secret.as_ref()))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

impl From<&str> for SigningSecret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SigningSecret {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Authentication errors raised while checking an inbound request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No signing secret could be resolved for the request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("signature mismatch")]
    SignatureMismatch,
}

impl AuthError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }
}

// ============================================================================
// Secret Resolution
// ============================================================================

/// Resolves the secret a request must be verified against.
///
/// Implementations must be pure functions of the request headers.
pub trait SignatureValidator: Send + Sync + 'static {
    fn resolve_secret(&self, headers: &HeaderMap) -> Result<SigningSecret, AuthError>;
}

/// Secret lookup keyed by the `X-Queuebase-Key-Id` header, with an optional
/// default used when the header is absent.
#[derive(Debug, Clone, Default)]
pub struct KeyringValidator {
    keys: HashMap<String, SigningSecret>,
    default: Option<SigningSecret>,
}

impl KeyringValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A validator that resolves every request to the same secret.
    pub fn single(secret: impl Into<SigningSecret>) -> Self {
        Self::new().with_default(secret)
    }

    pub fn with_key(mut self, id: impl Into<String>, secret: impl Into<SigningSecret>) -> Self {
        self.keys.insert(id.into(), secret.into());
        self
    }

    pub fn with_default(mut self, secret: impl Into<SigningSecret>) -> Self {
        self.default = Some(secret.into());
        self
    }

    /// Number of secrets this validator can resolve to.
    pub fn len(&self) -> usize {
        self.keys.len() + usize::from(self.default.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SignatureValidator for KeyringValidator {
    fn resolve_secret(&self, headers: &HeaderMap) -> Result<SigningSecret, AuthError> {
        let secret = match headers.get(KEY_ID_HEADER) {
            Some(raw) => {
                let id = raw
                    .to_str()
                    .map_err(|_| AuthError::invalid_request("key id is not valid ASCII"))?
                    .trim();
                self.keys
                    .get(id)
                    .cloned()
                    .ok_or_else(|| {
                        AuthError::invalid_request(format!("unknown key id: {}", loggable_key_id(id)))
                    })?
            }
            None => self
                .default
                .clone()
                .ok_or_else(|| AuthError::invalid_request("no signing key for request"))?,
        };

        if secret.is_empty() {
            return Err(AuthError::invalid_request("resolved signing key is empty"));
        }
        Ok(secret)
    }
}

/// Longest key id echoed back in an error.
const MAX_REPORTED_KEY_ID: usize = 32;

/// Quote and truncate a caller-supplied key id. `id` is visible ASCII, as
/// guaranteed by `HeaderValue::to_str`.
fn loggable_key_id(id: &str) -> String {
    match id.get(..MAX_REPORTED_KEY_ID) {
        Some(prefix) if prefix.len() < id.len() => format!("{prefix:?}..."),
        _ => format!("{id:?}"),
    }
}

// ============================================================================
// Signature Verification
// ============================================================================

/// Verifies a signature header over a payload.
pub trait SignatureVerifier: Send + Sync + 'static {
    /// Returns `true` iff `signature` is present and matches `payload` under `secret`.
    fn verify(&self, payload: &[u8], signature: Option<&str>, secret: &SigningSecret) -> bool;
}

/// HMAC-SHA256 verifier for hex-encoded signatures.
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSha256Verifier;

impl SignatureVerifier for HmacSha256Verifier {
    fn verify(&self, payload: &[u8], signature: Option<&str>, secret: &SigningSecret) -> bool {
        let Some(signature) = signature else {
            return false;
        };
        let Ok(expected) = hex::decode(signature.trim()) else {
            return false;
        };

        let mut mac = mac_for(secret);
        mac.update(payload);
        // verify_slice compares in constant time and rejects length mismatches
        mac.verify_slice(&expected).is_ok()
    }
}

fn mac_for(secret: &SigningSecret) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length")
}

/// Compute the lowercase hex HMAC-SHA256 of `payload` under `secret`.
pub fn sign_payload(payload: &[u8], secret: &SigningSecret) -> String {
    let mut mac = mac_for(secret);
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Convenience wrapper around [`HmacSha256Verifier`].
#[inline]
pub fn verify_signature(payload: &[u8], signature: Option<&str>, secret: &SigningSecret) -> bool {
    HmacSha256Verifier.verify(payload, signature, secret)
}

// ============================================================================
// Request Authenticator
// ============================================================================

/// Resolves a request's secret and verifies its signature header exactly once.
#[derive(Clone)]
pub struct RequestAuthenticator {
    validator: Arc<dyn SignatureValidator>,
    verifier: Arc<dyn SignatureVerifier>,
}

impl fmt::Debug for RequestAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestAuthenticator")
            .field("validator", &"<dyn SignatureValidator>")
            .field("verifier", &"<dyn SignatureVerifier>")
            .finish()
    }
}

impl RequestAuthenticator {
    pub fn new(
        validator: impl SignatureValidator,
        verifier: impl SignatureVerifier,
    ) -> Self {
        Self {
            validator: Arc::new(validator),
            verifier: Arc::new(verifier),
        }
    }

    /// HMAC-SHA256 authenticator backed by a single shared secret.
    pub fn from_secret(secret: impl Into<SigningSecret>) -> Self {
        Self::new(KeyringValidator::single(secret), HmacSha256Verifier)
    }

    /// Authenticate a request whose signed payload is `payload`.
    pub fn authenticate(&self, headers: &HeaderMap, payload: &[u8]) -> Result<(), AuthError> {
        let secret = self.validator.resolve_secret(headers)?;
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok());

        if self.verifier.verify(payload, signature, &secret) {
            Ok(())
        } else {
            tracing::debug!(has_signature = signature.is_some(), "signature verification failed");
            Err(AuthError::SignatureMismatch)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

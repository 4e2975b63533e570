#![forbid(unsafe_code)]

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const NONCE_LEN: usize = 12;

#[derive(Debug)]
pub enum SessionError {
    Crypto,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Crypto => write!(f, "session cryptographic operation failed"),
        }
    }
}

impl std::error::Error for SessionError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub admin_logged_in: bool,
    pub issued_at_unix_s: i64,
}

/// Seals and opens the admin session cookie.
///
/// Cookie value is base64(nonce || AES-256-GCM ciphertext of the claims
/// JSON), keyed by SHA-256 of the configured secret. `open` fails closed:
/// any malformed, tampered, or foreign-key cookie reads as unauthenticated.
#[derive(Debug, Clone)]
pub struct SessionKeeper {
    key: [u8; 32],
}

impl SessionKeeper {
    pub fn from_secret(secret: &str) -> Self {
        let key: [u8; 32] = Sha256::digest(secret.as_bytes()).into();
        Self { key }
    }

    pub fn seal(&self, claims: &SessionClaims) -> Result<String, SessionError> {
        let cipher = Aes256Gcm::new_from_slice(&self.key).map_err(|_| SessionError::Crypto)?;
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let payload = serde_json::to_vec(claims).map_err(|_| SessionError::Crypto)?;
        let ciphertext = cipher
            .encrypt(nonce, payload.as_slice())
            .map_err(|_| SessionError::Crypto)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(sealed))
    }

    pub fn open(&self, cookie_value: &str) -> Option<SessionClaims> {
        let raw = BASE64.decode(cookie_value.as_bytes()).ok()?;
        if raw.len() <= NONCE_LEN {
            return None;
        }
        let (nonce_raw, ciphertext) = raw.split_at(NONCE_LEN);
        let cipher = Aes256Gcm::new_from_slice(&self.key).ok()?;
        let nonce = Nonce::from_slice(nonce_raw);
        let plaintext = cipher.decrypt(nonce, ciphertext).ok()?;
        serde_json::from_slice(&plaintext).ok()
    }
}

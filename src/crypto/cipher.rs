/// AES-256-GCM authenticated encryption for individual secret values.
///
/// Each engine is bound to exactly one 256-bit working key. Every seal
/// generates a fresh random 96-bit nonce; nonces are never reused across
/// calls, even for identical plaintext within one process lifetime. No
/// associated data is used. Ciphertext and nonce travel base64-encoded
/// inside the JSON record file.
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;

use crate::crypto::sensitive::SensitiveBytes32;
use crate::error::{Result, ZeroEnvError};

pub const NONCE_LEN: usize = 12;

/// Output of a single seal: both fields base64 for JSON transport.
#[derive(Debug, Clone)]
pub struct SealedValue {
    pub ciphertext: String,
    pub nonce: String,
}

/// Stateless-per-instance AEAD wrapper bound to one working key.
pub struct CipherEngine {
    cipher: Aes256Gcm,
}

impl CipherEngine {
    /// Construct an engine from a 32-byte working key.
    pub fn new(key: &SensitiveBytes32) -> Self {
        let key = Key::<Aes256Gcm>::from_slice(key.as_bytes());
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Construct from a raw slice, rejecting any length other than 32.
    pub fn from_slice(key: &[u8]) -> Result<Self> {
        Ok(Self::new(&SensitiveBytes32::from_slice(key)?))
    }

    /// Encrypt a secret value under a fresh random nonce.
    pub fn seal(&self, plaintext: &str) -> Result<SealedValue> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| ZeroEnvError::AuthenticationFailure)?;

        Ok(SealedValue {
            ciphertext: STANDARD.encode(ciphertext),
            nonce: STANDARD.encode(nonce_bytes),
        })
    }

    /// Decrypt and verify a sealed value.
    ///
    /// Fails with `AuthenticationFailure` when the GCM tag does not
    /// verify - tampered ciphertext, wrong nonce, or wrong key. This is
    /// the only mechanism that detects corruption or a wrong master
    /// key, so it is never suppressed. Undecodable base64 in either
    /// field is the same failure: a corrupted record.
    pub fn open(&self, ciphertext: &str, nonce: &str) -> Result<String> {
        let ciphertext = STANDARD
            .decode(ciphertext)
            .map_err(|_| ZeroEnvError::AuthenticationFailure)?;
        let nonce_bytes = STANDARD
            .decode(nonce)
            .map_err(|_| ZeroEnvError::AuthenticationFailure)?;
        if nonce_bytes.len() != NONCE_LEN {
            return Err(ZeroEnvError::AuthenticationFailure);
        }

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_slice())
            .map_err(|_| ZeroEnvError::AuthenticationFailure)?;

        String::from_utf8(plaintext).map_err(|_| ZeroEnvError::AuthenticationFailure)
    }
}

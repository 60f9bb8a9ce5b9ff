/// Master key generation and key-file encoding.
///
/// The master key is 32 random bytes, generated once at store creation
/// and persisted as a single base64 line in the key file. The key file
/// never lives next to version control: the record file is safe to
/// commit, the key file is not.
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;

use crate::crypto::sensitive::SensitiveBytes32;
use crate::error::{Result, ZeroEnvError};

pub const KEY_LEN: usize = 32;

/// Generate a new random 256-bit master key.
pub fn generate_master_key() -> SensitiveBytes32 {
    let mut key = [0u8; KEY_LEN];
    rand::rngs::OsRng.fill_bytes(&mut key);
    SensitiveBytes32::new(key)
}

/// Encode a key as the base64 line stored in the key file.
pub fn encode_key(key: &SensitiveBytes32) -> String {
    STANDARD.encode(key.as_bytes())
}

/// Decode a key-file line back into key bytes.
///
/// Anything that does not decode to exactly 32 raw bytes is a fatal
/// configuration error, not a recoverable one.
pub fn decode_key(encoded: &str) -> Result<SensitiveBytes32> {
    let raw = STANDARD
        .decode(encoded.trim())
        .map_err(|_| ZeroEnvError::InvalidKeyLength)?;
    SensitiveBytes32::from_slice(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_key_unique() {
        let k1 = generate_master_key();
        let k2 = generate_master_key();
        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_key_encoding_roundtrip() {
        let key = generate_master_key();
        let encoded = encode_key(&key);
        let decoded = decode_key(&encoded).unwrap();
        assert_eq!(key.as_bytes(), decoded.as_bytes());
    }

    #[test]
    fn test_decode_trims_whitespace() {
        let key = generate_master_key();
        let encoded = format!("{}\n", encode_key(&key));
        assert_eq!(decode_key(&encoded).unwrap().as_bytes(), key.as_bytes());
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let short = STANDARD.encode([0u8; 16]);
        assert!(matches!(
            decode_key(&short),
            Err(ZeroEnvError::InvalidKeyLength)
        ));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_key("not base64 at all!!!").is_err());
    }
}

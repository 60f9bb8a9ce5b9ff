/// On-disk record format for the secrets file.
///
/// The whole document is read and rewritten on every mutation; writes go
/// through a temp file in the store directory followed by an atomic
/// rename, so a concurrent reader never observes partial JSON.
///
/// Backward compatibility: files written before security tiers existed
/// carry no `security_tier` field. They deserialize with the tier absent
/// and are treated as `standard` stores (master key used directly as the
/// working key). The defaulting is silent by design.
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::crypto::kdf::{SecurityTier, SALT_LEN};
use crate::error::{Result, ZeroEnvError};

/// Current record file format version.
pub const FORMAT_VERSION: &str = "1.0";

/// Per-secret entry: AEAD output plus a last-modified timestamp.
///
/// Overwritten in place (new nonce, new ciphertext) on every update of
/// the same name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedRecord {
    /// AEAD ciphertext, base64.
    pub ciphertext: String,
    /// 12-byte GCM nonce, base64, unique per encryption call.
    pub nonce: String,
    /// When this record was last written.
    pub updated_at: DateTime<Utc>,
}

/// The full persisted document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreFile {
    /// Format version for forward compatibility.
    pub version: String,
    /// When the store was created.
    pub created_at: DateTime<Utc>,
    /// Key-derivation tier. Absent in legacy files, meaning standard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_tier: Option<SecurityTier>,
    /// PBKDF2 salt, base64. Present only for non-standard tiers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    /// Secret name -> encrypted record. Names are case-sensitive.
    pub secrets: BTreeMap<String, EncryptedRecord>,
}

impl StoreFile {
    /// Fresh store document with no secrets.
    pub fn new(tier: SecurityTier, salt: Option<&[u8]>) -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            created_at: Utc::now(),
            security_tier: Some(tier),
            salt: salt.map(|s| STANDARD.encode(s)),
            secrets: BTreeMap::new(),
        }
    }

    /// The effective tier, defaulting legacy files to standard.
    pub fn tier(&self) -> SecurityTier {
        match self.security_tier {
            Some(tier) => tier,
            None => {
                debug!("record file has no security_tier, treating as standard");
                SecurityTier::Standard
            }
        }
    }

    /// Decode and validate the salt against the effective tier.
    ///
    /// A non-standard tier without a 16-byte salt is an inconsistent
    /// store and refuses to load - never a silent fallback.
    pub fn decoded_salt(&self) -> Result<Option<Vec<u8>>> {
        let tier = self.tier();
        match &self.salt {
            None => {
                if tier.requires_salt() {
                    return Err(ZeroEnvError::InvalidConfiguration(format!(
                        "tier '{tier}' requires a salt but none is stored"
                    )));
                }
                Ok(None)
            }
            Some(encoded) => {
                let raw = STANDARD.decode(encoded).map_err(|_| {
                    ZeroEnvError::InvalidConfiguration("stored salt is not valid base64".into())
                })?;
                if raw.len() != SALT_LEN {
                    return Err(ZeroEnvError::InvalidConfiguration(format!(
                        "stored salt must be {SALT_LEN} bytes, got {}",
                        raw.len()
                    )));
                }
                Ok(Some(raw))
            }
        }
    }

    /// Load the document from the record file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        serde_json::from_str(&data).map_err(|e| ZeroEnvError::Serialization(e.to_string()))
    }

    /// Rewrite the record file atomically.
    ///
    /// Serializes to a temp file in the same directory, then renames it
    /// over the record file so readers see either the old or the new
    /// document, never a torn write.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ZeroEnvError::Serialization(e.to_string()))?;

        let dir = path.parent().ok_or_else(|| {
            ZeroEnvError::InvalidConfiguration("record file path has no parent directory".into())
        })?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(path).map_err(|e| ZeroEnvError::Io(e.error))?;
        Ok(())
    }
}

/// The secret store: lifecycle and CRUD over the encrypted record file.
///
/// Two files per store directory:
/// - `.secrets.key` - one base64 line, the 32-byte master key. Kept out
///   of version control.
/// - `.secrets` - the JSON record document. Safe to commit.
///
/// The working key is derived once when the store is opened (master key
/// + persisted tier and salt) and held only for the store's lifetime.
/// Every mutation is a full read-modify-write of the record file with an
/// atomic replace. Two processes writing the same directory race as
/// last-writer-wins; no cross-process ordering is guaranteed.
pub mod format;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::crypto::cipher::CipherEngine;
use crate::crypto::kdf::{self, SecurityTier};
use crate::crypto::keys;
use crate::error::{Result, ZeroEnvError};
use self::format::{EncryptedRecord, StoreFile};

/// Record file name, fixed relative to the store directory.
pub const SECRETS_FILE: &str = ".secrets";
/// Key file name, fixed relative to the store directory.
pub const KEY_FILE: &str = ".secrets.key";

/// Metadata about a secret, readable without decryption.
#[derive(Debug, Clone)]
pub struct SecretMetadata {
    pub name: String,
    pub updated_at: DateTime<Utc>,
}

/// A store in the Ready state: both files exist and the working key has
/// been derived.
pub struct SecretStore {
    directory: PathBuf,
    secrets_path: PathBuf,
    key_path: PathBuf,
    engine: CipherEngine,
}

impl SecretStore {
    fn secrets_path_in(directory: &Path) -> PathBuf {
        directory.join(SECRETS_FILE)
    }

    fn key_path_in(directory: &Path) -> PathBuf {
        directory.join(KEY_FILE)
    }

    /// Whether a store exists in the directory (both files present).
    pub fn is_initialized(directory: &Path) -> bool {
        Self::secrets_path_in(directory).exists() && Self::key_path_in(directory).exists()
    }

    /// Create a new store in the directory.
    ///
    /// Generates a fresh master key (and, for non-standard tiers, a
    /// salt), writes the key file and an empty record file, and returns
    /// the store ready for use. Refuses with `AlreadyInitialized` when
    /// both files already exist: overwriting the master key would
    /// orphan every previously encrypted record.
    pub fn initialize(directory: &Path, tier: SecurityTier) -> Result<Self> {
        if Self::is_initialized(directory) {
            return Err(ZeroEnvError::AlreadyInitialized);
        }
        fs::create_dir_all(directory)?;

        let secrets_path = Self::secrets_path_in(directory);
        let key_path = Self::key_path_in(directory);

        let master_key = keys::generate_master_key();
        let salt = tier.requires_salt().then(kdf::generate_salt);

        fs::write(&key_path, format!("{}\n", keys::encode_key(&master_key)))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&key_path, fs::Permissions::from_mode(0o600))?;
        }

        StoreFile::new(tier, salt.as_ref().map(|s| s.as_slice())).save(&secrets_path)?;

        let working_key = kdf::derive_key(&master_key, tier, salt.as_ref().map(|s| s.as_slice()))?;
        let engine = CipherEngine::new(&working_key);

        info!(directory = %directory.display(), %tier, "initialized secret store");

        Ok(Self {
            directory: directory.to_path_buf(),
            secrets_path,
            key_path,
            engine,
        })
    }

    /// Open an existing store.
    ///
    /// Loads the master key, validates the persisted tier and salt for
    /// consistency, and derives the working key once for this session.
    pub fn open(directory: &Path) -> Result<Self> {
        if !Self::is_initialized(directory) {
            return Err(ZeroEnvError::NotInitialized);
        }

        let secrets_path = Self::secrets_path_in(directory);
        let key_path = Self::key_path_in(directory);

        let master_key = keys::decode_key(&fs::read_to_string(&key_path)?)?;
        let file = StoreFile::load(&secrets_path)?;
        let tier = file.tier();
        let salt = file.decoded_salt()?;

        let working_key = kdf::derive_key(&master_key, tier, salt.as_deref())?;
        let engine = CipherEngine::new(&working_key);

        Ok(Self {
            directory: directory.to_path_buf(),
            secrets_path,
            key_path,
            engine,
        })
    }

    /// The store's base directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the key file (for version-control exclusion by callers).
    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    fn load_file(&self) -> Result<StoreFile> {
        if !self.secrets_path.exists() {
            return Err(ZeroEnvError::NotInitialized);
        }
        StoreFile::load(&self.secrets_path)
    }

    /// Add a secret or overwrite an existing one.
    ///
    /// Each call seals with a fresh nonce, so updating a name with the
    /// same value still produces a new ciphertext.
    pub fn add(&self, name: &str, value: &str) -> Result<()> {
        let mut file = self.load_file()?;
        let sealed = self.engine.seal(value)?;
        file.secrets.insert(
            name.to_string(),
            EncryptedRecord {
                ciphertext: sealed.ciphertext,
                nonce: sealed.nonce,
                updated_at: Utc::now(),
            },
        );
        file.save(&self.secrets_path)?;
        info!(name, "stored secret");
        Ok(())
    }

    /// Decrypt one secret. `Ok(None)` when the name is absent;
    /// `AuthenticationFailure` when the record is corrupted or the
    /// master key is wrong.
    pub fn get(&self, name: &str) -> Result<Option<String>> {
        let file = self.load_file()?;
        match file.secrets.get(name) {
            Some(record) => Ok(Some(self.engine.open(&record.ciphertext, &record.nonce)?)),
            None => Ok(None),
        }
    }

    /// All secret names. Never decrypts anything.
    pub fn list(&self) -> Result<Vec<String>> {
        Ok(self.load_file()?.secrets.keys().cloned().collect())
    }

    /// Remove a secret. Returns whether anything was removed; removing
    /// an absent name is not an error.
    pub fn remove(&self, name: &str) -> Result<bool> {
        let mut file = self.load_file()?;
        let removed = file.secrets.remove(name).is_some();
        if removed {
            file.save(&self.secrets_path)?;
            info!(name, "removed secret");
        }
        Ok(removed)
    }

    /// Decrypt every secret. Fail-fast: one corrupted record fails the
    /// whole call rather than being silently skipped.
    pub fn get_all(&self) -> Result<BTreeMap<String, String>> {
        let file = self.load_file()?;
        let mut result = BTreeMap::new();
        for (name, record) in &file.secrets {
            let value = self.engine.open(&record.ciphertext, &record.nonce)?;
            result.insert(name.clone(), value);
        }
        Ok(result)
    }

    /// The persisted security tier, defaulting legacy files to standard.
    pub fn security_tier(&self) -> Result<SecurityTier> {
        Ok(self.load_file()?.tier())
    }

    /// Metadata for one secret without decrypting it.
    pub fn metadata(&self, name: &str) -> Result<Option<SecretMetadata>> {
        let file = self.load_file()?;
        Ok(file.secrets.get(name).map(|record| SecretMetadata {
            name: name.to_string(),
            updated_at: record.updated_at,
        }))
    }

    /// Number of stored secrets.
    pub fn secret_count(&self) -> Result<usize> {
        Ok(self.load_file()?.secrets.len())
    }
}

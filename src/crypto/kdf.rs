/// Tiered key derivation from the master key.
///
/// The security tier is a one-time decision baked into the store at
/// creation. It trades startup latency for brute-force resistance
/// should the master key file ever leak:
/// - standard: working key = master key (no derivation, no salt)
/// - enhanced: PBKDF2-HMAC-SHA256, 100,000 iterations
/// - max:      PBKDF2-HMAC-SHA256, 500,000 iterations
///
/// Derivation is deterministic: every process invocation against an
/// existing store re-derives the same working key from the persisted
/// master key and salt without the working key ever touching disk.
use std::fmt;
use std::str::FromStr;

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::crypto::sensitive::SensitiveBytes32;
use crate::error::{Result, ZeroEnvError};

pub const SALT_LEN: usize = 16;

const ENHANCED_ITERATIONS: u32 = 100_000;
const MAX_ITERATIONS: u32 = 500_000;

/// Named key-derivation strength profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SecurityTier {
    /// Working key is the master key itself. Default for legacy stores.
    #[default]
    Standard,
    /// PBKDF2 with 100k iterations (balanced).
    Enhanced,
    /// PBKDF2 with 500k iterations (production).
    Max,
}

impl SecurityTier {
    /// PBKDF2 iteration count for this tier. Zero means no derivation.
    pub fn iterations(self) -> u32 {
        match self {
            SecurityTier::Standard => 0,
            SecurityTier::Enhanced => ENHANCED_ITERATIONS,
            SecurityTier::Max => MAX_ITERATIONS,
        }
    }

    /// Whether this tier needs a persisted salt.
    pub fn requires_salt(self) -> bool {
        !matches!(self, SecurityTier::Standard)
    }
}

impl fmt::Display for SecurityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SecurityTier::Standard => "standard",
            SecurityTier::Enhanced => "enhanced",
            SecurityTier::Max => "max",
        };
        f.write_str(name)
    }
}

impl FromStr for SecurityTier {
    type Err = ZeroEnvError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "standard" => Ok(SecurityTier::Standard),
            "enhanced" => Ok(SecurityTier::Enhanced),
            "max" => Ok(SecurityTier::Max),
            other => Err(ZeroEnvError::UnknownTier(other.to_string())),
        }
    }
}

/// Generate a random 16-byte salt for a non-standard tier.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive the 32-byte working key for a tier.
///
/// Standard returns the master key unchanged. Enhanced and max require
/// a salt of exactly 16 bytes and run PBKDF2-HMAC-SHA256 with the
/// tier's iteration count.
pub fn derive_key(
    master_key: &SensitiveBytes32,
    tier: SecurityTier,
    salt: Option<&[u8]>,
) -> Result<SensitiveBytes32> {
    if tier == SecurityTier::Standard {
        return Ok(master_key.clone());
    }

    let salt = salt.ok_or_else(|| {
        ZeroEnvError::InvalidConfiguration(format!("tier '{tier}' requires a salt"))
    })?;
    if salt.len() != SALT_LEN {
        return Err(ZeroEnvError::InvalidConfiguration(format!(
            "salt must be {SALT_LEN} bytes, got {}",
            salt.len()
        )));
    }

    let mut output = [0u8; 32];
    pbkdf2_hmac::<Sha256>(master_key.as_bytes(), salt, tier.iterations(), &mut output);
    Ok(SensitiveBytes32::new(output))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_is_identity() {
        let master = SensitiveBytes32::new([0x42; 32]);
        let derived = derive_key(&master, SecurityTier::Standard, None).unwrap();
        assert_eq!(derived.as_bytes(), master.as_bytes());
    }

    #[test]
    fn test_derive_key_deterministic() {
        let master = SensitiveBytes32::new([0x42; 32]);
        let salt = [0x07u8; SALT_LEN];
        let k1 = derive_key(&master, SecurityTier::Enhanced, Some(&salt)).unwrap();
        let k2 = derive_key(&master, SecurityTier::Enhanced, Some(&salt)).unwrap();
        assert_eq!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_tiers_derive_distinct_keys() {
        let master = SensitiveBytes32::new([0x42; 32]);
        let salt = [0x07u8; SALT_LEN];
        let enhanced = derive_key(&master, SecurityTier::Enhanced, Some(&salt)).unwrap();
        let max = derive_key(&master, SecurityTier::Max, Some(&salt)).unwrap();
        assert_ne!(enhanced.as_bytes(), max.as_bytes());
        assert_ne!(enhanced.as_bytes(), master.as_bytes());
        assert_ne!(max.as_bytes(), master.as_bytes());
    }

    #[test]
    fn test_missing_salt_rejected() {
        let master = SensitiveBytes32::new([0x42; 32]);
        assert!(matches!(
            derive_key(&master, SecurityTier::Enhanced, None),
            Err(ZeroEnvError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_wrong_size_salt_rejected() {
        let master = SensitiveBytes32::new([0x42; 32]);
        assert!(matches!(
            derive_key(&master, SecurityTier::Max, Some(&[0u8; 8])),
            Err(ZeroEnvError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_tier_from_str() {
        assert_eq!("standard".parse::<SecurityTier>().unwrap(), SecurityTier::Standard);
        assert_eq!("Enhanced".parse::<SecurityTier>().unwrap(), SecurityTier::Enhanced);
        assert_eq!("MAX".parse::<SecurityTier>().unwrap(), SecurityTier::Max);
        assert!(matches!(
            "paranoid".parse::<SecurityTier>(),
            Err(ZeroEnvError::UnknownTier(_))
        ));
    }

    #[test]
    fn test_tier_serde_lowercase() {
        assert_eq!(serde_json::to_string(&SecurityTier::Enhanced).unwrap(), "\"enhanced\"");
        let tier: SecurityTier = serde_json::from_str("\"max\"").unwrap();
        assert_eq!(tier, SecurityTier::Max);
    }

    #[test]
    fn test_generate_salt_unique() {
        assert_ne!(generate_salt(), generate_salt());
    }
}

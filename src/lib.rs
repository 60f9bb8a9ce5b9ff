pub mod crypto;
pub mod error;
pub mod report;
pub mod store;

pub use crypto::cipher::{CipherEngine, SealedValue};
pub use crypto::kdf::{derive_key, SecurityTier};
pub use error::{Result, ZeroEnvError};
pub use store::{SecretStore, SecretMetadata};

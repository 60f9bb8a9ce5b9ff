use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZeroEnvError {
    #[error("Key must be exactly 32 bytes")]
    InvalidKeyLength,

    #[error("Unknown security tier: {0}")]
    UnknownTier(String),

    #[error("Invalid store configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Store not initialized - run 'zeroenv init' first")]
    NotInitialized,

    #[error("Store already initialized (refusing to overwrite the master key)")]
    AlreadyInitialized,

    #[error("Authentication failed: record tampered with or wrong master key")]
    AuthenticationFailure,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, ZeroEnvError>;

pub mod cipher;
pub mod kdf;
pub mod keys;
pub mod sensitive;

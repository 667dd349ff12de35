//! Storage-specific error types.
//!
//! These errors stay inside the storage layer and are converted to
//! `coinhub_core::Error` before being returned through the core traits.

use coinhub_core::errors::Error;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid master key: {0}")]
    InvalidKey(String),

    #[error("Encryption failed: {0}")]
    Crypto(String),

    #[error("Store lock poisoned: {0}")]
    LockPoisoned(&'static str),

    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed data: {0}")]
    Seed(#[from] serde_json::Error),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        Error::Repository(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_become_repository_errors() {
        let err: Error = StorageError::LockPoisoned("users").into();
        assert!(matches!(err, Error::Repository(msg) if msg.contains("users")));
    }
}

//! Coinhub Core - exchange connections, market data normalization and token lifecycle.
//!
//! This crate is storage-agnostic. Credential, identity and revocation storage
//! are expressed as traits implemented by the `storage-memory` crate, and
//! venue clients are provided by the `venues` crate.

pub mod auth;
pub mod constants;
pub mod errors;
pub mod exchanges;

// Re-export error types
pub use errors::AdapterError;
pub use errors::Error;
pub use errors::Result;

//! In-memory storage implementation for Coinhub.
//!
//! Implements the store traits defined in `coinhub-core`:
//! - [`MemoryIdentityStore`] for clients, tenants and users
//! - [`MemoryTradingAccountStore`] for venue credentials, encrypted per tenant
//! - [`MemoryRevocationStore`] for the token denylist
//!
//! Stores are populated from a JSON seed file at startup (see [`Seed`]).

pub mod accounts;
pub mod cipher;
pub mod errors;
pub mod identity;
pub mod revocation;
pub mod seed;

pub use accounts::MemoryTradingAccountStore;
pub use cipher::{decode_master_key, CredentialCipher};
pub use errors::StorageError;
pub use identity::MemoryIdentityStore;
pub use revocation::MemoryRevocationStore;
pub use seed::{load_seed, Seed, SeedTradingAccount};

// Re-export from coinhub-core for convenience
pub use coinhub_core::errors::{Error, Result};

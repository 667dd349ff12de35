//! Auth module - token lifecycle, identity records and request sessions.

mod auth_model;
mod auth_traits;
mod timezone;
mod token_service;


// Re-export the public interface
pub use auth_model::{
    Client, DataStatus, Permission, Session, Tenant, TokenClaims, TokenPair, TokenType, User,
};
pub use auth_traits::{IdentityStoreTrait, RevocationStoreTrait, TokenServiceTrait};
pub use timezone::resolve_timezone;
pub use token_service::{TokenService, TokenServiceConfig};

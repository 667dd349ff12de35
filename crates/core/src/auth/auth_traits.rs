//! Identity store, revocation store and token service traits.

use std::time::Duration;

use async_trait::async_trait;

use super::auth_model::{Client, Session, Tenant, TokenPair, User};
use crate::errors::Result;

/// Read path for clients, users and tenants, plus the per-user token version.
///
/// Lookups of unknown records return [`Error::NotFound`](crate::Error::NotFound).
#[async_trait]
pub trait IdentityStoreTrait: Send + Sync {
    async fn get_client(&self, client_id: &str) -> Result<Client>;

    async fn get_user(&self, user_id: &str) -> Result<User>;

    async fn find_user_by_username(&self, username: &str) -> Result<User>;

    async fn get_tenant(&self, tenant_id: &str) -> Result<Tenant>;

    /// Atomically bumps the user's token version and returns the new value.
    async fn increment_token_version(&self, user_id: &str) -> Result<u64>;

    /// Drops any cached copy of the user record.
    async fn evict_user(&self, user_id: &str) -> Result<()>;
}

/// Key-value store with per-entry expiry backing the token denylist.
///
/// Writes must be visible to subsequent reads on the same store.
#[async_trait]
pub trait RevocationStoreTrait: Send + Sync {
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores `value` only if `key` holds nothing. Returns true if it was stored.
    ///
    /// The default is a read followed by a write; stores that can do better
    /// should make it atomic.
    async fn set_if_absent(&self, key: &str, value: &[u8], ttl: Duration) -> Result<bool> {
        if self.get(key).await?.is_some_and(|v| !v.is_empty()) {
            return Ok(false);
        }
        self.set(key, value, ttl).await?;
        Ok(true)
    }
}

/// Issue, validate, refresh and revoke bearer tokens.
#[async_trait]
pub trait TokenServiceTrait: Send + Sync {
    /// Mints an access/refresh pair sharing one token id.
    async fn issue_token_pair(&self, user_id: &str) -> Result<TokenPair>;

    /// Validates an access token and builds the caller's session.
    ///
    /// Every failure is reported as [`Error::Unauthorized`](crate::Error::Unauthorized),
    /// except an unknown timezone.
    async fn validate_access_token(&self, token: &str, timezone: Option<&str>) -> Result<Session>;

    /// Consumes a refresh token and mints a new pair.
    ///
    /// Every failure is reported as [`Error::InvalidToken`](crate::Error::InvalidToken).
    async fn refresh_token_pair(&self, refresh_token: &str) -> Result<TokenPair>;

    /// Invalidates every token issued to the user so far.
    async fn revoke_all_for_user(&self, user_id: &str) -> Result<()>;

    /// Denylists the token id of an access token.
    async fn revoke_token(&self, access_token: &str) -> Result<()>;

    /// Whether a token id is denylisted. Store failures count as revoked.
    async fn is_revoked(&self, jti: &str) -> bool;
}

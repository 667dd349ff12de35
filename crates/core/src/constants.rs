use std::time::Duration;

/// Lifetime of an access token.
pub const ACCESS_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

/// Lifetime of a refresh token.
pub const REFRESH_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Extra retention for revoked access tokens, covers clock skew between nodes.
pub const REVOKED_ACCESS_BUFFER: Duration = Duration::from_secs(23 * 60 * 60);

/// Extra retention for consumed refresh tokens.
pub const REVOKED_REFRESH_BUFFER: Duration = Duration::from_secs(60);

/// Token type advertised to clients.
pub const TOKEN_TYPE_BEARER: &str = "Bearer";

/// Key prefix for entries in the revocation store.
pub const REVOKED_JTI_PREFIX: &str = "jti:";

/// Lookback for venues that require explicit order history bounds.
pub const ORDER_LOOKBACK: Duration = Duration::from_secs(90 * 24 * 60 * 60);

/// Page size for bounded order history requests.
pub const ORDER_HISTORY_LIMIT: u32 = 100;

/// Timezone applied when a request carries none.
pub const DEFAULT_TIMEZONE: &str = "Asia/Ho_Chi_Minh";

/// Builds the revocation store key for a token id.
pub fn revoked_jti_key(jti: &str) -> String {
    format!("{REVOKED_JTI_PREFIX}{jti}")
}

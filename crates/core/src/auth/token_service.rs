use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, info, warn};
use uuid::Uuid;

use super::auth_model::{DataStatus, Session, TokenClaims, TokenPair, TokenType, User};
use super::auth_traits::{IdentityStoreTrait, RevocationStoreTrait, TokenServiceTrait};
use super::timezone::resolve_timezone;
use crate::constants::{
    revoked_jti_key, ACCESS_TOKEN_TTL, REFRESH_TOKEN_TTL, REVOKED_ACCESS_BUFFER,
    REVOKED_REFRESH_BUFFER, TOKEN_TYPE_BEARER,
};
use crate::errors::{Error, Result};

/// Marker stored under a revoked token id.
const REVOKED_MARKER: &[u8] = b"1";

#[derive(Debug, Clone)]
pub struct TokenServiceConfig {
    /// Client registration whose credentials sign every token.
    pub client_id: String,
}

/// Why a presented token was turned down. Only ever logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    SigningClient,
    Malformed,
    WrongType,
    Expired,
    NotYetValid,
    UnknownUser,
    StaleVersion,
    Revoked,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::SigningClient => "signing client unavailable",
            Rejection::Malformed => "malformed or badly signed",
            Rejection::WrongType => "wrong token type",
            Rejection::Expired => "expired",
            Rejection::NotYetValid => "not yet valid",
            Rejection::UnknownUser => "unknown subject",
            Rejection::StaleVersion => "token version superseded",
            Rejection::Revoked => "revoked",
        };
        f.write_str(reason)
    }
}

pub struct TokenService {
    identity_store: Arc<dyn IdentityStoreTrait>,
    revocation_store: Arc<dyn RevocationStoreTrait>,
    client_id: String,
    validation: Validation,
}

impl TokenService {
    pub fn new(
        identity_store: Arc<dyn IdentityStoreTrait>,
        revocation_store: Arc<dyn RevocationStoreTrait>,
        config: TokenServiceConfig,
    ) -> Self {
        // Time claims are checked by hand so failures map onto our own errors.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "nbf", "sub"]);
        Self {
            identity_store,
            revocation_store,
            client_id: config.client_id,
            validation,
        }
    }

    async fn signing_key(&self) -> Result<Vec<u8>> {
        let client = self.identity_store.get_client(&self.client_id).await?;
        Ok(client.signing_key())
    }

    fn sign(&self, key: &[u8], claims: &TokenClaims) -> Result<String> {
        encode(&Header::default(), claims, &EncodingKey::from_secret(key))
            .map_err(|e| Error::InternalServerError(format!("Failed to sign token: {e}")))
    }

    /// Signature, structure and type check. No time or store checks.
    async fn decode_claims(
        &self,
        token: &str,
        expected: TokenType,
    ) -> std::result::Result<TokenClaims, Rejection> {
        let key = self
            .signing_key()
            .await
            .map_err(|_| Rejection::SigningClient)?;
        let claims = decode::<TokenClaims>(token, &DecodingKey::from_secret(&key), &self.validation)
            .map_err(|_| Rejection::Malformed)?
            .claims;
        if claims.token_type != expected {
            return Err(Rejection::WrongType);
        }
        Ok(claims)
    }

    /// Full verification of a presented token.
    async fn verify(
        &self,
        token: &str,
        expected: TokenType,
    ) -> std::result::Result<(TokenClaims, User), Rejection> {
        let claims = self.decode_claims(token, expected).await?;

        let now = Utc::now().timestamp();
        if now > claims.exp {
            return Err(Rejection::Expired);
        }
        if now < claims.nbf {
            return Err(Rejection::NotYetValid);
        }

        let user = self
            .identity_store
            .get_user(&claims.sub)
            .await
            .map_err(|_| Rejection::UnknownUser)?;
        if user.token_version != claims.version {
            return Err(Rejection::StaleVersion);
        }
        if self.is_revoked(&claims.jti).await {
            return Err(Rejection::Revoked);
        }
        Ok((claims, user))
    }

    async fn ensure_active(&self, user: &User) -> Result<()> {
        if user.data_status == DataStatus::Disable {
            debug!("Refusing tokens for disabled user {}", user.id);
            return Err(Error::Forbidden);
        }
        let tenant = self.identity_store.get_tenant(&user.tenant_id).await?;
        if tenant.data_status == DataStatus::Disable {
            debug!("Refusing tokens for user {} of disabled tenant {}", user.id, tenant.id);
            return Err(Error::Forbidden);
        }
        Ok(())
    }
}

fn claims_for(
    user: &User,
    jti: &str,
    token_type: TokenType,
    now: i64,
    ttl: Duration,
) -> TokenClaims {
    TokenClaims {
        jti: jti.to_string(),
        sub: user.id.clone(),
        iat: now,
        nbf: now,
        exp: now + ttl.as_secs() as i64,
        token_type,
        version: user.token_version,
    }
}

#[async_trait]
impl TokenServiceTrait for TokenService {
    async fn issue_token_pair(&self, user_id: &str) -> Result<TokenPair> {
        let key = self.signing_key().await?;
        let user = self.identity_store.get_user(user_id).await?;
        self.ensure_active(&user).await?;

        let jti = Uuid::new_v4().to_string();
        let now = Utc::now().timestamp();
        let access = claims_for(&user, &jti, TokenType::Access, now, ACCESS_TOKEN_TTL);
        let refresh = claims_for(&user, &jti, TokenType::Refresh, now, REFRESH_TOKEN_TTL);

        let pair = TokenPair {
            access_token: self.sign(&key, &access)?,
            refresh_token: self.sign(&key, &refresh)?,
            expires_in: ACCESS_TOKEN_TTL.as_secs(),
            token_type: TOKEN_TYPE_BEARER.to_string(),
        };
        debug!("Issued token pair {} for user {}", jti, user.id);
        Ok(pair)
    }

    async fn validate_access_token(&self, token: &str, timezone: Option<&str>) -> Result<Session> {
        let timezone = resolve_timezone(timezone)?;
        let (_, user) = self.verify(token, TokenType::Access).await.map_err(|reason| {
            debug!("Access token rejected: {}", reason);
            Error::Unauthorized
        })?;
        Ok(Session::for_user(user, timezone, token.to_string()))
    }

    async fn refresh_token_pair(&self, refresh_token: &str) -> Result<TokenPair> {
        let (claims, user) = self
            .verify(refresh_token, TokenType::Refresh)
            .await
            .map_err(|reason| {
                debug!("Refresh token rejected: {}", reason);
                Error::InvalidToken
            })?;

        let now = Utc::now().timestamp();
        let ttl = Duration::from_secs(claims.remaining_secs(now)) + REVOKED_REFRESH_BUFFER;
        let consumed = self
            .revocation_store
            .set_if_absent(&revoked_jti_key(&claims.jti), REVOKED_MARKER, ttl)
            .await
            .map_err(|e| {
                warn!("Failed to consume refresh token {}: {}", claims.jti, e);
                Error::InvalidToken
            })?;
        if !consumed {
            debug!("Refresh token {} was already used", claims.jti);
            return Err(Error::InvalidToken);
        }

        self.issue_token_pair(&user.id).await
    }

    async fn revoke_all_for_user(&self, user_id: &str) -> Result<()> {
        let version = self.identity_store.increment_token_version(user_id).await?;
        self.identity_store.evict_user(user_id).await?;
        info!("Revoked all tokens of user {} (version {})", user_id, version);
        Ok(())
    }

    async fn revoke_token(&self, access_token: &str) -> Result<()> {
        let claims = self
            .decode_claims(access_token, TokenType::Access)
            .await
            .map_err(|reason| {
                debug!("Cannot revoke token: {}", reason);
                Error::InvalidToken
            })?;

        let now = Utc::now().timestamp();
        let ttl = Duration::from_secs(claims.remaining_secs(now)) + REVOKED_ACCESS_BUFFER;
        self.revocation_store
            .set(&revoked_jti_key(&claims.jti), REVOKED_MARKER, ttl)
            .await?;
        info!("Revoked token {} of user {}", claims.jti, claims.sub);
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> bool {
        match self.revocation_store.get(&revoked_jti_key(jti)).await {
            Ok(value) => value.is_some_and(|bytes| !bytes.is_empty()),
            Err(e) => {
                warn!("Revocation store unavailable, treating {} as revoked: {}", jti, e);
                true
            }
        }
    }
}

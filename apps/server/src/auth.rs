use std::sync::Arc;

use argon2::{
    password_hash::{Error as PasswordHashError, PasswordHash, PasswordVerifier},
    Argon2,
};
use axum::{
    body::Body,
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;

use coinhub_core::auth::{Permission, Session, User};
use coinhub_core::Error as CoreError;

use crate::error::{ApiError, ApiResult};
use crate::main_lib::AppState;

const TIMEZONE_HEADER: &str = "timezone";

/// Credentials that may also travel in the query string.
#[derive(Debug, Default, Deserialize)]
struct CredentialQuery {
    access_token: Option<String>,
    timezone: Option<String>,
}

fn credential_query(request: &Request<Body>) -> CredentialQuery {
    Query::<CredentialQuery>::try_from_uri(request.uri())
        .map(|Query(query)| query)
        .unwrap_or_default()
}

/// Splits an `Authorization` header into scheme and value.
fn authorization<'a>(headers: &'a HeaderMap, scheme: &str) -> Option<&'a str> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let mut parts = header.splitn(2, ' ');
    let (Some(found), Some(value)) = (parts.next(), parts.next()) else {
        return None;
    };
    if !found.eq_ignore_ascii_case(scheme) {
        return None;
    }
    Some(value.trim()).filter(|v| !v.is_empty())
}

fn bearer_token(request: &Request<Body>, query: &CredentialQuery) -> Option<String> {
    authorization(request.headers(), "Bearer")
        .map(str::to_string)
        .or_else(|| {
            query
                .access_token
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
        })
}

fn timezone<'a>(request: &'a Request<Body>, query: &'a CredentialQuery) -> Option<&'a str> {
    request
        .headers()
        .get(TIMEZONE_HEADER)
        .and_then(|v| v.to_str().ok())
        .or(query.timezone.as_deref())
        .map(str::trim)
        .filter(|tz| !tz.is_empty())
}

/// Validates the bearer token and attaches the caller's [`Session`].
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> ApiResult<Response> {
    let query = credential_query(&request);
    let token = bearer_token(&request, &query).ok_or(CoreError::Unauthorized)?;
    let session = state
        .token_service
        .validate_access_token(&token, timezone(&request, &query))
        .await?;
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// Rejects the session unless it holds at least one of `required`.
pub fn ensure_permission(session: &Session, required: &[Permission]) -> ApiResult<()> {
    if session.has_any_permission(required) {
        Ok(())
    } else {
        tracing::debug!("User {} lacks any of {:?}", session.user_id, required);
        Err(CoreError::Forbidden.into())
    }
}

/// Checks a login password against the user's Argon2 hash.
pub fn verify_password(user: &User, candidate: &str) -> ApiResult<()> {
    if user.password_hash.is_empty() {
        return Err(CoreError::Unauthorized.into());
    }
    let parsed = PasswordHash::new(&user.password_hash)
        .map_err(|e| ApiError::Internal(format!("Invalid password hash for user: {e}")))?;
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .map_err(|err| match err {
            PasswordHashError::Password => CoreError::Unauthorized.into(),
            other => ApiError::Internal(format!("Password verification failed: {other}")),
        })
}

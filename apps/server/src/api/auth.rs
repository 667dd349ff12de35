use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use coinhub_core::auth::{Permission, Session, TokenPair};
use coinhub_core::Error as CoreError;

use crate::{auth::verify_password, error::ApiResult, main_lib::AppState};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Public view of the caller's session.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user_id: String,
    pub tenant_id: String,
    pub username: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub permissions: Vec<Permission>,
    pub is_root: bool,
    pub is_tenant: bool,
    pub timezone: String,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            user_id: session.user_id,
            tenant_id: session.tenant_id,
            username: session.username,
            name: session.name,
            email: session.email,
            phone: session.phone,
            permissions: session.permissions,
            is_root: session.is_root,
            is_tenant: session.is_tenant,
            timezone: session.timezone.name().to_string(),
        }
    }
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<TokenPair>> {
    let user = match state
        .identity_store
        .find_user_by_username(payload.username.trim())
        .await
    {
        Ok(user) => user,
        Err(CoreError::NotFound(_)) => {
            tracing::debug!("Login for unknown user rejected");
            return Err(CoreError::Unauthorized.into());
        }
        Err(e) => return Err(e.into()),
    };
    verify_password(&user, &payload.password)?;
    let pair = state.token_service.issue_token_pair(&user.id).await?;
    tracing::info!("User {} logged in", user.id);
    Ok(Json(pair))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshRequest>,
) -> ApiResult<Json<TokenPair>> {
    let pair = state
        .token_service
        .refresh_token_pair(&payload.refresh_token)
        .await?;
    Ok(Json(pair))
}

async fn revoke(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> ApiResult<StatusCode> {
    state.token_service.revoke_token(&session.access_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn revoke_all(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> ApiResult<StatusCode> {
    state
        .token_service
        .revoke_all_for_user(&session.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn current_session(Extension(session): Extension<Session>) -> Json<SessionResponse> {
    Json(session.into())
}

/// Routes that need a valid access token.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/revoke", post(revoke))
        .route("/auth/revoke-all", post(revoke_all))
        .route("/auth/session", get(current_session))
}

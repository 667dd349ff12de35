use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Deserialize;

use coinhub_core::auth::{DataStatus, Permission, Session};
use coinhub_core::exchanges::{Exchange, TradingAccount};
use coinhub_core::Error as CoreError;

use crate::{auth::ensure_permission, error::ApiResult, main_lib::AppState};

/// Body of `PUT /trading-accounts/{id}`. Secrets are sent in the clear and
/// sealed by the store.
#[derive(Deserialize)]
pub struct TradingAccountRequest {
    #[serde(default)]
    pub name: String,
    pub exchange: Exchange,
    #[serde(default)]
    pub sandbox: bool,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    #[serde(default)]
    pub api_password: String,
    #[serde(default)]
    pub data_status: DataStatus,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub data_status: DataStatus,
}

async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> ApiResult<Json<Vec<String>>> {
    ensure_permission(&session, &[Permission::TraderView])?;
    Ok(Json(state.accounts.list_for_tenant(&session.tenant_id)?))
}

/// Creates or replaces an account of the caller's tenant. Cached connections
/// built from the old credentials are dropped.
async fn put_account(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(body): Json<TradingAccountRequest>,
) -> ApiResult<StatusCode> {
    ensure_permission(
        &session,
        &[Permission::TraderCreate, Permission::TraderUpdate],
    )?;
    state.accounts.upsert(TradingAccount {
        id: id.clone(),
        name: body.name,
        exchange: body.exchange,
        tenant_id: session.tenant_id.clone(),
        sandbox: body.sandbox,
        api_key: body.api_key,
        api_secret: body.api_secret,
        api_password: body.api_password,
        data_status: body.data_status,
    })?;
    let evicted = state.exchange_service.evict_trading_account(&id);
    tracing::info!(
        "Stored trading account {} ({} connections evicted)",
        id, evicted
    );
    Ok(StatusCode::NO_CONTENT)
}

async fn set_status(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> ApiResult<StatusCode> {
    ensure_permission(&session, &[Permission::TraderUpdate])?;
    state
        .accounts
        .set_status(&session.tenant_id, &id, body.data_status)?;
    state.exchange_service.evict_trading_account(&id);
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    ensure_permission(&session, &[Permission::TraderUpdate])?;
    if !state.accounts.remove(&session.tenant_id, &id)? {
        return Err(CoreError::TraderNotFound(id).into());
    }
    state.exchange_service.evict_trading_account(&id);
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/trading-accounts", get(list_accounts))
        .route(
            "/trading-accounts/{id}",
            put(put_account).delete(delete_account),
        )
        .route("/trading-accounts/{id}/status", put(set_status))
}

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{auth::require_session, config::Config, main_lib::AppState};

mod auth;
pub mod exchanges;
mod trading_accounts;

pub use self::auth::SessionResponse;

async fn healthz() -> &'static str {
    "ok"
}

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let public = Router::new()
        .route("/healthz", get(healthz))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh));

    let protected = Router::new()
        .merge(auth::router())
        .merge(exchanges::router())
        .merge(trading_accounts::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    let api = Router::new().merge(public).merge(protected);

    with_http_layers(Router::new().nest("/api/v1", api).with_state(state), config)
}

/// Wraps the router in CORS, request id, timeout and trace layers.
///
/// The timeout layer gets [`Config::http_timeout`], which outlasts the
/// exchange deadline so venue timeouts answer with the JSON 504 body.
fn with_http_layers(router: Router, config: &Config) -> Router {
    let cors = if config.cors_allow.iter().any(|origin| origin == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_allow
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect::<Vec<_>>();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    router
        .layer(cors)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(config.http_timeout()))
        .layer(TraceLayer::new_for_http())
}

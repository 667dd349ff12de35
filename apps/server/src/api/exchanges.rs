use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::Deserialize;

use coinhub_core::auth::{Permission, Session};
use coinhub_core::exchanges::{
    Balance, ConnectionIdentity, Currency, Exchange, Market, MarketType, NewOrder, Ohlcv, Order,
    OrderBook, Ticker, Trade,
};

use crate::{
    auth::ensure_permission,
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

/// Query parameters shared by the exchange routes.
#[derive(Debug, Default, Deserialize)]
pub struct ExchangeQuery {
    #[serde(default)]
    pub sandbox: bool,
    /// Trading account to act as. Absent for public market data.
    pub trader_id: Option<String>,
    pub market_type: Option<MarketType>,
    /// Comma separated unified symbols.
    pub symbols: Option<String>,
    pub symbol: Option<String>,
    pub timeframe: Option<String>,
}

impl ExchangeQuery {
    fn trader_id(&self) -> Option<&str> {
        self.trader_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }

    fn required(value: &Option<String>, name: &str) -> ApiResult<String> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest(format!("{name} is required")))
    }

    fn symbol(&self) -> ApiResult<String> {
        Self::required(&self.symbol, "symbol")
    }

    fn symbol_list(&self) -> Vec<String> {
        self.symbols
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Resolves the connection identity for a request. The tenant always comes
/// from the session.
pub(crate) fn identity(
    exchange: &str,
    session: &Session,
    query: &ExchangeQuery,
) -> ApiResult<ConnectionIdentity> {
    let exchange: Exchange = exchange.parse()?;
    Ok(match query.trader_id() {
        Some(trader_id) => ConnectionIdentity::for_account(
            exchange,
            session.tenant_id.clone(),
            trader_id,
            query.sandbox,
        ),
        None => ConnectionIdentity::anonymous(exchange, query.sandbox),
    })
}

/// Like [`identity`], but the route needs a trading account.
pub(crate) fn account_identity(
    exchange: &str,
    session: &Session,
    query: &ExchangeQuery,
) -> ApiResult<ConnectionIdentity> {
    if query.trader_id().is_none() {
        return Err(ApiError::BadRequest("trader_id is required".to_string()));
    }
    identity(exchange, session, query)
}

async fn list_exchanges(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> ApiResult<Json<Vec<Exchange>>> {
    ensure_permission(&session, &[Permission::CoinView])?;
    Ok(Json(state.exchange_service.exchanges()))
}

async fn get_symbols(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(exchange): Path<String>,
    Query(query): Query<ExchangeQuery>,
) -> ApiResult<Json<Vec<String>>> {
    ensure_permission(&session, &[Permission::CoinView])?;
    let identity = identity(&exchange, &session, &query)?;
    Ok(Json(state.exchange_service.symbols(&identity).await?))
}

async fn get_timeframes(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(exchange): Path<String>,
    Query(query): Query<ExchangeQuery>,
) -> ApiResult<Json<Vec<String>>> {
    ensure_permission(&session, &[Permission::CoinView])?;
    let identity = identity(&exchange, &session, &query)?;
    Ok(Json(state.exchange_service.timeframes(&identity).await?))
}

async fn get_currencies(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(exchange): Path<String>,
    Query(query): Query<ExchangeQuery>,
) -> ApiResult<Json<Vec<Currency>>> {
    ensure_permission(&session, &[Permission::CoinView])?;
    let identity = identity(&exchange, &session, &query)?;
    Ok(Json(state.exchange_service.currencies(&identity).await?))
}

async fn get_markets(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(exchange): Path<String>,
    Query(query): Query<ExchangeQuery>,
) -> ApiResult<Json<Vec<Market>>> {
    ensure_permission(&session, &[Permission::CoinView])?;
    let identity = identity(&exchange, &session, &query)?;
    let market_type = query.market_type.unwrap_or(MarketType::Spot);
    Ok(Json(state.exchange_service.markets(&identity, market_type).await?))
}

async fn get_tickers(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(exchange): Path<String>,
    Query(query): Query<ExchangeQuery>,
) -> ApiResult<Json<Vec<Ticker>>> {
    ensure_permission(&session, &[Permission::CoinView])?;
    let identity = identity(&exchange, &session, &query)?;
    let symbols = query.symbol_list();
    Ok(Json(state.exchange_service.tickers(&identity, &symbols).await?))
}

async fn get_ohlcv(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(exchange): Path<String>,
    Query(query): Query<ExchangeQuery>,
) -> ApiResult<Json<Vec<Ohlcv>>> {
    ensure_permission(&session, &[Permission::CoinView])?;
    let identity = identity(&exchange, &session, &query)?;
    let symbol = query.symbol()?;
    let timeframe = ExchangeQuery::required(&query.timeframe, "timeframe")?;
    let candles = state
        .exchange_service
        .ohlcv(&identity, &symbol, &timeframe)
        .await?;
    Ok(Json(candles))
}

async fn get_trades(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(exchange): Path<String>,
    Query(query): Query<ExchangeQuery>,
) -> ApiResult<Json<Vec<Trade>>> {
    ensure_permission(&session, &[Permission::CoinView])?;
    let identity = identity(&exchange, &session, &query)?;
    let symbol = query.symbol()?;
    Ok(Json(state.exchange_service.trades(&identity, &symbol).await?))
}

async fn get_order_book(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(exchange): Path<String>,
    Query(query): Query<ExchangeQuery>,
) -> ApiResult<Json<OrderBook>> {
    ensure_permission(&session, &[Permission::CoinView])?;
    let identity = identity(&exchange, &session, &query)?;
    let symbol = query.symbol()?;
    Ok(Json(state.exchange_service.order_book(&identity, &symbol).await?))
}

async fn get_balances(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(exchange): Path<String>,
    Query(query): Query<ExchangeQuery>,
) -> ApiResult<Json<Vec<Balance>>> {
    ensure_permission(&session, &[Permission::CoinView])?;
    let identity = account_identity(&exchange, &session, &query)?;
    let market_type = query.market_type.unwrap_or(MarketType::Spot);
    Ok(Json(state.exchange_service.balances(&identity, market_type).await?))
}

async fn get_orders(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(exchange): Path<String>,
    Query(query): Query<ExchangeQuery>,
) -> ApiResult<Json<Vec<Order>>> {
    ensure_permission(&session, &[Permission::CoinView])?;
    let identity = account_identity(&exchange, &session, &query)?;
    let symbol = query.symbol()?;
    Ok(Json(state.exchange_service.orders(&identity, &symbol).await?))
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(exchange): Path<String>,
    Query(query): Query<ExchangeQuery>,
    Json(order): Json<NewOrder>,
) -> ApiResult<Json<Order>> {
    ensure_permission(&session, &[Permission::CoinCreate])?;
    let identity = account_identity(&exchange, &session, &query)?;
    Ok(Json(state.exchange_service.create_order(&identity, &order).await?))
}

async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path((exchange, order_id)): Path<(String, String)>,
    Query(query): Query<ExchangeQuery>,
) -> ApiResult<Json<Order>> {
    ensure_permission(&session, &[Permission::CoinUpdate])?;
    let identity = account_identity(&exchange, &session, &query)?;
    let order = state
        .exchange_service
        .cancel_order(&identity, &order_id, query.symbol.as_deref())
        .await?;
    Ok(Json(order))
}

async fn reload_markets(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(exchange): Path<String>,
    Query(query): Query<ExchangeQuery>,
) -> ApiResult<StatusCode> {
    ensure_permission(&session, &[Permission::CoinUpdate])?;
    let identity = identity(&exchange, &session, &query)?;
    state.exchange_service.reload_markets(&identity).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_connection(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(exchange): Path<String>,
    Query(query): Query<ExchangeQuery>,
) -> ApiResult<StatusCode> {
    ensure_permission(&session, &[Permission::CoinUpdate])?;
    let identity = identity(&exchange, &session, &query)?;
    if state.exchange_service.del_connection(&identity) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Ok(StatusCode::NOT_FOUND)
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/exchanges", get(list_exchanges))
        .route("/exchanges/{exchange}/symbols", get(get_symbols))
        .route("/exchanges/{exchange}/timeframes", get(get_timeframes))
        .route("/exchanges/{exchange}/currencies", get(get_currencies))
        .route("/exchanges/{exchange}/markets", get(get_markets))
        .route("/exchanges/{exchange}/markets/reload", post(reload_markets))
        .route("/exchanges/{exchange}/tickers", get(get_tickers))
        .route("/exchanges/{exchange}/ohlcv", get(get_ohlcv))
        .route("/exchanges/{exchange}/trades", get(get_trades))
        .route("/exchanges/{exchange}/orderbook", get(get_order_book))
        .route("/exchanges/{exchange}/balances", get(get_balances))
        .route(
            "/exchanges/{exchange}/orders",
            get(get_orders).post(create_order),
        )
        .route(
            "/exchanges/{exchange}/orders/{order_id}/cancel",
            post(cancel_order),
        )
        .route("/exchanges/{exchange}/connections", delete(delete_connection))
}

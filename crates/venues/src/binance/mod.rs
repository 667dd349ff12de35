//! Binance spot and cross-margin REST client.
//!
//! Public endpoints need no key. Account and order endpoints are signed with
//! HMAC-SHA256 over the query string and carry the key in `X-MBX-APIKEY`.
//! The sandbox is the spot testnet, which has no margin or capital endpoints.
//!
//! API documentation: https://developers.binance.com/docs/binance-spot-api-docs

mod models;
mod symbols;

use std::collections::BTreeSet;
use std::sync::{RwLock, RwLockReadGuard};

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;

use coinhub_core::exchanges::{
    AdapterResult, Credentials, Exchange, ExchangeAdapter, MarketType, NewOrder, OrderSide,
    OrderType, OrderWindow, RawBalances, RawCurrency, RawMarket, RawOhlcv, RawOrder,
    RawOrderBook, RawTicker, RawTrade, SupportsSandbox,
};
use coinhub_core::AdapterError;

use crate::errors::{network_error, parse_error, status_error};
use crate::signing::sign;
use models::{
    asset_currency, balance, kline_to_raw, CoinInfo, Depth, ExchangeInfo, MarginAccount,
    OrderInfo, PublicTrade, SpotAccount, SymbolInfo, Ticker24h,
};
use symbols::SymbolMap;

pub const LIVE_URL: &str = "https://api.binance.com";
pub const TESTNET_URL: &str = "https://testnet.binance.vision";

const RECV_WINDOW_MS: &str = "5000";
const KLINE_LIMIT: &str = "500";
const DEPTH_LIMIT: &str = "100";
const TRADES_LIMIT: &str = "500";

const TIMEFRAMES: [&str; 16] = [
    "1s", "1m", "3m", "5m", "15m", "30m", "1h", "2h", "4h", "6h", "8h", "12h", "1d", "3d", "1w",
    "1M",
];

#[derive(Debug, Default)]
struct MarketState {
    markets: Vec<RawMarket>,
    currencies: Vec<RawCurrency>,
    symbols: SymbolMap,
}

pub struct BinanceAdapter {
    http: Client,
    credentials: Option<Credentials>,
    base_url: String,
    sandbox: bool,
    state: RwLock<MarketState>,
}

type Params = Vec<(&'static str, String)>;

impl BinanceAdapter {
    pub fn new(http: Client, credentials: Option<Credentials>) -> Self {
        Self {
            http,
            credentials,
            base_url: LIVE_URL.to_string(),
            sandbox: false,
            state: RwLock::new(MarketState::default()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn state(&self) -> RwLockReadGuard<'_, MarketState> {
        self.state.read().unwrap_or_else(|poisoned| {
            warn!("Binance market state lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn market_id(&self, symbol: &str) -> String {
        self.state().symbols.market_id(symbol)
    }

    fn credentials(&self) -> AdapterResult<&Credentials> {
        self.credentials.as_ref().ok_or_else(|| {
            AdapterError::Authentication("This operation requires API credentials".to_string())
        })
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> AdapterResult<T> {
        let response = request.send().await.map_err(network_error)?;
        let status = response.status();
        let body = response.text().await.map_err(network_error)?;
        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        serde_json::from_str(&body).map_err(parse_error)
    }

    async fn public<T: DeserializeOwned>(&self, path: &str, params: &Params) -> AdapterResult<T> {
        debug!("Binance request: GET {} with {} params", path, params.len());
        let url = format!("{}{}", self.base_url, path);
        self.send(self.http.get(url).query(params)).await
    }

    async fn signed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        mut params: Params,
    ) -> AdapterResult<T> {
        let credentials = self.credentials()?;
        params.push(("recvWindow", RECV_WINDOW_MS.to_string()));
        params.push(("timestamp", Utc::now().timestamp_millis().to_string()));
        let query = serde_urlencoded::to_string(&params)
            .map_err(|e| AdapterError::InvalidResponse(format!("Failed to encode query: {e}")))?;
        let signature = sign(&credentials.api_secret, &query)?;

        debug!("Binance request: {} {} (signed)", method, path);
        let url = format!("{}{}?{}&signature={}", self.base_url, path, query, signature);
        let request = self
            .http
            .request(method, url)
            .header("X-MBX-APIKEY", &credentials.api_key);
        self.send(request).await
    }

    /// Full coin list with networks. Needs a key and is absent on the testnet.
    async fn fetch_coin_info(&self) -> AdapterResult<Vec<RawCurrency>> {
        let coins: Vec<CoinInfo> = self
            .signed(Method::GET, "/sapi/v1/capital/config/getall", Vec::new())
            .await?;
        Ok(coins.into_iter().map(RawCurrency::from).collect())
    }

    async fn fetch_orders(&self, window: &OrderWindow, open: bool) -> AdapterResult<Vec<RawOrder>> {
        let mut params: Params = vec![("symbol", self.market_id(&window.symbol))];
        let path = if open {
            "/api/v3/openOrders"
        } else {
            if let Some(since) = window.since {
                params.push(("startTime", since.to_string()));
            }
            if let Some(until) = window.until {
                params.push(("endTime", until.to_string()));
            }
            if let Some(limit) = window.limit {
                params.push(("limit", limit.to_string()));
            }
            "/api/v3/allOrders"
        };

        let orders: Vec<OrderInfo> = self.signed(Method::GET, path, params).await?;
        let symbols = self.state().symbols.clone();
        Ok(orders
            .into_iter()
            .filter(|order| open || !order.is_open())
            .map(|order| order.into_raw(&symbols))
            .collect())
    }
}

impl SupportsSandbox for BinanceAdapter {
    fn set_sandbox_mode(&mut self, enabled: bool) {
        self.sandbox = enabled;
        self.base_url = if enabled { TESTNET_URL } else { LIVE_URL }.to_string();
    }
}

#[async_trait]
impl ExchangeAdapter for BinanceAdapter {
    fn exchange(&self) -> Exchange {
        Exchange::Binance
    }

    fn as_sandbox_mut(&mut self) -> Option<&mut dyn SupportsSandbox> {
        Some(self)
    }

    async fn load_markets(&self) -> AdapterResult<()> {
        let info: ExchangeInfo = self.public("/api/v3/exchangeInfo", &Vec::new()).await?;
        let listed: Vec<SymbolInfo> = info
            .symbols
            .into_iter()
            .filter(|s| s.status != "BREAK")
            .collect();

        let currencies = match (&self.credentials, self.sandbox) {
            (Some(_), false) => match self.fetch_coin_info().await {
                Ok(coins) => Some(coins),
                Err(e) => {
                    warn!("Binance coin info unavailable, using market assets: {}", e);
                    None
                }
            },
            _ => None,
        };
        let currencies = currencies.unwrap_or_else(|| {
            listed
                .iter()
                .flat_map(|s| [s.base_asset.as_str(), s.quote_asset.as_str()])
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(asset_currency)
                .collect()
        });

        let state = MarketState {
            markets: listed.iter().map(SymbolInfo::to_raw).collect(),
            currencies,
            symbols: SymbolMap::from_markets(&listed),
        };
        debug!(
            "Loaded {} Binance markets and {} currencies",
            state.markets.len(),
            state.currencies.len()
        );
        *self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
        Ok(())
    }

    fn symbols(&self) -> Vec<String> {
        self.state()
            .markets
            .iter()
            .filter_map(|m| m.symbol.clone())
            .collect()
    }

    fn timeframes(&self) -> Vec<String> {
        TIMEFRAMES.iter().map(|tf| tf.to_string()).collect()
    }

    fn markets(&self) -> Vec<RawMarket> {
        self.state().markets.clone()
    }

    fn currencies(&self) -> Vec<RawCurrency> {
        self.state().currencies.clone()
    }

    async fn fetch_tickers(&self, symbols: &[String]) -> AdapterResult<Vec<RawTicker>> {
        let ids: Vec<String> = symbols.iter().map(|s| self.market_id(s)).collect();
        let ids = serde_json::to_string(&ids).map_err(parse_error)?;
        let tickers: Vec<Ticker24h> = self
            .public("/api/v3/ticker/24hr", &vec![("symbols", ids)])
            .await?;
        let map = self.state().symbols.clone();
        Ok(tickers.into_iter().map(|t| t.into_raw(&map)).collect())
    }

    async fn fetch_ohlcv(&self, symbol: &str, timeframe: &str) -> AdapterResult<Vec<RawOhlcv>> {
        if !TIMEFRAMES.contains(&timeframe) {
            return Err(AdapterError::NotSupported(format!(
                "Binance has no {timeframe} timeframe"
            )));
        }
        let params = vec![
            ("symbol", self.market_id(symbol)),
            ("interval", timeframe.to_string()),
            ("limit", KLINE_LIMIT.to_string()),
        ];
        let rows: Vec<Vec<Value>> = self.public("/api/v3/klines", &params).await?;
        rows.iter()
            .map(|row| {
                kline_to_raw(row).ok_or_else(|| {
                    AdapterError::InvalidResponse("Kline row without open time".to_string())
                })
            })
            .collect()
    }

    async fn fetch_trades(&self, symbol: &str) -> AdapterResult<Vec<RawTrade>> {
        let params = vec![
            ("symbol", self.market_id(symbol)),
            ("limit", TRADES_LIMIT.to_string()),
        ];
        let trades: Vec<PublicTrade> = self.public("/api/v3/trades", &params).await?;
        Ok(trades.into_iter().map(|t| t.into_raw(symbol)).collect())
    }

    async fn fetch_order_book(&self, symbol: &str) -> AdapterResult<RawOrderBook> {
        let params = vec![
            ("symbol", self.market_id(symbol)),
            ("limit", DEPTH_LIMIT.to_string()),
        ];
        let depth: Depth = self.public("/api/v3/depth", &params).await?;
        Ok(depth.into_raw(symbol))
    }

    async fn fetch_balance(&self, market_type: MarketType) -> AdapterResult<RawBalances> {
        match market_type {
            MarketType::Spot => {
                let account: SpotAccount =
                    self.signed(Method::GET, "/api/v3/account", Vec::new()).await?;
                Ok(account
                    .balances
                    .into_iter()
                    .map(|b| (b.asset, balance(&b.free, &b.locked)))
                    .collect())
            }
            MarketType::Margin if self.sandbox => Err(AdapterError::NotSupported(
                "The Binance testnet has no margin account".to_string(),
            )),
            MarketType::Margin => {
                let account: MarginAccount = self
                    .signed(Method::GET, "/sapi/v1/margin/account", Vec::new())
                    .await?;
                Ok(account
                    .user_assets
                    .into_iter()
                    .map(|a| (a.asset, balance(&a.free, &a.locked)))
                    .collect())
            }
        }
    }

    async fn fetch_closed_orders(&self, window: &OrderWindow) -> AdapterResult<Vec<RawOrder>> {
        self.fetch_orders(window, false).await
    }

    async fn fetch_open_orders(&self, window: &OrderWindow) -> AdapterResult<Vec<RawOrder>> {
        self.fetch_orders(window, true).await
    }

    async fn create_order(&self, order: &NewOrder) -> AdapterResult<RawOrder> {
        let mut params: Params = vec![
            ("symbol", self.market_id(&order.symbol)),
            (
                "side",
                match order.order_side {
                    OrderSide::Buy => "BUY",
                    OrderSide::Sell => "SELL",
                }
                .to_string(),
            ),
        ];
        match order.order_type {
            OrderType::Market => params.push(("type", "MARKET".to_string())),
            OrderType::Limit => {
                let price = order.price.ok_or_else(|| {
                    AdapterError::Exchange {
                        code: -1102,
                        message: "Limit orders need a price".to_string(),
                    }
                })?;
                params.push(("type", "LIMIT".to_string()));
                params.push(("timeInForce", "GTC".to_string()));
                params.push(("price", price.to_string()));
            }
        }
        params.push(("quantity", order.amount.to_string()));
        params.push(("newOrderRespType", "RESULT".to_string()));

        let placed: OrderInfo = self.signed(Method::POST, "/api/v3/order", params).await?;
        Ok(placed.into_raw(&self.state().symbols))
    }

    async fn cancel_order(&self, order_id: &str, symbol: Option<&str>) -> AdapterResult<RawOrder> {
        let symbol = symbol.ok_or_else(|| {
            AdapterError::NotSupported("Binance needs the symbol to cancel an order".to_string())
        })?;
        let params: Params = vec![
            ("symbol", self.market_id(symbol)),
            ("orderId", order_id.to_string()),
        ];
        let canceled: OrderInfo = self.signed(Method::DELETE, "/api/v3/order", params).await?;
        Ok(canceled.into_raw(&self.state().symbols))
    }
}

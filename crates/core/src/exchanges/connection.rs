//! A materialized venue connection.
//!
//! Wraps one adapter together with the market metadata captured by the last
//! load. The cached lists are only refreshed by an explicit
//! [`ExchangeConnection::load_markets`] call.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::OnceCell;

use super::adapter::ExchangeAdapter;
use super::exchanges_model::{ConnectionIdentity, Exchange, MarketType, NewOrder, OrderWindow};
use super::market_model::{
    merge_orders, Balance, Currency, Market, Ohlcv, Order, OrderBook, Ticker, Trade,
};
use super::timeframes::sort_timeframes;
use crate::constants::{ORDER_HISTORY_LIMIT, ORDER_LOOKBACK};
use crate::errors::{AdapterError, Error, Result};

#[derive(Debug, Default)]
struct MarketCache {
    symbols: Vec<String>,
    timeframes: Vec<String>,
    markets: Vec<Market>,
    currencies: Vec<Currency>,
}

pub struct ExchangeConnection {
    identity: ConnectionIdentity,
    adapter: Box<dyn ExchangeAdapter>,
    cache: RwLock<MarketCache>,
    signed_in: OnceCell<()>,
}

impl std::fmt::Debug for ExchangeConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeConnection")
            .field("identity", &self.identity)
            .field("signed_in", &self.signed_in.initialized())
            .finish_non_exhaustive()
    }
}

impl ExchangeConnection {
    pub fn new(identity: ConnectionIdentity, adapter: Box<dyn ExchangeAdapter>) -> Self {
        Self {
            identity,
            adapter,
            cache: RwLock::new(MarketCache::default()),
            signed_in: OnceCell::new(),
        }
    }

    pub fn identity(&self) -> &ConnectionIdentity {
        &self.identity
    }

    pub fn exchange(&self) -> Exchange {
        self.identity.exchange
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, MarketCache> {
        self.cache.read().unwrap_or_else(|poisoned| {
            warn!("Market cache lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, MarketCache> {
        self.cache.write().unwrap_or_else(|poisoned| {
            warn!("Market cache lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn venue_error(&self, operation: &'static str) -> impl FnOnce(AdapterError) -> Error + '_ {
        move |err| {
            debug!("{} {} failed: {}", self.identity, operation, err);
            Error::BadRequest(err)
        }
    }

    /// Fetches market metadata from the venue and replaces the cached lists.
    ///
    /// Symbols are de-duplicated and sorted, timeframes sorted by duration.
    pub async fn load_markets(&self) -> Result<()> {
        self.adapter
            .load_markets()
            .await
            .map_err(self.venue_error("load_markets"))?;

        let mut symbols = self.adapter.symbols();
        symbols.sort();
        symbols.dedup();

        let mut timeframes = self.adapter.timeframes();
        sort_timeframes(&mut timeframes);

        let markets: Vec<Market> = self.adapter.markets().into_iter().map(Market::from).collect();

        let mut currencies: Vec<Currency> = self
            .adapter
            .currencies()
            .into_iter()
            .map(Currency::from)
            .collect();
        currencies.sort_by(|a, b| a.code.cmp(&b.code));

        info!(
            "Loaded {} markets ({} symbols, {} currencies) for {}",
            markets.len(),
            symbols.len(),
            currencies.len(),
            self.identity
        );

        *self.write_cache() = MarketCache {
            symbols,
            timeframes,
            markets,
            currencies,
        };
        Ok(())
    }

    /// Performs the venue handshake once, when the venue requires one.
    ///
    /// Concurrent callers share a single in-flight sign-in. A failed attempt
    /// is retried by the next caller.
    pub async fn ensure_signed_in(&self) -> Result<()> {
        let Some(sign_in) = self.adapter.as_sign_in() else {
            return Ok(());
        };
        self.signed_in
            .get_or_try_init(|| async {
                debug!("Signing in to {}", self.identity);
                sign_in.sign_in().await.map_err(self.venue_error("sign_in"))
            })
            .await?;
        Ok(())
    }

    pub fn symbols(&self) -> Vec<String> {
        self.read_cache().symbols.clone()
    }

    pub fn timeframes(&self) -> Vec<String> {
        self.read_cache().timeframes.clone()
    }

    pub fn currencies(&self) -> Vec<Currency> {
        self.read_cache().currencies.clone()
    }

    /// Cached markets matching the spot or margin flag.
    pub fn markets(&self, market_type: MarketType) -> Vec<Market> {
        self.read_cache()
            .markets
            .iter()
            .filter(|market| match market_type {
                MarketType::Spot => market.spot,
                MarketType::Margin => market.margin,
            })
            .cloned()
            .collect()
    }

    pub async fn tickers(&self, symbols: &[String]) -> Result<Vec<Ticker>> {
        let raw = self
            .adapter
            .fetch_tickers(symbols)
            .await
            .map_err(self.venue_error("fetch_tickers"))?;
        let mut tickers: Vec<Ticker> = raw.into_iter().map(Ticker::from).collect();
        tickers.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(tickers)
    }

    pub async fn ohlcv(&self, symbol: &str, timeframe: &str) -> Result<Vec<Ohlcv>> {
        let raw = self
            .adapter
            .fetch_ohlcv(symbol, timeframe)
            .await
            .map_err(self.venue_error("fetch_ohlcv"))?;
        Ok(raw.into_iter().map(Ohlcv::from).collect())
    }

    pub async fn trades(&self, symbol: &str) -> Result<Vec<Trade>> {
        let raw = self
            .adapter
            .fetch_trades(symbol)
            .await
            .map_err(self.venue_error("fetch_trades"))?;
        Ok(raw.into_iter().map(Trade::from).collect())
    }

    pub async fn order_book(&self, symbol: &str) -> Result<OrderBook> {
        let raw = self
            .adapter
            .fetch_order_book(symbol)
            .await
            .map_err(self.venue_error("fetch_order_book"))?;
        Ok(OrderBook::from(raw))
    }

    /// Account balances for one market type, ordered by currency code.
    pub async fn balances(&self, market_type: MarketType) -> Result<Vec<Balance>> {
        self.ensure_signed_in().await?;
        let raw = self
            .adapter
            .fetch_balance(market_type)
            .await
            .map_err(self.venue_error("fetch_balance"))?;
        let mut balances: Vec<Balance> = raw
            .into_iter()
            .map(|(code, balance)| Balance::from_raw(code, balance))
            .collect();
        balances.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(balances)
    }

    fn order_window(&self, symbol: &str) -> OrderWindow {
        if !self.exchange().requires_order_window() {
            return OrderWindow {
                symbol: symbol.to_string(),
                ..Default::default()
            };
        }
        let until = Utc::now().timestamp_millis();
        let lookback = i64::try_from(ORDER_LOOKBACK.as_millis()).unwrap_or(i64::MAX);
        OrderWindow {
            symbol: symbol.to_string(),
            since: Some(until.saturating_sub(lookback)),
            until: Some(until),
            limit: Some(ORDER_HISTORY_LIMIT),
        }
    }

    /// Open and closed orders for a symbol, newest venue id first.
    pub async fn orders(&self, symbol: &str) -> Result<Vec<Order>> {
        self.ensure_signed_in().await?;
        let window = self.order_window(symbol);
        let (closed, open) = futures::try_join!(
            async {
                self.adapter
                    .fetch_closed_orders(&window)
                    .await
                    .map_err(self.venue_error("fetch_closed_orders"))
            },
            async {
                self.adapter
                    .fetch_open_orders(&window)
                    .await
                    .map_err(self.venue_error("fetch_open_orders"))
            },
        )?;

        Ok(merge_orders(
            open.into_iter().map(Order::from).collect(),
            closed.into_iter().map(Order::from).collect(),
        ))
    }

    pub async fn create_order(&self, order: &NewOrder) -> Result<Order> {
        order.validate()?;
        self.ensure_signed_in().await?;
        let raw = self
            .adapter
            .create_order(order)
            .await
            .map_err(self.venue_error("create_order"))?;
        let created = Order::from(raw);
        info!(
            "Created {:?} {:?} order {} on {}",
            order.order_side, order.order_type, created.id, self.identity
        );
        Ok(created)
    }

    pub async fn cancel_order(&self, order_id: &str, symbol: Option<&str>) -> Result<Order> {
        if order_id.trim().is_empty() {
            return Err(Error::Validation("order id is required".to_string()));
        }
        self.ensure_signed_in().await?;
        let raw = self
            .adapter
            .cancel_order(order_id, symbol)
            .await
            .map_err(self.venue_error("cancel_order"))?;
        info!("Cancelled order {} on {}", order_id, self.identity);
        Ok(Order::from(raw))
    }
}

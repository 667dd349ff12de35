//! Exchange client contract.
//!
//! Optional venue behaviour is exposed through capability interfaces that the
//! registry probes once, at construction time:
//!
//! - [`SupportsSandbox`]: the venue offers a test environment.
//! - [`SupportsSignIn`]: the venue needs an explicit session handshake before
//!   authenticated calls.

use async_trait::async_trait;

use super::adapter_types::{
    RawBalances, RawCurrency, RawMarket, RawOhlcv, RawOrder, RawOrderBook, RawTicker, RawTrade,
};
use super::exchanges_model::{ConnectionConfig, Exchange, MarketType, NewOrder, OrderWindow};
use crate::errors::{AdapterError, Result};

pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

/// A client for one venue, bound to one set of credentials.
///
/// Implementations keep the loaded market metadata internally; the accessors
/// return whatever the last successful [`load_markets`](Self::load_markets)
/// fetched.
#[async_trait]
pub trait ExchangeAdapter: Send + Sync {
    fn exchange(&self) -> Exchange;

    /// Sandbox capability, if the venue has one.
    fn as_sandbox_mut(&mut self) -> Option<&mut dyn SupportsSandbox> {
        None
    }

    /// Sign-in capability, if the venue needs one.
    fn as_sign_in(&self) -> Option<&dyn SupportsSignIn> {
        None
    }

    async fn load_markets(&self) -> AdapterResult<()>;

    fn symbols(&self) -> Vec<String>;

    fn timeframes(&self) -> Vec<String>;

    fn markets(&self) -> Vec<RawMarket>;

    fn currencies(&self) -> Vec<RawCurrency>;

    async fn fetch_tickers(&self, symbols: &[String]) -> AdapterResult<Vec<RawTicker>>;

    async fn fetch_ohlcv(&self, symbol: &str, timeframe: &str) -> AdapterResult<Vec<RawOhlcv>>;

    async fn fetch_trades(&self, symbol: &str) -> AdapterResult<Vec<RawTrade>>;

    async fn fetch_order_book(&self, symbol: &str) -> AdapterResult<RawOrderBook>;

    async fn fetch_balance(&self, market_type: MarketType) -> AdapterResult<RawBalances>;

    async fn fetch_closed_orders(&self, window: &OrderWindow) -> AdapterResult<Vec<RawOrder>>;

    async fn fetch_open_orders(&self, window: &OrderWindow) -> AdapterResult<Vec<RawOrder>>;

    async fn create_order(&self, order: &NewOrder) -> AdapterResult<RawOrder>;

    async fn cancel_order(&self, order_id: &str, symbol: Option<&str>) -> AdapterResult<RawOrder>;
}

/// Venues with a separate test environment.
pub trait SupportsSandbox: Send + Sync {
    fn set_sandbox_mode(&mut self, enabled: bool);
}

/// Venues that need a session handshake before authenticated calls.
#[async_trait]
pub trait SupportsSignIn: Send + Sync {
    async fn sign_in(&self) -> AdapterResult<()>;
}

/// Builds adapters for the closed set of exchanges.
pub trait AdapterFactory: Send + Sync {
    /// Returns [`Error::ExchangeNotFound`](crate::Error::ExchangeNotFound)
    /// when no client exists for `config.exchange`.
    fn create(&self, config: &ConnectionConfig) -> Result<Box<dyn ExchangeAdapter>>;
}

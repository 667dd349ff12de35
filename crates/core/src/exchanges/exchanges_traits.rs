//! Credential store and exchange service traits.

use async_trait::async_trait;

use super::exchanges_model::{ConnectionIdentity, Exchange, MarketType, NewOrder, TradingAccount};
use super::market_model::{Balance, Currency, Market, Ohlcv, Order, OrderBook, Ticker, Trade};
use crate::errors::Result;

/// Resolves trading accounts with their credentials decrypted.
#[async_trait]
pub trait CredentialStoreTrait: Send + Sync {
    /// Returns [`Error::TraderNotFound`](crate::Error::TraderNotFound) when the
    /// account does not exist.
    async fn find_account(&self, trading_account_id: &str) -> Result<TradingAccount>;
}

/// Market data and trading operations addressed by connection identity.
#[async_trait]
pub trait ExchangeServiceTrait: Send + Sync {
    fn exchanges(&self) -> Vec<Exchange>;

    async fn symbols(&self, identity: &ConnectionIdentity) -> Result<Vec<String>>;

    async fn timeframes(&self, identity: &ConnectionIdentity) -> Result<Vec<String>>;

    async fn currencies(&self, identity: &ConnectionIdentity) -> Result<Vec<Currency>>;

    async fn markets(
        &self,
        identity: &ConnectionIdentity,
        market_type: MarketType,
    ) -> Result<Vec<Market>>;

    async fn tickers(&self, identity: &ConnectionIdentity, symbols: &[String])
        -> Result<Vec<Ticker>>;

    async fn ohlcv(
        &self,
        identity: &ConnectionIdentity,
        symbol: &str,
        timeframe: &str,
    ) -> Result<Vec<Ohlcv>>;

    async fn trades(&self, identity: &ConnectionIdentity, symbol: &str) -> Result<Vec<Trade>>;

    async fn order_book(&self, identity: &ConnectionIdentity, symbol: &str) -> Result<OrderBook>;

    async fn balances(
        &self,
        identity: &ConnectionIdentity,
        market_type: MarketType,
    ) -> Result<Vec<Balance>>;

    async fn orders(&self, identity: &ConnectionIdentity, symbol: &str) -> Result<Vec<Order>>;

    async fn create_order(&self, identity: &ConnectionIdentity, order: &NewOrder) -> Result<Order>;

    async fn cancel_order(
        &self,
        identity: &ConnectionIdentity,
        order_id: &str,
        symbol: Option<&str>,
    ) -> Result<Order>;

    /// Refreshes the cached market metadata of a connection.
    async fn reload_markets(&self, identity: &ConnectionIdentity) -> Result<()>;

    /// Drops the cached connection. Returns true if one existed.
    fn del_connection(&self, identity: &ConnectionIdentity) -> bool;

    /// Drops every cached connection built from a trading account.
    fn evict_trading_account(&self, trading_account_id: &str) -> usize;
}

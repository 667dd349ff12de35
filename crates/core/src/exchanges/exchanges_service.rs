use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::warn;

use super::connection::ExchangeConnection;
use super::exchanges_model::{ConnectionIdentity, Exchange, MarketType, NewOrder};
use super::exchanges_traits::ExchangeServiceTrait;
use super::market_model::{Balance, Currency, Market, Ohlcv, Order, OrderBook, Ticker, Trade};
use super::registry::ConnectionRegistry;
use crate::errors::{Error, Result};

/// Runs `operation` under an optional deadline.
///
/// Dropping the operation on expiry cancels any in-flight venue call. A
/// connection being materialized is not poisoned by the cancellation; the next
/// caller picks the work up again.
pub async fn with_deadline<T, F>(deadline: Option<Duration>, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match deadline {
        Some(limit) => tokio::time::timeout(limit, operation)
            .await
            .map_err(|_| Error::DeadlineExceeded)?,
        None => operation.await,
    }
}

/// Service resolving connections through the registry and delegating to them.
pub struct ExchangeService {
    registry: Arc<ConnectionRegistry>,
    deadline: Option<Duration>,
}

impl ExchangeService {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            registry,
            deadline: None,
        }
    }

    /// Bounds every operation, connection setup included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(timeout);
        self
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    async fn run<T, F, Fut>(&self, identity: &ConnectionIdentity, operation: F) -> Result<T>
    where
        F: FnOnce(Arc<ExchangeConnection>) -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
        T: Send,
    {
        let result = with_deadline(self.deadline, async {
            let connection = self.registry.get_connection(identity).await?;
            operation(connection).await
        })
        .await;
        if let Err(Error::DeadlineExceeded) = &result {
            warn!("Operation on {} exceeded its deadline", identity);
        }
        result
    }
}

#[async_trait]
impl ExchangeServiceTrait for ExchangeService {
    fn exchanges(&self) -> Vec<Exchange> {
        Exchange::ALL.to_vec()
    }

    async fn symbols(&self, identity: &ConnectionIdentity) -> Result<Vec<String>> {
        self.run(identity, |c| async move { Ok(c.symbols()) }).await
    }

    async fn timeframes(&self, identity: &ConnectionIdentity) -> Result<Vec<String>> {
        self.run(identity, |c| async move { Ok(c.timeframes()) })
            .await
    }

    async fn currencies(&self, identity: &ConnectionIdentity) -> Result<Vec<Currency>> {
        self.run(identity, |c| async move { Ok(c.currencies()) })
            .await
    }

    async fn markets(
        &self,
        identity: &ConnectionIdentity,
        market_type: MarketType,
    ) -> Result<Vec<Market>> {
        self.run(identity, |c| async move { Ok(c.markets(market_type)) })
            .await
    }

    async fn tickers(
        &self,
        identity: &ConnectionIdentity,
        symbols: &[String],
    ) -> Result<Vec<Ticker>> {
        if symbols.is_empty() {
            return Err(Error::Validation("at least one symbol is required".to_string()));
        }
        self.run(identity, |c| async move { c.tickers(symbols).await })
            .await
    }

    async fn ohlcv(
        &self,
        identity: &ConnectionIdentity,
        symbol: &str,
        timeframe: &str,
    ) -> Result<Vec<Ohlcv>> {
        self.run(identity, |c| async move { c.ohlcv(symbol, timeframe).await })
            .await
    }

    async fn trades(&self, identity: &ConnectionIdentity, symbol: &str) -> Result<Vec<Trade>> {
        self.run(identity, |c| async move { c.trades(symbol).await })
            .await
    }

    async fn order_book(&self, identity: &ConnectionIdentity, symbol: &str) -> Result<OrderBook> {
        self.run(identity, |c| async move { c.order_book(symbol).await })
            .await
    }

    async fn balances(
        &self,
        identity: &ConnectionIdentity,
        market_type: MarketType,
    ) -> Result<Vec<Balance>> {
        self.run(identity, |c| async move { c.balances(market_type).await })
            .await
    }

    async fn orders(&self, identity: &ConnectionIdentity, symbol: &str) -> Result<Vec<Order>> {
        self.run(identity, |c| async move { c.orders(symbol).await })
            .await
    }

    async fn create_order(&self, identity: &ConnectionIdentity, order: &NewOrder) -> Result<Order> {
        order.validate()?;
        self.run(identity, |c| async move { c.create_order(order).await })
            .await
    }

    async fn cancel_order(
        &self,
        identity: &ConnectionIdentity,
        order_id: &str,
        symbol: Option<&str>,
    ) -> Result<Order> {
        self.run(identity, |c| async move { c.cancel_order(order_id, symbol).await })
            .await
    }

    async fn reload_markets(&self, identity: &ConnectionIdentity) -> Result<()> {
        self.run(identity, |c| async move { c.load_markets().await })
            .await
    }

    fn del_connection(&self, identity: &ConnectionIdentity) -> bool {
        self.registry.del_connection(identity)
    }

    fn evict_trading_account(&self, trading_account_id: &str) -> usize {
        self.registry.evict_trading_account(trading_account_id)
    }
}

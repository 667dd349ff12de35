//! Exchanges module - venue connections, normalization and the connection registry.

mod adapter;
mod adapter_types;
mod connection;
mod exchanges_model;
mod exchanges_service;
mod exchanges_traits;
mod market_model;
mod registry;
mod timeframes;

#[cfg(test)]
pub(crate) mod test_support;



// Re-export the public interface
pub use adapter::{AdapterFactory, AdapterResult, ExchangeAdapter, SupportsSandbox, SupportsSignIn};
pub use adapter_types::*;
pub use connection::ExchangeConnection;
pub use exchanges_model::{
    ConnectionConfig, ConnectionIdentity, Credentials, Exchange, MarketType, NewOrder, OrderSide,
    OrderType, OrderWindow, TradingAccount, redact,
};
pub use exchanges_service::{with_deadline, ExchangeService};
pub use exchanges_traits::{CredentialStoreTrait, ExchangeServiceTrait};
pub use market_model::{
    iso8601, merge_orders, nan_to_zero, Balance, Currency, CurrencyLimits, Fee, Market, MinMax,
    Network, Ohlcv, Order, OrderBook, Sanitize, Ticker, Trade,
};
pub use registry::ConnectionRegistry;
pub use timeframes::{parse_timeframe, sort_timeframes};

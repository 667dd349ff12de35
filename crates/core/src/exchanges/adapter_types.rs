//! Venue-native payloads as handed over by exchange adapters.
//!
//! Every numeric field is optional and may carry NaN; normalization into the
//! types of `market_model` collapses both to zero.

use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMinMax {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCurrencyLimits {
    pub amount: RawMinMax,
    pub withdraw: RawMinMax,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawNetwork {
    pub id: Option<String>,
    pub fee: Option<f64>,
    pub active: Option<bool>,
    pub deposit: Option<bool>,
    pub withdraw: Option<bool>,
    pub precision: Option<f64>,
    pub limits: RawCurrencyLimits,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCurrency {
    pub id: Option<String>,
    pub code: Option<String>,
    pub name: Option<String>,
    pub precision: Option<f64>,
    pub fee: Option<f64>,
    pub active: Option<bool>,
    pub deposit: Option<bool>,
    pub withdraw: Option<bool>,
    pub numeric_id: Option<i64>,
    pub currency_type: Option<String>,
    pub margin: Option<bool>,
    pub limits: RawCurrencyLimits,
    pub networks: Vec<RawNetwork>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMarket {
    pub id: Option<String>,
    pub symbol: Option<String>,
    pub base: Option<String>,
    pub quote: Option<String>,
    pub market_type: Option<String>,
    pub spot: Option<bool>,
    pub margin: Option<bool>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTicker {
    pub symbol: Option<String>,
    pub timestamp: Option<i64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub bid: Option<f64>,
    pub bid_volume: Option<f64>,
    pub ask: Option<f64>,
    pub ask_volume: Option<f64>,
    pub vwap: Option<f64>,
    pub open: Option<f64>,
    pub close: Option<f64>,
    pub last: Option<f64>,
    pub previous_close: Option<f64>,
    pub change: Option<f64>,
    pub percentage: Option<f64>,
    pub average: Option<f64>,
    pub base_volume: Option<f64>,
    pub quote_volume: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawOhlcv {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFee {
    pub currency: Option<String>,
    pub rate: Option<f64>,
    pub cost: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTrade {
    pub id: Option<String>,
    pub order: Option<String>,
    pub timestamp: Option<i64>,
    pub symbol: Option<String>,
    pub trade_type: Option<String>,
    pub side: Option<String>,
    pub taker_or_maker: Option<String>,
    pub price: Option<f64>,
    pub amount: Option<f64>,
    pub cost: Option<f64>,
    pub fee: RawFee,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawOrderBook {
    pub symbol: Option<String>,
    pub bids: Vec<[f64; 2]>,
    pub asks: Vec<[f64; 2]>,
    pub timestamp: Option<i64>,
    pub nonce: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBalance {
    pub free: Option<f64>,
    pub used: Option<f64>,
    pub total: Option<f64>,
}

/// Balances keyed by currency code.
pub type RawBalances = HashMap<String, RawBalance>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawOrder {
    pub id: Option<String>,
    pub client_order_id: Option<String>,
    pub timestamp: Option<i64>,
    pub last_trade_timestamp: Option<i64>,
    pub symbol: Option<String>,
    pub order_type: Option<String>,
    pub side: Option<String>,
    pub status: Option<String>,
    pub price: Option<f64>,
    pub cost: Option<f64>,
    pub average: Option<f64>,
    pub amount: Option<f64>,
    pub filled: Option<f64>,
    pub remaining: Option<f64>,
    pub reduce_only: Option<bool>,
    pub post_only: Option<bool>,
    pub fee: RawFee,
    pub trades: Vec<RawTrade>,
    pub trigger_price: Option<f64>,
    pub stop_loss_price: Option<f64>,
    pub take_profit_price: Option<f64>,
}

//! Normalized market data and trading types.
//!
//! Venue payloads are converted with `From<Raw*>`. Absent values become their
//! zero value and every float field passes through [`nan_to_zero`], so the
//! serialized output never carries NaN.

use std::collections::BTreeMap;

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use super::adapter_types::{
    RawBalance, RawCurrency, RawCurrencyLimits, RawFee, RawMarket, RawMinMax, RawNetwork,
    RawOhlcv, RawOrder, RawOrderBook, RawTicker, RawTrade,
};

/// Collapses NaN to zero, leaves every other value untouched.
pub fn nan_to_zero(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value
    }
}

fn num(value: Option<f64>) -> f64 {
    nan_to_zero(value.unwrap_or_default())
}

fn clean(value: &mut f64) {
    *value = nan_to_zero(*value);
}

/// ISO-8601 rendering of a unix-millis timestamp, empty when out of range.
pub fn iso8601(timestamp_ms: i64) -> String {
    if timestamp_ms == 0 {
        return String::new();
    }
    DateTime::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
        .unwrap_or_default()
}

/// Types that can be re-sanitized in place.
pub trait Sanitize {
    fn sanitize(&mut self);

    fn sanitized(mut self) -> Self
    where
        Self: Sized,
    {
        self.sanitize();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinMax {
    pub min: f64,
    pub max: f64,
}

impl From<RawMinMax> for MinMax {
    fn from(raw: RawMinMax) -> Self {
        Self {
            min: num(raw.min),
            max: num(raw.max),
        }
    }
}

impl Sanitize for MinMax {
    fn sanitize(&mut self) {
        clean(&mut self.min);
        clean(&mut self.max);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrencyLimits {
    pub amount: MinMax,
    pub withdraw: MinMax,
}

impl From<RawCurrencyLimits> for CurrencyLimits {
    fn from(raw: RawCurrencyLimits) -> Self {
        Self {
            amount: raw.amount.into(),
            withdraw: raw.withdraw.into(),
        }
    }
}

impl Sanitize for CurrencyLimits {
    fn sanitize(&mut self) {
        self.amount.sanitize();
        self.withdraw.sanitize();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    #[serde(rename = "network_id")]
    pub id: String,
    pub fee: f64,
    pub active: bool,
    pub deposit: bool,
    pub withdraw: bool,
    pub precision: f64,
    #[serde(rename = "currency_limits")]
    pub limits: CurrencyLimits,
}

impl From<RawNetwork> for Network {
    fn from(raw: RawNetwork) -> Self {
        Self {
            id: raw.id.unwrap_or_default(),
            fee: num(raw.fee),
            active: raw.active.unwrap_or_default(),
            deposit: raw.deposit.unwrap_or_default(),
            withdraw: raw.withdraw.unwrap_or_default(),
            precision: num(raw.precision),
            limits: raw.limits.into(),
        }
    }
}

impl Sanitize for Network {
    fn sanitize(&mut self) {
        clean(&mut self.fee);
        clean(&mut self.precision);
        self.limits.sanitize();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    #[serde(rename = "currency_id")]
    pub id: String,
    pub code: String,
    pub name: String,
    pub precision: f64,
    pub fee: f64,
    pub active: bool,
    pub deposit: bool,
    pub withdraw: bool,
    pub numeric_id: i64,
    #[serde(rename = "type")]
    pub currency_type: String,
    pub margin: bool,
    #[serde(rename = "currency_limits")]
    pub limits: CurrencyLimits,
    /// Keyed by network id.
    pub networks: BTreeMap<String, Network>,
}

impl From<RawCurrency> for Currency {
    fn from(raw: RawCurrency) -> Self {
        let networks = raw
            .networks
            .into_iter()
            .map(Network::from)
            .map(|network| (network.id.clone(), network))
            .collect();
        Self {
            id: raw.id.unwrap_or_default(),
            code: raw.code.unwrap_or_default(),
            name: raw.name.unwrap_or_default(),
            precision: num(raw.precision),
            fee: num(raw.fee),
            active: raw.active.unwrap_or_default(),
            deposit: raw.deposit.unwrap_or_default(),
            withdraw: raw.withdraw.unwrap_or_default(),
            numeric_id: raw.numeric_id.unwrap_or_default(),
            currency_type: raw.currency_type.unwrap_or_default(),
            margin: raw.margin.unwrap_or_default(),
            limits: raw.limits.into(),
            networks,
        }
    }
}

impl Sanitize for Currency {
    fn sanitize(&mut self) {
        clean(&mut self.precision);
        clean(&mut self.fee);
        self.limits.sanitize();
        self.networks.values_mut().for_each(Sanitize::sanitize);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    #[serde(rename = "market_id")]
    pub id: String,
    pub symbol: String,
    pub base: String,
    pub quote: String,
    #[serde(rename = "type")]
    pub market_type: String,
    pub spot: bool,
    pub margin: bool,
    pub active: bool,
}

impl From<RawMarket> for Market {
    fn from(raw: RawMarket) -> Self {
        let symbol = raw.symbol.unwrap_or_default();
        Self {
            id: raw.id.unwrap_or_else(|| symbol.clone()),
            symbol,
            base: raw.base.unwrap_or_default(),
            quote: raw.quote.unwrap_or_default(),
            market_type: raw.market_type.unwrap_or_default(),
            spot: raw.spot.unwrap_or_default(),
            margin: raw.margin.unwrap_or_default(),
            active: raw.active.unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub timestamp: i64,
    pub datetime: String,
    pub high: f64,
    pub low: f64,
    pub bid: f64,
    pub bid_volume: f64,
    pub ask: f64,
    pub ask_volume: f64,
    pub vwap: f64,
    pub open: f64,
    pub close: f64,
    pub last: f64,
    pub previous_close: f64,
    pub change: f64,
    pub percentage: f64,
    pub average: f64,
    pub base_volume: f64,
    pub quote_volume: f64,
}

impl From<RawTicker> for Ticker {
    fn from(raw: RawTicker) -> Self {
        let timestamp = raw.timestamp.unwrap_or_default();
        Self {
            symbol: raw.symbol.unwrap_or_default(),
            timestamp,
            datetime: iso8601(timestamp),
            high: num(raw.high),
            low: num(raw.low),
            bid: num(raw.bid),
            bid_volume: num(raw.bid_volume),
            ask: num(raw.ask),
            ask_volume: num(raw.ask_volume),
            vwap: num(raw.vwap),
            open: num(raw.open),
            close: num(raw.close),
            last: num(raw.last),
            previous_close: num(raw.previous_close),
            change: num(raw.change),
            percentage: num(raw.percentage),
            average: num(raw.average),
            base_volume: num(raw.base_volume),
            quote_volume: num(raw.quote_volume),
        }
    }
}

impl Sanitize for Ticker {
    fn sanitize(&mut self) {
        for value in [
            &mut self.high,
            &mut self.low,
            &mut self.bid,
            &mut self.bid_volume,
            &mut self.ask,
            &mut self.ask_volume,
            &mut self.vwap,
            &mut self.open,
            &mut self.close,
            &mut self.last,
            &mut self.previous_close,
            &mut self.change,
            &mut self.percentage,
            &mut self.average,
            &mut self.base_volume,
            &mut self.quote_volume,
        ] {
            clean(value);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ohlcv {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl From<RawOhlcv> for Ohlcv {
    fn from(raw: RawOhlcv) -> Self {
        Self {
            timestamp: raw.timestamp,
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            volume: raw.volume,
        }
        .sanitized()
    }
}

impl Sanitize for Ohlcv {
    fn sanitize(&mut self) {
        for value in [
            &mut self.open,
            &mut self.high,
            &mut self.low,
            &mut self.close,
            &mut self.volume,
        ] {
            clean(value);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fee {
    pub currency: String,
    pub rate: f64,
    pub cost: f64,
}

impl From<RawFee> for Fee {
    fn from(raw: RawFee) -> Self {
        Self {
            currency: raw.currency.unwrap_or_default(),
            rate: num(raw.rate),
            cost: num(raw.cost),
        }
    }
}

impl Sanitize for Fee {
    fn sanitize(&mut self) {
        clean(&mut self.rate);
        clean(&mut self.cost);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub order: String,
    pub timestamp: i64,
    pub datetime: String,
    pub symbol: String,
    #[serde(rename = "type")]
    pub trade_type: String,
    pub side: String,
    pub taker_or_maker: String,
    pub price: f64,
    pub amount: f64,
    pub cost: f64,
    pub fee: Fee,
}

impl From<RawTrade> for Trade {
    fn from(raw: RawTrade) -> Self {
        let timestamp = raw.timestamp.unwrap_or_default();
        Self {
            id: raw.id.unwrap_or_default(),
            order: raw.order.unwrap_or_default(),
            timestamp,
            datetime: iso8601(timestamp),
            symbol: raw.symbol.unwrap_or_default(),
            trade_type: raw.trade_type.unwrap_or_default(),
            side: raw.side.unwrap_or_default(),
            taker_or_maker: raw.taker_or_maker.unwrap_or_default(),
            price: num(raw.price),
            amount: num(raw.amount),
            cost: num(raw.cost),
            fee: raw.fee.into(),
        }
    }
}

impl Sanitize for Trade {
    fn sanitize(&mut self) {
        clean(&mut self.price);
        clean(&mut self.amount);
        clean(&mut self.cost);
        self.fee.sanitize();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBook {
    pub symbol: String,
    /// `[price, amount]` levels, best first.
    pub bids: Vec<[f64; 2]>,
    pub asks: Vec<[f64; 2]>,
    pub timestamp: i64,
    pub datetime: String,
    pub nonce: i64,
}

impl From<RawOrderBook> for OrderBook {
    fn from(raw: RawOrderBook) -> Self {
        let timestamp = raw.timestamp.unwrap_or_default();
        Self {
            symbol: raw.symbol.unwrap_or_default(),
            bids: raw.bids,
            asks: raw.asks,
            timestamp,
            datetime: iso8601(timestamp),
            nonce: raw.nonce.unwrap_or_default(),
        }
        .sanitized()
    }
}

impl Sanitize for OrderBook {
    fn sanitize(&mut self) {
        self.bids
            .iter_mut()
            .chain(self.asks.iter_mut())
            .flat_map(|level| level.iter_mut())
            .for_each(clean);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub code: String,
    pub free: f64,
    pub used: f64,
    pub total: f64,
}

impl Balance {
    pub fn from_raw(code: String, raw: RawBalance) -> Self {
        Self {
            code,
            free: num(raw.free),
            used: num(raw.used),
            total: num(raw.total),
        }
    }
}

impl Sanitize for Balance {
    fn sanitize(&mut self) {
        clean(&mut self.free);
        clean(&mut self.used);
        clean(&mut self.total);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "order_id")]
    pub id: String,
    pub client_order_id: String,
    pub timestamp: i64,
    pub datetime: String,
    pub last_trade_timestamp: i64,
    pub symbol: String,
    #[serde(rename = "type")]
    pub order_type: String,
    pub side: String,
    pub status: String,
    pub price: f64,
    pub cost: f64,
    pub average: f64,
    pub amount: f64,
    pub filled: f64,
    pub remaining: f64,
    pub reduce_only: bool,
    pub post_only: bool,
    pub fee: Fee,
    pub trades: Vec<Trade>,
    pub trigger_price: f64,
    pub stop_loss_price: f64,
    pub take_profit_price: f64,
}

impl Order {
    /// Numeric value of the venue order id, zero when it is not a number.
    pub fn numeric_id(&self) -> u64 {
        self.id.trim().parse().unwrap_or(0)
    }
}

impl From<RawOrder> for Order {
    fn from(raw: RawOrder) -> Self {
        let timestamp = raw.timestamp.unwrap_or_default();
        Self {
            id: raw.id.unwrap_or_default(),
            client_order_id: raw.client_order_id.unwrap_or_default(),
            timestamp,
            datetime: iso8601(timestamp),
            last_trade_timestamp: raw.last_trade_timestamp.unwrap_or_default(),
            symbol: raw.symbol.unwrap_or_default(),
            order_type: raw.order_type.unwrap_or_default(),
            side: raw.side.unwrap_or_default(),
            status: raw.status.unwrap_or_default(),
            price: num(raw.price),
            cost: num(raw.cost),
            average: num(raw.average),
            amount: num(raw.amount),
            filled: num(raw.filled),
            remaining: num(raw.remaining),
            reduce_only: raw.reduce_only.unwrap_or_default(),
            post_only: raw.post_only.unwrap_or_default(),
            fee: raw.fee.into(),
            trades: raw.trades.into_iter().map(Trade::from).collect(),
            trigger_price: num(raw.trigger_price),
            stop_loss_price: num(raw.stop_loss_price),
            take_profit_price: num(raw.take_profit_price),
        }
    }
}

impl Sanitize for Order {
    fn sanitize(&mut self) {
        for value in [
            &mut self.price,
            &mut self.cost,
            &mut self.average,
            &mut self.amount,
            &mut self.filled,
            &mut self.remaining,
            &mut self.trigger_price,
            &mut self.stop_loss_price,
            &mut self.take_profit_price,
        ] {
            clean(value);
        }
        self.fee.sanitize();
        self.trades.iter_mut().for_each(Sanitize::sanitize);
    }
}

/// Merges open and closed orders, newest venue id first.
///
/// Ids that do not parse as numbers count as zero; the sort is stable so such
/// orders keep their relative order at the tail.
pub fn merge_orders(open: Vec<Order>, closed: Vec<Order>) -> Vec<Order> {
    let mut orders = open;
    orders.extend(closed);
    orders.sort_by_key(|order| std::cmp::Reverse(order.numeric_id()));
    orders
}

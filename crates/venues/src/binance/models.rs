//! Binance REST payloads and their conversion into adapter types.
//!
//! Binance encodes decimals as strings. Values that fail to parse become
//! `None` and are zeroed later by normalization.

use serde::Deserialize;
use serde_json::Value;

use coinhub_core::exchanges::{
    RawBalance, RawCurrency, RawCurrencyLimits, RawFee, RawMarket, RawMinMax, RawNetwork,
    RawOhlcv, RawOrder, RawOrderBook, RawTicker, RawTrade,
};

use super::symbols::SymbolMap;

pub(crate) fn num(value: &str) -> Option<f64> {
    value.parse::<f64>().ok()
}

// ============================================================================
// Market metadata
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExchangeInfo {
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SymbolInfo {
    pub symbol: String,
    pub status: String,
    pub base_asset: String,
    pub quote_asset: String,
    #[serde(default)]
    pub is_spot_trading_allowed: bool,
    #[serde(default)]
    pub is_margin_trading_allowed: bool,
}

impl SymbolInfo {
    pub fn unified(&self) -> String {
        format!("{}/{}", self.base_asset, self.quote_asset)
    }

    pub fn to_raw(&self) -> RawMarket {
        RawMarket {
            id: Some(self.symbol.clone()),
            symbol: Some(self.unified()),
            base: Some(self.base_asset.clone()),
            quote: Some(self.quote_asset.clone()),
            market_type: Some("spot".to_string()),
            spot: Some(self.is_spot_trading_allowed),
            margin: Some(self.is_margin_trading_allowed),
            active: Some(self.status == "TRADING"),
        }
    }
}

/// Entry of `/sapi/v1/capital/config/getall`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CoinInfo {
    pub coin: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub trading: bool,
    #[serde(default)]
    pub deposit_all_enable: bool,
    #[serde(default)]
    pub withdraw_all_enable: bool,
    #[serde(default)]
    pub network_list: Vec<NetworkInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NetworkInfo {
    pub network: String,
    #[serde(default)]
    pub withdraw_fee: String,
    #[serde(default)]
    pub withdraw_min: String,
    #[serde(default)]
    pub withdraw_max: String,
    #[serde(default)]
    pub withdraw_integer_multiple: String,
    #[serde(default)]
    pub deposit_enable: bool,
    #[serde(default)]
    pub withdraw_enable: bool,
    #[serde(default)]
    pub is_default: bool,
}

impl From<NetworkInfo> for RawNetwork {
    fn from(n: NetworkInfo) -> Self {
        RawNetwork {
            id: Some(n.network),
            fee: num(&n.withdraw_fee),
            active: Some(n.deposit_enable || n.withdraw_enable),
            deposit: Some(n.deposit_enable),
            withdraw: Some(n.withdraw_enable),
            precision: num(&n.withdraw_integer_multiple),
            limits: RawCurrencyLimits {
                amount: RawMinMax::default(),
                withdraw: RawMinMax {
                    min: num(&n.withdraw_min),
                    max: num(&n.withdraw_max),
                },
            },
        }
    }
}

impl From<CoinInfo> for RawCurrency {
    fn from(c: CoinInfo) -> Self {
        // The default network carries the fee Binance charges when none is chosen.
        let default_fee = c
            .network_list
            .iter()
            .find(|n| n.is_default)
            .and_then(|n| num(&n.withdraw_fee));
        RawCurrency {
            id: Some(c.coin.clone()),
            code: Some(c.coin),
            name: Some(c.name),
            precision: None,
            fee: default_fee,
            active: Some(c.trading),
            deposit: Some(c.deposit_all_enable),
            withdraw: Some(c.withdraw_all_enable),
            numeric_id: None,
            currency_type: Some("crypto".to_string()),
            margin: None,
            limits: RawCurrencyLimits::default(),
            networks: c.network_list.into_iter().map(RawNetwork::from).collect(),
        }
    }
}

/// Bare currency entry for an asset seen in the market list.
pub(crate) fn asset_currency(asset: &str) -> RawCurrency {
    RawCurrency {
        id: Some(asset.to_string()),
        code: Some(asset.to_string()),
        active: Some(true),
        ..Default::default()
    }
}

// ============================================================================
// Market data
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Ticker24h {
    pub symbol: String,
    #[serde(default)]
    pub price_change: String,
    #[serde(default)]
    pub price_change_percent: String,
    #[serde(default)]
    pub weighted_avg_price: String,
    #[serde(default)]
    pub prev_close_price: String,
    #[serde(default)]
    pub last_price: String,
    #[serde(default)]
    pub bid_price: String,
    #[serde(default)]
    pub bid_qty: String,
    #[serde(default)]
    pub ask_price: String,
    #[serde(default)]
    pub ask_qty: String,
    #[serde(default)]
    pub open_price: String,
    #[serde(default)]
    pub high_price: String,
    #[serde(default)]
    pub low_price: String,
    #[serde(default)]
    pub volume: String,
    #[serde(default)]
    pub quote_volume: String,
    #[serde(default)]
    pub close_time: Option<i64>,
}

impl Ticker24h {
    pub fn into_raw(self, symbols: &SymbolMap) -> RawTicker {
        let open = num(&self.open_price);
        let last = num(&self.last_price);
        RawTicker {
            symbol: Some(symbols.unified(&self.symbol)),
            timestamp: self.close_time,
            high: num(&self.high_price),
            low: num(&self.low_price),
            bid: num(&self.bid_price),
            bid_volume: num(&self.bid_qty),
            ask: num(&self.ask_price),
            ask_volume: num(&self.ask_qty),
            vwap: num(&self.weighted_avg_price),
            open,
            close: last,
            last,
            previous_close: num(&self.prev_close_price),
            change: num(&self.price_change),
            percentage: num(&self.price_change_percent),
            average: open.zip(last).map(|(o, l)| (o + l) / 2.0),
            base_volume: num(&self.volume),
            quote_volume: num(&self.quote_volume),
        }
    }
}

/// One kline row: `[openTime, open, high, low, close, volume, closeTime, ...]`.
pub(crate) fn kline_to_raw(row: &[Value]) -> Option<RawOhlcv> {
    let field = |i: usize| -> f64 {
        row.get(i)
            .and_then(Value::as_str)
            .and_then(num)
            .unwrap_or(f64::NAN)
    };
    Some(RawOhlcv {
        timestamp: row.first()?.as_i64()?,
        open: field(1),
        high: field(2),
        low: field(3),
        close: field(4),
        volume: field(5),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PublicTrade {
    pub id: i64,
    pub price: String,
    pub qty: String,
    #[serde(default)]
    pub quote_qty: String,
    pub time: i64,
    pub is_buyer_maker: bool,
}

impl PublicTrade {
    pub fn into_raw(self, symbol: &str) -> RawTrade {
        // The aggressor sold into a resting buy order.
        let side = if self.is_buyer_maker { "sell" } else { "buy" };
        RawTrade {
            id: Some(self.id.to_string()),
            order: None,
            timestamp: Some(self.time),
            symbol: Some(symbol.to_string()),
            trade_type: None,
            side: Some(side.to_string()),
            taker_or_maker: None,
            price: num(&self.price),
            amount: num(&self.qty),
            cost: num(&self.quote_qty),
            fee: RawFee::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Depth {
    pub last_update_id: i64,
    pub bids: Vec<[String; 2]>,
    pub asks: Vec<[String; 2]>,
}

impl Depth {
    pub fn into_raw(self, symbol: &str) -> RawOrderBook {
        let levels = |side: Vec<[String; 2]>| -> Vec<[f64; 2]> {
            side.iter()
                .map(|[price, qty]| [num(price).unwrap_or(f64::NAN), num(qty).unwrap_or(f64::NAN)])
                .collect()
        };
        RawOrderBook {
            symbol: Some(symbol.to_string()),
            bids: levels(self.bids),
            asks: levels(self.asks),
            timestamp: None,
            nonce: Some(self.last_update_id),
        }
    }
}

// ============================================================================
// Account
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct SpotAccount {
    pub balances: Vec<SpotBalance>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpotBalance {
    pub asset: String,
    pub free: String,
    pub locked: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MarginAccount {
    pub user_assets: Vec<MarginAsset>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MarginAsset {
    pub asset: String,
    pub free: String,
    pub locked: String,
}

pub(crate) fn balance(free: &str, locked: &str) -> RawBalance {
    let free = num(free);
    let used = num(locked);
    RawBalance {
        free,
        used,
        total: free.zip(used).map(|(f, u)| f + u),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrderInfo {
    pub symbol: String,
    pub order_id: i64,
    #[serde(default)]
    pub client_order_id: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub orig_qty: String,
    #[serde(default)]
    pub executed_qty: String,
    #[serde(default)]
    pub cummulative_quote_qty: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, rename = "type")]
    pub order_type: String,
    #[serde(default)]
    pub side: String,
    #[serde(default)]
    pub stop_price: Option<String>,
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub transact_time: Option<i64>,
    #[serde(default)]
    pub update_time: Option<i64>,
}

impl OrderInfo {
    pub fn is_open(&self) -> bool {
        order_status(&self.status) == "open"
    }

    pub fn into_raw(self, symbols: &SymbolMap) -> RawOrder {
        let amount = num(&self.orig_qty);
        let filled = num(&self.executed_qty);
        let cost = num(&self.cummulative_quote_qty);
        let average = match (cost, filled) {
            (Some(c), Some(f)) if f > 0.0 => Some(c / f),
            _ => None,
        };
        RawOrder {
            id: Some(self.order_id.to_string()),
            client_order_id: Some(self.client_order_id).filter(|id| !id.is_empty()),
            timestamp: self.time.or(self.transact_time),
            last_trade_timestamp: self.update_time,
            symbol: Some(symbols.unified(&self.symbol)),
            order_type: Some(self.order_type.to_lowercase()),
            side: Some(self.side.to_lowercase()),
            status: Some(order_status(&self.status).to_string()),
            price: num(&self.price),
            cost,
            average,
            amount,
            filled,
            remaining: amount.zip(filled).map(|(a, f)| a - f),
            reduce_only: None,
            post_only: Some(self.order_type == "LIMIT_MAKER"),
            fee: RawFee::default(),
            trades: Vec::new(),
            trigger_price: self.stop_price.as_deref().and_then(num).filter(|p| *p > 0.0),
            stop_loss_price: None,
            take_profit_price: None,
        }
    }
}

/// Unified order status for a Binance status string.
pub(crate) fn order_status(status: &str) -> &str {
    match status {
        "NEW" | "PARTIALLY_FILLED" | "PENDING_NEW" => "open",
        "FILLED" => "closed",
        "CANCELED" | "PENDING_CANCEL" => "canceled",
        "REJECTED" => "rejected",
        "EXPIRED" | "EXPIRED_IN_MATCH" => "expired",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol_map() -> SymbolMap {
        SymbolMap::from_markets(&[SymbolInfo {
            symbol: "BTCUSDT".into(),
            status: "TRADING".into(),
            base_asset: "BTC".into(),
            quote_asset: "USDT".into(),
            is_spot_trading_allowed: true,
            is_margin_trading_allowed: true,
        }])
    }

    #[test]
    fn ticker_strings_become_numbers() {
        let ticker: Ticker24h = serde_json::from_str(
            r#"{"symbol":"BTCUSDT","priceChange":"-94.99","priceChangePercent":"-0.095",
                "weightedAvgPrice":"0.29628482","prevClosePrice":"0.10002000",
                "lastPrice":"4.00","bidPrice":"3.99","bidQty":"1.5","askPrice":"4.01",
                "askQty":"2","openPrice":"2.00","highPrice":"5","lowPrice":"1",
                "volume":"8913.3","quoteVolume":"15.3","closeTime":1499869899040}"#,
        )
        .unwrap();
        let raw = ticker.into_raw(&symbol_map());
        assert_eq!(raw.symbol.as_deref(), Some("BTC/USDT"));
        assert_eq!(raw.last, Some(4.0));
        assert_eq!(raw.close, Some(4.0));
        assert_eq!(raw.average, Some(3.0));
        assert_eq!(raw.timestamp, Some(1499869899040));
    }

    #[test]
    fn kline_rows_parse_and_bad_cells_become_nan() {
        let row: Vec<Value> = serde_json::from_str(
            r#"[1499040000000,"0.01634790","0.80000000","0.01575800","oops","148976.1",1499644799999]"#,
        )
        .unwrap();
        let raw = kline_to_raw(&row).unwrap();
        assert_eq!(raw.timestamp, 1499040000000);
        assert_eq!(raw.high, 0.8);
        assert!(raw.close.is_nan());
        assert!(kline_to_raw(&[]).is_none());
    }

    #[test]
    fn depth_levels_and_trade_side() {
        let depth: Depth = serde_json::from_str(
            r#"{"lastUpdateId":1027024,"bids":[["4.00000000","431.00000000"]],"asks":[["4.00000200","12.00000000"]]}"#,
        )
        .unwrap();
        let book = depth.into_raw("BTC/USDT");
        assert_eq!(book.bids, vec![[4.0, 431.0]]);
        assert_eq!(book.nonce, Some(1027024));

        let trade: PublicTrade = serde_json::from_str(
            r#"{"id":28457,"price":"4.0","qty":"12.0","quoteQty":"48.0","time":1499865549590,"isBuyerMaker":true,"isBestMatch":true}"#,
        )
        .unwrap();
        assert_eq!(trade.into_raw("BTC/USDT").side.as_deref(), Some("sell"));
    }

    #[test]
    fn order_fields_are_unified() {
        let order: OrderInfo = serde_json::from_str(
            r#"{"symbol":"BTCUSDT","orderId":28,"clientOrderId":"6gCrw2kRUAF9CvJDGP16IP",
                "price":"100.0","origQty":"10.0","executedQty":"4.0",
                "cummulativeQuoteQty":"400.0","status":"PARTIALLY_FILLED","type":"LIMIT",
                "side":"SELL","stopPrice":"0.0","time":1507725176595}"#,
        )
        .unwrap();
        assert!(order.is_open());
        let raw = order.into_raw(&symbol_map());
        assert_eq!(raw.id.as_deref(), Some("28"));
        assert_eq!(raw.symbol.as_deref(), Some("BTC/USDT"));
        assert_eq!(raw.side.as_deref(), Some("sell"));
        assert_eq!(raw.order_type.as_deref(), Some("limit"));
        assert_eq!(raw.remaining, Some(6.0));
        assert_eq!(raw.average, Some(100.0));
        assert_eq!(raw.trigger_price, None);
    }

    #[test]
    fn statuses_map_to_unified_names() {
        assert_eq!(order_status("FILLED"), "closed");
        assert_eq!(order_status("CANCELED"), "canceled");
        assert_eq!(order_status("EXPIRED_IN_MATCH"), "expired");
        assert_eq!(order_status("SOMETHING_NEW"), "SOMETHING_NEW");
    }

    #[test]
    fn coin_networks_convert() {
        let coin: CoinInfo = serde_json::from_str(
            r#"{"coin":"BTC","name":"Bitcoin","trading":true,"depositAllEnable":true,
                "withdrawAllEnable":false,"networkList":[
                  {"network":"BTC","withdrawFee":"0.0005","withdrawMin":"0.001",
                   "withdrawMax":"9000","withdrawIntegerMultiple":"0.00000001",
                   "depositEnable":true,"withdrawEnable":false,"isDefault":true}]}"#,
        )
        .unwrap();
        let raw = RawCurrency::from(coin);
        assert_eq!(raw.fee, Some(0.0005));
        assert_eq!(raw.networks.len(), 1);
        assert_eq!(raw.networks[0].limits.withdraw.min, Some(0.001));
        assert_eq!(raw.withdraw, Some(false));
    }
}

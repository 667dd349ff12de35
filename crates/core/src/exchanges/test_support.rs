//! Hand-written mocks shared by the exchange tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::*;
use crate::auth::DataStatus;
use crate::errors::{AdapterError, Error, Result};

// =========================================================================
// Mock adapter
// =========================================================================

/// Counters and canned responses shared between a factory and its adapters.
#[derive(Default)]
pub struct VenueScript {
    pub created: AtomicUsize,
    pub loads: AtomicUsize,
    pub sign_ins: AtomicUsize,
    pub sandbox_calls: Mutex<Vec<bool>>,
    pub configs: Mutex<Vec<ConnectionConfig>>,
    pub load_delay: Mutex<Option<Duration>>,
    pub fail_load: Mutex<bool>,
    pub fail_sign_in_once: Mutex<bool>,
    pub open_orders: Mutex<Vec<RawOrder>>,
    pub closed_orders: Mutex<Vec<RawOrder>>,
    pub order_windows: Mutex<Vec<OrderWindow>>,
    pub balances: Mutex<RawBalances>,
    pub tickers: Mutex<Vec<RawTicker>>,
}

impl VenueScript {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub struct MockAdapter {
    exchange: Exchange,
    script: Arc<VenueScript>,
    sandbox_capable: bool,
    sign_in_capable: bool,
}

#[async_trait]
impl ExchangeAdapter for MockAdapter {
    fn exchange(&self) -> Exchange {
        self.exchange
    }

    fn as_sandbox_mut(&mut self) -> Option<&mut dyn SupportsSandbox> {
        if self.sandbox_capable {
            Some(self)
        } else {
            None
        }
    }

    fn as_sign_in(&self) -> Option<&dyn SupportsSignIn> {
        if self.sign_in_capable {
            Some(self)
        } else {
            None
        }
    }

    async fn load_markets(&self) -> AdapterResult<()> {
        self.script.loads.fetch_add(1, Ordering::SeqCst);
        let delay = *self.script.load_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *self.script.fail_load.lock().unwrap() {
            return Err(AdapterError::Network("connection reset".to_string()));
        }
        Ok(())
    }

    fn symbols(&self) -> Vec<String> {
        vec![
            "ETH/USDT".to_string(),
            "BTC/USDT".to_string(),
            "ETH/USDT".to_string(),
        ]
    }

    fn timeframes(&self) -> Vec<String> {
        vec!["1d".to_string(), "1h".to_string(), "1m".to_string()]
    }

    fn markets(&self) -> Vec<RawMarket> {
        vec![
            RawMarket {
                symbol: Some("BTC/USDT".to_string()),
                spot: Some(true),
                margin: Some(true),
                ..Default::default()
            },
            RawMarket {
                symbol: Some("ETH/USDT".to_string()),
                spot: Some(true),
                margin: Some(false),
                ..Default::default()
            },
        ]
    }

    fn currencies(&self) -> Vec<RawCurrency> {
        vec![
            RawCurrency {
                code: Some("USDT".to_string()),
                fee: Some(f64::NAN),
                ..Default::default()
            },
            RawCurrency {
                code: Some("BTC".to_string()),
                ..Default::default()
            },
        ]
    }

    async fn fetch_tickers(&self, _symbols: &[String]) -> AdapterResult<Vec<RawTicker>> {
        Ok(self.script.tickers.lock().unwrap().clone())
    }

    async fn fetch_ohlcv(&self, _symbol: &str, _timeframe: &str) -> AdapterResult<Vec<RawOhlcv>> {
        Err(AdapterError::Exchange {
            code: -1120,
            message: "Invalid interval.".to_string(),
        })
    }

    async fn fetch_trades(&self, _symbol: &str) -> AdapterResult<Vec<RawTrade>> {
        Ok(Vec::new())
    }

    async fn fetch_order_book(&self, symbol: &str) -> AdapterResult<RawOrderBook> {
        Ok(RawOrderBook {
            symbol: Some(symbol.to_string()),
            bids: vec![[100.0, f64::NAN]],
            ..Default::default()
        })
    }

    async fn fetch_balance(&self, _market_type: MarketType) -> AdapterResult<RawBalances> {
        Ok(self.script.balances.lock().unwrap().clone())
    }

    async fn fetch_closed_orders(&self, window: &OrderWindow) -> AdapterResult<Vec<RawOrder>> {
        self.script.order_windows.lock().unwrap().push(window.clone());
        Ok(self.script.closed_orders.lock().unwrap().clone())
    }

    async fn fetch_open_orders(&self, _window: &OrderWindow) -> AdapterResult<Vec<RawOrder>> {
        Ok(self.script.open_orders.lock().unwrap().clone())
    }

    async fn create_order(&self, order: &NewOrder) -> AdapterResult<RawOrder> {
        Ok(RawOrder {
            id: Some("42".to_string()),
            symbol: Some(order.symbol.clone()),
            amount: Some(order.amount),
            price: order.price,
            status: Some("open".to_string()),
            ..Default::default()
        })
    }

    async fn cancel_order(&self, order_id: &str, _symbol: Option<&str>) -> AdapterResult<RawOrder> {
        Ok(RawOrder {
            id: Some(order_id.to_string()),
            status: Some("canceled".to_string()),
            ..Default::default()
        })
    }
}

impl SupportsSandbox for MockAdapter {
    fn set_sandbox_mode(&mut self, enabled: bool) {
        self.script.sandbox_calls.lock().unwrap().push(enabled);
    }
}

#[async_trait]
impl SupportsSignIn for MockAdapter {
    async fn sign_in(&self) -> AdapterResult<()> {
        self.script.sign_ins.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        let mut fail = self.script.fail_sign_in_once.lock().unwrap();
        if *fail {
            *fail = false;
            return Err(AdapterError::Authentication("session rejected".to_string()));
        }
        Ok(())
    }
}

// =========================================================================
// Mock factory
// =========================================================================

pub struct MockFactory {
    pub script: Arc<VenueScript>,
    /// Exchanges this factory can build, everything else is not found.
    pub supported: Vec<Exchange>,
    pub sandbox_capable: bool,
    pub sign_in_capable: bool,
}

impl MockFactory {
    pub fn new(script: Arc<VenueScript>) -> Self {
        Self {
            script,
            supported: vec![Exchange::Binance, Exchange::Probit],
            sandbox_capable: true,
            sign_in_capable: false,
        }
    }
}

impl AdapterFactory for MockFactory {
    fn create(&self, config: &ConnectionConfig) -> Result<Box<dyn ExchangeAdapter>> {
        if !self.supported.contains(&config.exchange) {
            return Err(Error::ExchangeNotFound(config.exchange.to_string()));
        }
        self.script.created.fetch_add(1, Ordering::SeqCst);
        self.script.configs.lock().unwrap().push(config.clone());
        Ok(Box::new(MockAdapter {
            exchange: config.exchange,
            script: self.script.clone(),
            sandbox_capable: self.sandbox_capable,
            sign_in_capable: self.sign_in_capable,
        }))
    }
}

// =========================================================================
// Mock credential store
// =========================================================================

#[derive(Clone, Default)]
pub struct MockCredentialStore {
    accounts: Arc<Mutex<HashMap<String, TradingAccount>>>,
    pub lookups: Arc<AtomicUsize>,
}

impl MockCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, account: TradingAccount) {
        self.accounts
            .lock()
            .unwrap()
            .insert(account.id.clone(), account);
    }
}

#[async_trait]
impl CredentialStoreTrait for MockCredentialStore {
    async fn find_account(&self, trading_account_id: &str) -> Result<TradingAccount> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.accounts
            .lock()
            .unwrap()
            .get(trading_account_id)
            .cloned()
            .ok_or_else(|| Error::TraderNotFound(trading_account_id.to_string()))
    }
}

pub fn account(id: &str, tenant: &str, exchange: Exchange) -> TradingAccount {
    TradingAccount {
        id: id.to_string(),
        name: format!("{id} account"),
        exchange,
        tenant_id: tenant.to_string(),
        sandbox: false,
        api_key: "key".to_string(),
        api_secret: "secret".to_string(),
        api_password: String::new(),
        data_status: DataStatus::Enable,
    }
}

pub fn raw_order(id: &str) -> RawOrder {
    RawOrder {
        id: Some(id.to_string()),
        price: Some(f64::NAN),
        ..Default::default()
    }
}

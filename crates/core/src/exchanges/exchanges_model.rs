//! Exchange identity, configuration and order request models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::auth::DataStatus;
use crate::errors::{Error, Result};

/// Trading venues the gateway knows about.
///
/// The set is closed; any other name resolves to [`Error::ExchangeNotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Binance,
    Bitget,
    Bybit,
    Cex,
    Gate,
    Mexc,
    Probit,
}

impl Exchange {
    pub const ALL: [Exchange; 7] = [
        Exchange::Binance,
        Exchange::Bitget,
        Exchange::Bybit,
        Exchange::Cex,
        Exchange::Gate,
        Exchange::Mexc,
        Exchange::Probit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Binance => "binance",
            Exchange::Bitget => "bitget",
            Exchange::Bybit => "bybit",
            Exchange::Cex => "cex",
            Exchange::Gate => "gate",
            Exchange::Mexc => "mexc",
            Exchange::Probit => "probit",
        }
    }

    /// Venues whose order history endpoints reject unbounded queries.
    pub fn requires_order_window(&self) -> bool {
        matches!(self, Exchange::Probit)
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        Exchange::ALL
            .into_iter()
            .find(|exchange| exchange.as_str() == name)
            .ok_or_else(|| Error::ExchangeNotFound(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketType {
    Spot,
    Margin,
}

impl MarketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketType::Spot => "spot",
            MarketType::Margin => "margin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Limit,
    Market,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// Cache key of the connection registry.
///
/// An identity without a trading account names an anonymous connection used
/// for public market data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionIdentity {
    pub exchange: Exchange,
    pub tenant_id: Option<String>,
    pub trading_account_id: Option<String>,
    pub sandbox: bool,
}

impl ConnectionIdentity {
    pub fn anonymous(exchange: Exchange, sandbox: bool) -> Self {
        Self {
            exchange,
            tenant_id: None,
            trading_account_id: None,
            sandbox,
        }
    }

    pub fn for_account(
        exchange: Exchange,
        tenant_id: impl Into<String>,
        trading_account_id: impl Into<String>,
        sandbox: bool,
    ) -> Self {
        Self {
            exchange,
            tenant_id: Some(tenant_id.into()),
            trading_account_id: Some(trading_account_id.into()),
            sandbox,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.trading_account_id.is_none()
    }
}

impl fmt::Display for ConnectionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.exchange,
            self.tenant_id.as_deref().unwrap_or(""),
            self.trading_account_id.as_deref().unwrap_or(""),
            self.sandbox
        )
    }
}

/// A venue API key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
    pub password: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Trading account as returned by the credential store, credentials decrypted.
#[derive(Clone, PartialEq, Eq)]
pub struct TradingAccount {
    pub id: String,
    pub name: String,
    pub exchange: Exchange,
    pub tenant_id: String,
    pub sandbox: bool,
    pub api_key: String,
    pub api_secret: String,
    pub api_password: String,
    pub data_status: DataStatus,
}

/// Masks a secret for `Debug` output. Empty secrets stay visibly empty.
pub fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        "<redacted>"
    }
}

impl fmt::Debug for TradingAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TradingAccount")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("exchange", &self.exchange)
            .field("tenant_id", &self.tenant_id)
            .field("sandbox", &self.sandbox)
            .field("api_key", &redact(&self.api_key))
            .field("api_secret", &redact(&self.api_secret))
            .field("api_password", &redact(&self.api_password))
            .field("data_status", &self.data_status)
            .finish()
    }
}

/// Everything needed to build one adapter. Lives only in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub exchange: Exchange,
    pub tenant_id: Option<String>,
    pub trading_account_id: Option<String>,
    pub credentials: Option<Credentials>,
    pub sandbox: bool,
}

impl ConnectionConfig {
    pub fn anonymous(identity: &ConnectionIdentity) -> Self {
        Self {
            exchange: identity.exchange,
            tenant_id: identity.tenant_id.clone(),
            trading_account_id: None,
            credentials: None,
            sandbox: identity.sandbox,
        }
    }

    /// Builds a config from a resolved account.
    ///
    /// Credentials are attached only when both key and secret are present.
    pub fn from_account(identity: &ConnectionIdentity, account: TradingAccount) -> Self {
        let credentials = if !account.api_key.is_empty() && !account.api_secret.is_empty() {
            Some(Credentials {
                api_key: account.api_key,
                api_secret: account.api_secret,
                password: Some(account.api_password).filter(|p| !p.is_empty()),
            })
        } else {
            None
        };

        Self {
            exchange: identity.exchange,
            tenant_id: Some(account.tenant_id),
            trading_account_id: Some(account.id),
            credentials,
            sandbox: identity.sandbox,
        }
    }
}

/// Order placement request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub symbol: String,
    pub order_type: OrderType,
    pub order_side: OrderSide,
    pub amount: f64,
    #[serde(default)]
    pub price: Option<f64>,
}

impl NewOrder {
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(Error::Validation("symbol is required".to_string()));
        }
        if !(self.amount.is_finite() && self.amount > 0.0) {
            return Err(Error::Validation("amount must be positive".to_string()));
        }
        match (self.order_type, self.price) {
            (OrderType::Limit, Some(price)) if price.is_finite() && price > 0.0 => Ok(()),
            (OrderType::Limit, _) => Err(Error::Validation(
                "limit orders require a positive price".to_string(),
            )),
            (OrderType::Market, _) => Ok(()),
        }
    }
}

/// Bounds passed to order history requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderWindow {
    pub symbol: String,
    /// Inclusive lower bound, unix millis.
    pub since: Option<i64>,
    /// Inclusive upper bound, unix millis.
    pub until: Option<i64>,
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_parses_case_insensitively() {
        assert_eq!("Binance".parse::<Exchange>().unwrap(), Exchange::Binance);
        assert_eq!(" probit ".parse::<Exchange>().unwrap(), Exchange::Probit);
        assert!(matches!(
            "kraken".parse::<Exchange>(),
            Err(Error::ExchangeNotFound(name)) if name == "kraken"
        ));
    }

    #[test]
    fn identity_display_matches_cache_key_layout() {
        let identity = ConnectionIdentity::for_account(Exchange::Gate, "t1", "acc1", true);
        assert_eq!(identity.to_string(), "gate-t1-acc1-true");
        assert_eq!(
            ConnectionIdentity::anonymous(Exchange::Mexc, false).to_string(),
            "mexc---false"
        );
    }

    #[test]
    fn credentials_require_key_and_secret() {
        let identity = ConnectionIdentity::for_account(Exchange::Binance, "t1", "acc1", false);
        let mut account = TradingAccount {
            id: "acc1".to_string(),
            name: "main".to_string(),
            exchange: Exchange::Binance,
            tenant_id: "t1".to_string(),
            sandbox: false,
            api_key: "key".to_string(),
            api_secret: String::new(),
            api_password: String::new(),
            data_status: DataStatus::Enable,
        };
        assert!(ConnectionConfig::from_account(&identity, account.clone())
            .credentials
            .is_none());

        account.api_secret = "secret".to_string();
        let config = ConnectionConfig::from_account(&identity, account);
        let credentials = config.credentials.expect("credentials");
        assert_eq!(credentials.api_key, "key");
        assert_eq!(credentials.password, None);
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let credentials = Credentials {
            api_key: "AKIA".to_string(),
            api_secret: "s3cr3t".to_string(),
            password: None,
        };
        let rendered = format!("{credentials:?}");
        assert!(!rendered.contains("AKIA"));
        assert!(!rendered.contains("s3cr3t"));
    }

    #[test]
    fn trading_account_debug_hides_secrets() {
        let account = TradingAccount {
            id: "acc1".to_string(),
            name: "main".to_string(),
            exchange: Exchange::Bitget,
            tenant_id: "t1".to_string(),
            sandbox: false,
            api_key: "AKIA".to_string(),
            api_secret: "s3cr3t".to_string(),
            api_password: "pa55".to_string(),
            data_status: DataStatus::Enable,
        };
        let rendered = format!("{account:?}");
        for secret in ["AKIA", "s3cr3t", "pa55"] {
            assert!(!rendered.contains(secret), "{rendered}");
        }
        assert!(rendered.contains("acc1"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn order_validation() {
        let mut order = NewOrder {
            symbol: "BTC/USDT".to_string(),
            order_type: OrderType::Limit,
            order_side: OrderSide::Buy,
            amount: 0.5,
            price: None,
        };
        assert!(matches!(order.validate(), Err(Error::Validation(_))));

        order.price = Some(30_000.0);
        assert!(order.validate().is_ok());

        order.amount = 0.0;
        assert!(matches!(order.validate(), Err(Error::Validation(_))));

        order.amount = 1.0;
        order.order_type = OrderType::Market;
        order.price = None;
        assert!(order.validate().is_ok());
    }
}

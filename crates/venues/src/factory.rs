use std::time::Duration;

use log::debug;
use reqwest::Client;

use coinhub_core::exchanges::{AdapterFactory, ConnectionConfig, Exchange, ExchangeAdapter};
use coinhub_core::{Error, Result};

use crate::binance::BinanceAdapter;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds venue clients that share one HTTP connection pool.
pub struct VenueFactory {
    http: Client,
}

impl VenueFactory {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_HTTP_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { http }
    }

    /// Exchanges this factory can build a client for.
    pub fn supported() -> &'static [Exchange] {
        &[Exchange::Binance]
    }
}

impl Default for VenueFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl AdapterFactory for VenueFactory {
    fn create(&self, config: &ConnectionConfig) -> Result<Box<dyn ExchangeAdapter>> {
        match config.exchange {
            Exchange::Binance => {
                debug!(
                    "Creating Binance client (authenticated: {})",
                    config.credentials.is_some()
                );
                Ok(Box::new(BinanceAdapter::new(
                    self.http.clone(),
                    config.credentials.clone(),
                )))
            }
            other => Err(Error::ExchangeNotFound(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use coinhub_core::exchanges::ConnectionIdentity;

    use super::*;

    #[test]
    fn builds_binance_and_rejects_the_rest() {
        let factory = VenueFactory::new();
        for exchange in Exchange::ALL {
            let identity = ConnectionIdentity::anonymous(exchange, false);
            let config = ConnectionConfig::anonymous(&identity);
            match factory.create(&config) {
                Ok(adapter) => {
                    assert!(VenueFactory::supported().contains(&exchange));
                    assert_eq!(adapter.exchange(), exchange);
                }
                Err(Error::ExchangeNotFound(name)) => {
                    assert!(!VenueFactory::supported().contains(&exchange));
                    assert_eq!(name, exchange.as_str());
                }
                Err(other) => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn binance_client_has_a_sandbox() {
        let config =
            ConnectionConfig::anonymous(&ConnectionIdentity::anonymous(Exchange::Binance, true));
        let mut adapter = VenueFactory::new().create(&config).unwrap();
        assert!(adapter.as_sandbox_mut().is_some());
    }
}

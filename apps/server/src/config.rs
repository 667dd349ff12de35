use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::Context;

/// Headroom of the HTTP layer over the exchange call deadline.
const HTTP_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

pub struct Config {
    pub listen_addr: SocketAddr,
    /// Client whose credentials sign access and refresh tokens.
    pub client_id: String,
    /// Base64 master key for trading account credentials.
    pub secret_key: String,
    pub seed_file: Option<PathBuf>,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub warm_up: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let listen_addr: SocketAddr = std::env::var("COINHUB_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .context("Invalid COINHUB_LISTEN_ADDR")?;
        let client_id =
            std::env::var("COINHUB_CLIENT_ID").context("COINHUB_CLIENT_ID must be set")?;
        let secret_key =
            std::env::var("COINHUB_SECRET_KEY").context("COINHUB_SECRET_KEY must be set")?;
        let seed_file = std::env::var("COINHUB_SEED_FILE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);
        let cors_allow = std::env::var("COINHUB_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 = std::env::var("COINHUB_REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".into())
            .parse()
            .unwrap_or(30000);
        let warm_up = std::env::var("COINHUB_WARM_UP")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Ok(Self {
            listen_addr,
            client_id,
            secret_key,
            seed_file,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            warm_up,
        })
    }

    /// Whole-request limit enforced by the HTTP layer.
    pub fn http_timeout(&self) -> Duration {
        self.request_timeout + HTTP_TIMEOUT_MARGIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_timeout_outlasts_the_exchange_deadline() {
        let config = Config {
            listen_addr: "127.0.0.1:0".parse().unwrap(),
            client_id: "web".to_string(),
            secret_key: String::new(),
            seed_file: None,
            cors_allow: Vec::new(),
            request_timeout: Duration::from_millis(250),
            warm_up: false,
        };
        assert!(config.http_timeout() > config.request_timeout);
        assert_eq!(config.http_timeout(), Duration::from_millis(5250));
    }
}

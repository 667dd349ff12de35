use std::sync::Arc;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use coinhub_core::auth::{IdentityStoreTrait, TokenService, TokenServiceConfig, TokenServiceTrait};
use coinhub_core::exchanges::{ConnectionRegistry, ExchangeService, ExchangeServiceTrait};
use coinhub_storage_memory::{
    load_seed, CredentialCipher, MemoryIdentityStore, MemoryRevocationStore,
    MemoryTradingAccountStore,
};
use coinhub_venues::VenueFactory;

use crate::config::Config;
use crate::scheduler::start_revocation_purge;

pub struct AppState {
    pub exchange_service: Arc<dyn ExchangeServiceTrait>,
    pub token_service: Arc<dyn TokenServiceTrait>,
    pub identity_store: Arc<dyn IdentityStoreTrait>,
    pub accounts: Arc<MemoryTradingAccountStore>,
    pub registry: Arc<ConnectionRegistry>,
}

pub fn init_tracing() {
    let log_format = std::env::var("COINHUB_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let cipher = CredentialCipher::from_encoded(&config.secret_key)?;
    let identity_store = Arc::new(MemoryIdentityStore::new());
    let account_store = Arc::new(MemoryTradingAccountStore::new(cipher));
    let revocation_store = Arc::new(MemoryRevocationStore::new());

    match &config.seed_file {
        Some(path) => {
            tracing::info!("Loading seed data from {}", path.display());
            load_seed(path)?.apply(&identity_store, &account_store)?;
        }
        None => tracing::warn!("No seed file configured, starting with empty stores"),
    }

    let registry = Arc::new(ConnectionRegistry::new(
        account_store.clone(),
        Arc::new(VenueFactory::with_timeout(config.request_timeout)),
    ));
    let exchange_service: Arc<dyn ExchangeServiceTrait> =
        Arc::new(ExchangeService::new(registry.clone()).with_timeout(config.request_timeout));

    let token_service: Arc<dyn TokenServiceTrait> = Arc::new(TokenService::new(
        identity_store.clone(),
        revocation_store.clone(),
        TokenServiceConfig {
            client_id: config.client_id.clone(),
        },
    ));

    start_revocation_purge(revocation_store);

    Ok(Arc::new(AppState {
        exchange_service,
        token_service,
        identity_store,
        accounts: account_store,
        registry,
    }))
}

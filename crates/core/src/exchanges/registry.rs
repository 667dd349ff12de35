//! Keyed cache of materialized exchange connections.
//!
//! Each identity maps to a slot holding a `OnceCell`. Concurrent misses for
//! the same identity wait on the same cell, so the credential lookup, adapter
//! construction and market load happen once. A failed materialization drops
//! its slot again and the cache stays unpopulated.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, info, warn};
use tokio::sync::OnceCell;

use super::connection::ExchangeConnection;
use super::exchanges_model::{ConnectionConfig, ConnectionIdentity, Exchange};
use super::exchanges_traits::CredentialStoreTrait;
use super::AdapterFactory;
use crate::auth::DataStatus;
use crate::errors::{Error, Result};

type Slot = Arc<OnceCell<Arc<ExchangeConnection>>>;

pub struct ConnectionRegistry {
    credential_store: Arc<dyn CredentialStoreTrait>,
    adapter_factory: Arc<dyn AdapterFactory>,
    connections: RwLock<HashMap<ConnectionIdentity, Slot>>,
}

impl ConnectionRegistry {
    pub fn new(
        credential_store: Arc<dyn CredentialStoreTrait>,
        adapter_factory: Arc<dyn AdapterFactory>,
    ) -> Self {
        Self {
            credential_store,
            adapter_factory,
            connections: RwLock::new(HashMap::new()),
        }
    }

    fn read_connections(&self) -> RwLockReadGuard<'_, HashMap<ConnectionIdentity, Slot>> {
        self.connections.read().unwrap_or_else(|poisoned| {
            warn!("Connection registry lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_connections(&self) -> RwLockWriteGuard<'_, HashMap<ConnectionIdentity, Slot>> {
        self.connections.write().unwrap_or_else(|poisoned| {
            warn!("Connection registry lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn slot(&self, identity: &ConnectionIdentity) -> Slot {
        if let Some(slot) = self.read_connections().get(identity) {
            return slot.clone();
        }
        self.write_connections()
            .entry(identity.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }

    /// Returns the cached connection for `identity`, materializing it on a miss.
    pub async fn get_connection(
        &self,
        identity: &ConnectionIdentity,
    ) -> Result<Arc<ExchangeConnection>> {
        let slot = self.slot(identity);
        match slot.get_or_try_init(|| self.materialize(identity)).await {
            Ok(connection) => Ok(connection.clone()),
            Err(err) => {
                let mut connections = self.write_connections();
                let stale = connections
                    .get(identity)
                    .is_some_and(|current| Arc::ptr_eq(current, &slot) && !current.initialized());
                if stale {
                    connections.remove(identity);
                }
                Err(err)
            }
        }
    }

    async fn resolve_config(&self, identity: &ConnectionIdentity) -> Result<ConnectionConfig> {
        let Some(account_id) = identity.trading_account_id.as_deref() else {
            return Ok(ConnectionConfig::anonymous(identity));
        };

        let account = self.credential_store.find_account(account_id).await?;
        if account.data_status == DataStatus::Disable {
            return Err(Error::TraderDisabled(account_id.to_string()));
        }
        let tenant_matches = identity
            .tenant_id
            .as_deref()
            .map_or(true, |tenant| tenant == account.tenant_id);
        if !tenant_matches || account.exchange != identity.exchange {
            debug!(
                "Trading account {} does not belong to {}",
                account_id, identity
            );
            return Err(Error::TraderNotFound(account_id.to_string()));
        }
        Ok(ConnectionConfig::from_account(identity, account))
    }

    async fn materialize(&self, identity: &ConnectionIdentity) -> Result<Arc<ExchangeConnection>> {
        let config = self.resolve_config(identity).await?;
        let mut adapter = self.adapter_factory.create(&config)?;

        match adapter.as_sandbox_mut() {
            Some(sandbox) => sandbox.set_sandbox_mode(config.sandbox),
            None if config.sandbox => {
                debug!("{} has no sandbox, ignoring sandbox flag", identity.exchange)
            }
            None => {}
        }

        let connection = ExchangeConnection::new(identity.clone(), adapter);
        connection.load_markets().await?;
        info!(
            "Materialized connection {} (authenticated: {})",
            identity,
            config.credentials.is_some()
        );
        Ok(Arc::new(connection))
    }

    /// Evicts one identity. Returns true if a connection was cached.
    pub fn del_connection(&self, identity: &ConnectionIdentity) -> bool {
        let removed = self.write_connections().remove(identity);
        let existed = removed.is_some_and(|slot| slot.initialized());
        if existed {
            info!("Evicted connection {}", identity);
        }
        existed
    }

    /// Evicts every connection built from one trading account.
    pub fn evict_trading_account(&self, trading_account_id: &str) -> usize {
        let mut connections = self.write_connections();
        let before = connections.len();
        connections.retain(|identity, _| {
            identity.trading_account_id.as_deref() != Some(trading_account_id)
        });
        let evicted = before - connections.len();
        if evicted > 0 {
            info!(
                "Evicted {} connection(s) for trading account {}",
                evicted, trading_account_id
            );
        }
        evicted
    }

    /// Whether a materialized connection is cached for `identity`.
    pub fn contains(&self, identity: &ConnectionIdentity) -> bool {
        self.read_connections()
            .get(identity)
            .is_some_and(|slot| slot.initialized())
    }

    /// Number of materialized connections.
    pub fn len(&self) -> usize {
        self.read_connections()
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pre-materializes anonymous connections for every exchange, both modes.
    ///
    /// Venue failures are logged and skipped. Returns the number of
    /// connections that came up.
    pub async fn warm_up(&self) -> usize {
        let identities: Vec<ConnectionIdentity> = Exchange::ALL
            .into_iter()
            .flat_map(|exchange| {
                [false, true]
                    .into_iter()
                    .map(move |sandbox| ConnectionIdentity::anonymous(exchange, sandbox))
            })
            .collect();

        let results = futures::future::join_all(
            identities
                .iter()
                .map(|identity| self.get_connection(identity)),
        )
        .await;

        let mut ready = 0;
        for (identity, result) in identities.iter().zip(results) {
            match result {
                Ok(_) => ready += 1,
                Err(Error::ExchangeNotFound(_)) => {
                    debug!("No client available for {}, skipping warm-up", identity)
                }
                Err(err) => warn!("Warm-up of {} failed: {}", identity, err),
            }
        }
        info!("Warmed up {} exchange connection(s)", ready);
        ready
    }
}

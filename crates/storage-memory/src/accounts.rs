//! Trading account store with credentials encrypted at rest.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use log::debug;

use coinhub_core::auth::DataStatus;
use coinhub_core::errors::{Error, Result};
use coinhub_core::exchanges::{CredentialStoreTrait, Exchange, TradingAccount};

use crate::cipher::CredentialCipher;
use crate::errors::StorageError;

/// Account record as held in memory. Secret fields are sealed under the
/// owning tenant's key; empty secrets stay empty.
#[derive(Debug, Clone)]
struct StoredAccount {
    id: String,
    name: String,
    exchange: Exchange,
    tenant_id: String,
    sandbox: bool,
    api_key: String,
    api_secret: String,
    api_password: String,
    data_status: DataStatus,
}

type Accounts = HashMap<String, StoredAccount>;

#[derive(Debug)]
pub struct MemoryTradingAccountStore {
    cipher: CredentialCipher,
    accounts: RwLock<Accounts>,
}

impl MemoryTradingAccountStore {
    pub fn new(cipher: CredentialCipher) -> Self {
        Self {
            cipher,
            accounts: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> std::result::Result<RwLockReadGuard<'_, Accounts>, StorageError> {
        self.accounts
            .read()
            .map_err(|_| StorageError::LockPoisoned("trading accounts"))
    }

    fn write(&self) -> std::result::Result<RwLockWriteGuard<'_, Accounts>, StorageError> {
        self.accounts
            .write()
            .map_err(|_| StorageError::LockPoisoned("trading accounts"))
    }

    fn seal(&self, tenant_id: &str, value: &str) -> std::result::Result<String, StorageError> {
        if value.is_empty() {
            return Ok(String::new());
        }
        self.cipher.encrypt(tenant_id, value)
    }

    fn open(&self, tenant_id: &str, value: &str) -> std::result::Result<String, StorageError> {
        if value.is_empty() {
            return Ok(String::new());
        }
        self.cipher.decrypt(tenant_id, value)
    }

    /// Inserts or replaces an account, encrypting its credentials.
    ///
    /// An id already owned by another tenant is reported as
    /// [`Error::TraderNotFound`] and left untouched.
    pub fn upsert(&self, account: TradingAccount) -> Result<()> {
        let stored = StoredAccount {
            api_key: self.seal(&account.tenant_id, &account.api_key)?,
            api_secret: self.seal(&account.tenant_id, &account.api_secret)?,
            api_password: self.seal(&account.tenant_id, &account.api_password)?,
            id: account.id,
            name: account.name,
            exchange: account.exchange,
            tenant_id: account.tenant_id,
            sandbox: account.sandbox,
            data_status: account.data_status,
        };
        let mut accounts = self.write()?;
        if let Some(existing) = accounts.get(&stored.id) {
            if existing.tenant_id != stored.tenant_id {
                return Err(Error::TraderNotFound(stored.id));
            }
        }
        debug!("Storing trading account {}", stored.id);
        accounts.insert(stored.id.clone(), stored);
        Ok(())
    }

    /// Deletes a tenant's account. Returns false when the tenant owns no such account.
    pub fn remove(&self, tenant_id: &str, trading_account_id: &str) -> Result<bool> {
        let mut accounts = self.write()?;
        let owned = accounts
            .get(trading_account_id)
            .is_some_and(|a| a.tenant_id == tenant_id);
        if owned {
            accounts.remove(trading_account_id);
            debug!("Removed trading account {}", trading_account_id);
        }
        Ok(owned)
    }

    pub fn set_status(
        &self,
        tenant_id: &str,
        trading_account_id: &str,
        status: DataStatus,
    ) -> Result<()> {
        let mut accounts = self.write()?;
        let account = accounts
            .get_mut(trading_account_id)
            .filter(|a| a.tenant_id == tenant_id)
            .ok_or_else(|| Error::TraderNotFound(trading_account_id.to_string()))?;
        account.data_status = status;
        Ok(())
    }

    /// Ids of every account owned by the tenant.
    pub fn list_for_tenant(&self, tenant_id: &str) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self
            .read()?
            .values()
            .filter(|a| a.tenant_id == tenant_id)
            .map(|a| a.id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}

#[async_trait]
impl CredentialStoreTrait for MemoryTradingAccountStore {
    async fn find_account(&self, trading_account_id: &str) -> Result<TradingAccount> {
        let stored = self
            .read()?
            .get(trading_account_id)
            .cloned()
            .ok_or_else(|| Error::TraderNotFound(trading_account_id.to_string()))?;

        Ok(TradingAccount {
            api_key: self.open(&stored.tenant_id, &stored.api_key)?,
            api_secret: self.open(&stored.tenant_id, &stored.api_secret)?,
            api_password: self.open(&stored.tenant_id, &stored.api_password)?,
            id: stored.id,
            name: stored.name,
            exchange: stored.exchange,
            tenant_id: stored.tenant_id,
            sandbox: stored.sandbox,
            data_status: stored.data_status,
        })
    }
}

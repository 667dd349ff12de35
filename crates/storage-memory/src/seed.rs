//! JSON seed data for the in-memory stores.
//!
//! ```json
//! {
//!   "tenants": [{ "id": "t1", "name": "Acme" }],
//!   "clients": [{ "client_id": "web", "client_secret": "...", "secure_key": "...", "tenant_id": "t1" }],
//!   "users": [{ "id": "u1", "tenant_id": "t1", "username": "alice", "password_hash": "$argon2id$..." }],
//!   "trading_accounts": [{ "id": "a1", "exchange": "binance", "tenant_id": "t1", "api_key": "...", "api_secret": "..." }]
//! }
//! ```
//!
//! Passwords are Argon2 PHC strings. Trading account secrets are given in the
//! clear and encrypted when loaded.

use std::fmt;
use std::fs;
use std::path::Path;

use log::info;
use serde::Deserialize;

use coinhub_core::auth::{Client, DataStatus, Tenant, User};
use coinhub_core::errors::Result;
use coinhub_core::exchanges::{redact, Exchange, TradingAccount};

use crate::accounts::MemoryTradingAccountStore;
use crate::errors::StorageError;
use crate::identity::MemoryIdentityStore;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Seed {
    pub tenants: Vec<Tenant>,
    pub clients: Vec<Client>,
    pub users: Vec<User>,
    pub trading_accounts: Vec<SeedTradingAccount>,
}

#[derive(Clone, Deserialize)]
pub struct SeedTradingAccount {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub exchange: Exchange,
    pub tenant_id: String,
    #[serde(default)]
    pub sandbox: bool,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    #[serde(default)]
    pub api_password: String,
    #[serde(default)]
    pub data_status: DataStatus,
}

impl fmt::Debug for SeedTradingAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedTradingAccount")
            .field("id", &self.id)
            .field("exchange", &self.exchange)
            .field("tenant_id", &self.tenant_id)
            .field("api_key", &redact(&self.api_key))
            .field("api_secret", &redact(&self.api_secret))
            .field("api_password", &redact(&self.api_password))
            .finish_non_exhaustive()
    }
}

impl From<SeedTradingAccount> for TradingAccount {
    fn from(seed: SeedTradingAccount) -> Self {
        TradingAccount {
            id: seed.id,
            name: seed.name,
            exchange: seed.exchange,
            tenant_id: seed.tenant_id,
            sandbox: seed.sandbox,
            api_key: seed.api_key,
            api_secret: seed.api_secret,
            api_password: seed.api_password,
            data_status: seed.data_status,
        }
    }
}

impl Seed {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw).map_err(StorageError::from)?)
    }

    /// Loads every record into the given stores.
    pub fn apply(
        self,
        identities: &MemoryIdentityStore,
        accounts: &MemoryTradingAccountStore,
    ) -> Result<()> {
        let counts = (
            self.tenants.len(),
            self.clients.len(),
            self.users.len(),
            self.trading_accounts.len(),
        );
        for tenant in self.tenants {
            identities.upsert_tenant(tenant)?;
        }
        for client in self.clients {
            identities.upsert_client(client)?;
        }
        for user in self.users {
            identities.upsert_user(user)?;
        }
        for account in self.trading_accounts {
            accounts.upsert(account.into())?;
        }
        info!(
            "Seeded {} tenants, {} clients, {} users, {} trading accounts",
            counts.0, counts.1, counts.2, counts.3
        );
        Ok(())
    }
}

pub fn load_seed(path: &Path) -> Result<Seed> {
    let raw = fs::read_to_string(path).map_err(StorageError::from)?;
    Seed::from_json(&raw)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use coinhub_core::auth::IdentityStoreTrait;
    use coinhub_core::exchanges::CredentialStoreTrait;
    use coinhub_core::Error;

    use super::*;
    use crate::cipher::CredentialCipher;

    const SEED: &str = r#"{
        "tenants": [{ "id": "t1", "name": "Acme" }],
        "clients": [{ "client_id": "web", "client_secret": "s", "secure_key": "k", "tenant_id": "t1" }],
        "users": [{ "id": "u1", "tenant_id": "t1", "username": "alice", "permissions": ["coin_view"] }],
        "trading_accounts": [{ "id": "a1", "exchange": "binance", "tenant_id": "t1", "api_key": "k", "api_secret": "s" }]
    }"#;

    #[tokio::test]
    async fn seed_file_populates_stores() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SEED.as_bytes()).unwrap();

        let identities = MemoryIdentityStore::new();
        let accounts = MemoryTradingAccountStore::new(CredentialCipher::new([9u8; 32]));
        load_seed(file.path())
            .unwrap()
            .apply(&identities, &accounts)
            .unwrap();

        assert_eq!(identities.get_client("web").await.unwrap().tenant_id, "t1");
        assert_eq!(identities.get_tenant("t1").await.unwrap().data_status, DataStatus::Enable);
        assert_eq!(identities.find_user_by_username("alice").await.unwrap().id, "u1");

        let account = accounts.find_account("a1").await.unwrap();
        assert_eq!(account.exchange, Exchange::Binance);
        assert_eq!(account.api_secret, "s");
        assert!(!account.sandbox);
    }

    #[test]
    fn malformed_seed_is_a_repository_error() {
        assert!(matches!(Seed::from_json("{ nope"), Err(Error::Repository(_))));
        assert!(matches!(
            load_seed(Path::new("/definitely/not/here.json")),
            Err(Error::Repository(_))
        ));
    }

    #[test]
    fn seed_debug_hides_account_secrets() {
        let raw = SEED
            .replace("\"api_key\": \"k\"", "\"api_key\": \"AKIA-live\"")
            .replace("\"api_secret\": \"s\" }", "\"api_secret\": \"s3cr3t-live\" }");
        let seed = Seed::from_json(&raw).unwrap();
        let rendered = format!("{seed:?}");
        assert!(!rendered.contains("AKIA-live"), "{rendered}");
        assert!(!rendered.contains("s3cr3t-live"), "{rendered}");
        assert!(rendered.contains("a1"));
    }

    #[test]
    fn empty_object_is_an_empty_seed() {
        let seed = Seed::from_json("{}").unwrap();
        assert!(seed.users.is_empty() && seed.trading_accounts.is_empty());
    }
}

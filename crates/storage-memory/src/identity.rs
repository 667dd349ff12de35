//! Clients, tenants and users, with a read-through user cache.
//!
//! Token validation reads users through the cache. Every write to a user
//! record drops the cached copy while the record lock is held, and cache
//! fills happen under the record read lock, so a fill can never resurrect a
//! record older than the latest write. Lock order is `users` then `user_cache`.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use log::debug;

use coinhub_core::auth::{Client, IdentityStoreTrait, Tenant, User};
use coinhub_core::errors::{Error, Result};

use crate::errors::StorageError;

type Table<T> = RwLock<HashMap<String, T>>;

fn read<'a, T>(
    table: &'a Table<T>,
    name: &'static str,
) -> std::result::Result<RwLockReadGuard<'a, HashMap<String, T>>, StorageError> {
    table.read().map_err(|_| StorageError::LockPoisoned(name))
}

fn write<'a, T>(
    table: &'a Table<T>,
    name: &'static str,
) -> std::result::Result<RwLockWriteGuard<'a, HashMap<String, T>>, StorageError> {
    table.write().map_err(|_| StorageError::LockPoisoned(name))
}

#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    clients: Table<Client>,
    tenants: Table<Tenant>,
    users: Table<User>,
    user_cache: Table<User>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_client(&self, client: Client) -> Result<()> {
        write(&self.clients, "clients")?.insert(client.client_id.clone(), client);
        Ok(())
    }

    pub fn upsert_tenant(&self, tenant: Tenant) -> Result<()> {
        write(&self.tenants, "tenants")?.insert(tenant.id.clone(), tenant);
        Ok(())
    }

    /// Inserts or replaces a user record and drops its cached copy.
    pub fn upsert_user(&self, user: User) -> Result<()> {
        let mut users = write(&self.users, "users")?;
        write(&self.user_cache, "user cache")?.remove(&user.id);
        users.insert(user.id.clone(), user);
        Ok(())
    }
}

#[async_trait]
impl IdentityStoreTrait for MemoryIdentityStore {
    async fn get_client(&self, client_id: &str) -> Result<Client> {
        read(&self.clients, "clients")?
            .get(client_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Client {client_id} not found")))
    }

    async fn get_user(&self, user_id: &str) -> Result<User> {
        if let Some(user) = read(&self.user_cache, "user cache")?.get(user_id) {
            return Ok(user.clone());
        }
        let users = read(&self.users, "users")?;
        let user = users
            .get(user_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("User {user_id} not found")))?;
        write(&self.user_cache, "user cache")?.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<User> {
        read(&self.users, "users")?
            .values()
            .find(|user| user.username == username)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("User {username} not found")))
    }

    async fn get_tenant(&self, tenant_id: &str) -> Result<Tenant> {
        read(&self.tenants, "tenants")?
            .get(tenant_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Tenant {tenant_id} not found")))
    }

    async fn increment_token_version(&self, user_id: &str) -> Result<u64> {
        let mut users = write(&self.users, "users")?;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| Error::NotFound(format!("User {user_id} not found")))?;
        user.token_version += 1;
        let version = user.token_version;
        write(&self.user_cache, "user cache")?.remove(user_id);
        Ok(version)
    }

    async fn evict_user(&self, user_id: &str) -> Result<()> {
        if write(&self.user_cache, "user cache")?.remove(user_id).is_some() {
            debug!("Evicted cached user {}", user_id);
        }
        Ok(())
    }
}

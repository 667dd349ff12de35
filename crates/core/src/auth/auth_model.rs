//! Identity records, token claims and the request session.

use std::fmt;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataStatus {
    #[default]
    Enable,
    Disable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    SystemSetting,
    SystemAuditLog,
    ClientView,
    ClientCreate,
    ClientDelete,
    RoleView,
    RoleCreate,
    RoleUpdate,
    UserView,
    UserCreate,
    UserUpdate,
    TenantView,
    TenantCreate,
    TenantUpdate,
    CoinView,
    CoinCreate,
    CoinUpdate,
    StrategyView,
    StrategyCreate,
    StrategyUpdate,
    TraderView,
    TraderCreate,
    TraderUpdate,
}

impl Permission {
    /// Everything a platform root account may do.
    pub const ROOT: &'static [Permission] = &[
        Permission::SystemSetting,
        Permission::SystemAuditLog,
        Permission::ClientView,
        Permission::ClientCreate,
        Permission::ClientDelete,
        Permission::RoleView,
        Permission::RoleCreate,
        Permission::RoleUpdate,
        Permission::UserView,
        Permission::UserCreate,
        Permission::UserUpdate,
        Permission::TenantView,
        Permission::TenantCreate,
        Permission::TenantUpdate,
        Permission::CoinView,
        Permission::CoinCreate,
        Permission::CoinUpdate,
        Permission::StrategyView,
        Permission::StrategyCreate,
        Permission::StrategyUpdate,
        Permission::TraderView,
        Permission::TraderCreate,
        Permission::TraderUpdate,
    ];

    /// Everything the root account of a single tenant may do.
    pub const TENANT: &'static [Permission] = &[
        Permission::SystemSetting,
        Permission::SystemAuditLog,
        Permission::RoleView,
        Permission::RoleCreate,
        Permission::RoleUpdate,
        Permission::UserView,
        Permission::UserCreate,
        Permission::UserUpdate,
        Permission::CoinView,
        Permission::CoinCreate,
        Permission::CoinUpdate,
        Permission::TraderView,
        Permission::TraderCreate,
        Permission::TraderUpdate,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub data_status: DataStatus,
}

/// A registered API client. Its id, secret and secure key form the signing key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub client_id: String,
    pub client_secret: String,
    pub secure_key: String,
    pub tenant_id: String,
}

impl Client {
    pub fn signing_key(&self) -> Vec<u8> {
        [
            self.client_id.as_bytes(),
            self.client_secret.as_bytes(),
            self.secure_key.as_bytes(),
        ]
        .concat()
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("client_id", &self.client_id)
            .field("tenant_id", &self.tenant_id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub tenant_id: String,
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    /// Argon2 PHC string.
    #[serde(default)]
    pub password_hash: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub is_root: bool,
    #[serde(default)]
    pub is_tenant: bool,
    /// Bumped to invalidate every token issued so far.
    #[serde(default)]
    pub token_version: u64,
    #[serde(default)]
    pub data_status: DataStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT payload shared by access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub jti: String,
    pub sub: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub token_type: TokenType,
    pub version: u64,
}

impl TokenClaims {
    /// Seconds left before expiry, zero once expired.
    pub fn remaining_secs(&self, now: i64) -> u64 {
        u64::try_from(self.exp.saturating_sub(now)).unwrap_or(0)
    }
}

/// Response of a successful login or refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub token_type: String,
}

/// Request-scoped view of an authenticated caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: String,
    pub tenant_id: String,
    pub username: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub permissions: Vec<Permission>,
    pub is_root: bool,
    pub is_tenant: bool,
    pub timezone: Tz,
    pub access_token: String,
}

impl Session {
    /// Builds the session for a validated user.
    ///
    /// Root accounts get the root permission set, or the tenant set when they
    /// are also the root of a tenant.
    pub fn for_user(user: User, timezone: Tz, access_token: String) -> Self {
        let permissions = match (user.is_root, user.is_tenant) {
            (true, true) => Permission::TENANT.to_vec(),
            (true, false) => Permission::ROOT.to_vec(),
            _ => user.permissions,
        };
        Self {
            user_id: user.id,
            tenant_id: user.tenant_id,
            username: user.username,
            name: user.name,
            email: user.email,
            phone: user.phone,
            permissions,
            is_root: user.is_root,
            is_tenant: user.is_tenant,
            timezone,
            access_token,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// True when no permission is required or any of `required` is granted.
    pub fn has_any_permission(&self, required: &[Permission]) -> bool {
        required.is_empty() || required.iter().any(|p| self.has_permission(*p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(is_root: bool, is_tenant: bool) -> User {
        User {
            id: "u1".to_string(),
            tenant_id: "t1".to_string(),
            username: "alice".to_string(),
            name: "Alice".to_string(),
            email: String::new(),
            phone: String::new(),
            password_hash: String::new(),
            permissions: vec![Permission::CoinView],
            is_root,
            is_tenant,
            token_version: 0,
            data_status: DataStatus::Enable,
        }
    }

    #[test]
    fn session_permissions_follow_role() {
        let tz = chrono_tz::Asia::Ho_Chi_Minh;
        let plain = Session::for_user(user(false, false), tz, String::new());
        assert_eq!(plain.permissions, vec![Permission::CoinView]);

        let root = Session::for_user(user(true, false), tz, String::new());
        assert!(root.has_permission(Permission::ClientDelete));
        assert!(root.has_permission(Permission::StrategyCreate));

        let tenant_root = Session::for_user(user(true, true), tz, String::new());
        assert!(!tenant_root.has_permission(Permission::ClientView));
        assert!(!tenant_root.has_permission(Permission::TenantCreate));
        assert!(!tenant_root.has_permission(Permission::StrategyView));
        assert!(tenant_root.has_permission(Permission::TraderUpdate));
    }

    #[test]
    fn any_permission_check() {
        let session = Session::for_user(user(false, false), chrono_tz::UTC, String::new());
        assert!(session.has_any_permission(&[]));
        assert!(session.has_any_permission(&[Permission::CoinCreate, Permission::CoinView]));
        assert!(!session.has_any_permission(&[Permission::CoinCreate]));
    }

    #[test]
    fn tenant_set_is_subset_of_root_set() {
        assert!(Permission::TENANT.iter().all(|p| Permission::ROOT.contains(p)));
    }

    #[test]
    fn signing_key_concatenates_client_fields() {
        let client = Client {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            secure_key: "key".to_string(),
            tenant_id: "t1".to_string(),
        };
        assert_eq!(client.signing_key(), b"idsecretkey".to_vec());
        assert!(!format!("{client:?}").contains("secret"));
    }

    #[test]
    fn permissions_serialize_snake_case() {
        let json =
            serde_json::to_string(&[Permission::SystemAuditLog, Permission::CoinView]).unwrap();
        assert_eq!(json, r#"["system_audit_log","coin_view"]"#);
    }
}

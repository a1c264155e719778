use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{NamedRef, Product};
use crate::types::{OrderId, PaymentId, Role, RoleId, SettingId, StatusId, UserId};

/// An account (`/api/users`).
///
/// `password` is only ever sent on create and login; sessions restored from
/// the local store carry an empty one.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub role_id: RoleId,
    #[serde(default)]
    pub setting_id: Option<SettingId>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

impl User {
    /// Known role, if any.
    #[must_use]
    pub const fn role(&self) -> Option<Role> {
        Role::from_id(self.role_id)
    }

    /// Whether this account has the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role_id == Role::Admin.id()
    }

    /// Copy of this user without the password.
    #[must_use]
    pub fn without_password(&self) -> Self {
        Self {
            password: String::new(),
            ..self.clone()
        }
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("role_id", &self.role_id)
            .field("setting_id", &self.setting_id)
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Body of `POST /api/users/login`.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Response of `POST /api/users/login`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub user: User,
}

/// Aggregated client view (`/api/users/details/...`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDetail {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: NamedRef,
    pub role_id: RoleId,
    #[serde(default)]
    pub settings: Option<ClientSettings>,
    #[serde(default)]
    pub setting_id: Option<SettingId>,
    #[serde(default)]
    pub orders: Vec<ClientOrder>,
}

/// Settings embedded in a [`UserDetail`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    pub id: SettingId,
    pub name: String,
    pub nickname: String,
    pub phone: i64,
    pub city: String,
    pub address: String,
    #[serde(default)]
    pub payments: Vec<NamedRef>,
}

/// Order embedded in a [`UserDetail`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientOrder {
    pub order_id: OrderId,
    pub date_order: String,
    pub status: NamedRef,
    pub status_id: StatusId,
    pub total_products: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    #[serde(default)]
    pub payment_id: Option<PaymentId>,
    #[serde(default)]
    pub products: Vec<Product>,
}

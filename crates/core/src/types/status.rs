//! Status enums for various entities.
//!
//! The backend stores statuses and roles as numeric foreign keys. These
//! enums give the well-known ids names while DTOs keep the raw ids, so that
//! unknown values coming from the backend never fail deserialization.

use serde::{Deserialize, Serialize};

use super::id::{RoleId, StatusId};

/// Order lifecycle status.
///
/// Maps to rows of `/api/statuses`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order placed, not yet shipped.
    #[default]
    Pending,
    /// Handed to the carrier.
    Shipped,
    /// Received by the customer.
    Delivered,
    /// Money returned and stock restored.
    Refunded,
}

impl OrderStatus {
    /// All known statuses in display order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::Shipped,
        Self::Delivered,
        Self::Refunded,
    ];

    /// Backend status id.
    #[must_use]
    pub const fn id(self) -> StatusId {
        match self {
            Self::Pending => StatusId::new(1),
            Self::Shipped => StatusId::new(2),
            Self::Delivered => StatusId::new(3),
            Self::Refunded => StatusId::new(4),
        }
    }

    /// Resolve a backend status id.
    #[must_use]
    pub fn from_id(id: StatusId) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    /// Spanish label shown to shoppers and administrators.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pendiente",
            Self::Shipped => "Enviado",
            Self::Delivered => "Entregado",
            Self::Refunded => "Reembolsado",
        }
    }

    /// Label for a raw status id, `Desconocido` when unknown.
    #[must_use]
    pub fn label_for(id: StatusId) -> &'static str {
        Self::from_id(id).map_or("Desconocido", Self::label)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Shipped => write!(f, "shipped"),
            Self::Delivered => write!(f, "delivered"),
            Self::Refunded => write!(f, "refunded"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" | "1" => Ok(Self::Pending),
            "shipped" | "2" => Ok(Self::Shipped),
            "delivered" | "3" => Ok(Self::Delivered),
            "refunded" | "4" => Ok(Self::Refunded),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// User role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Shopper.
    Customer,
    /// Store administrator.
    Admin,
}

impl Role {
    /// Backend role id.
    #[must_use]
    pub const fn id(self) -> RoleId {
        match self {
            Self::Customer => RoleId::new(1),
            Self::Admin => RoleId::new(2),
        }
    }

    /// Resolve a backend role id.
    #[must_use]
    pub const fn from_id(id: RoleId) -> Option<Self> {
        match id.as_i64() {
            1 => Some(Self::Customer),
            2 => Some(Self::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// Email verification status reported by the verification service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmailVerificationStatus {
    #[default]
    Unverified,
    Pending,
    Verified,
}

impl EmailVerificationStatus {
    /// Interpret the free-form status string returned by the service.
    #[must_use]
    pub fn from_service(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "verified" | "valid" | "completed" => Self::Verified,
            "pending" | "processing" | "started" => Self::Pending,
            _ => Self::Unverified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_ids_round_trip() {
        for status in OrderStatus::ALL {
            assert_eq!(OrderStatus::from_id(status.id()), Some(status));
        }
        assert_eq!(OrderStatus::from_id(StatusId::new(99)), None);
    }

    #[test]
    fn test_order_status_labels() {
        assert_eq!(OrderStatus::label_for(StatusId::new(1)), "Pendiente");
        assert_eq!(OrderStatus::label_for(StatusId::new(2)), "Enviado");
        assert_eq!(OrderStatus::label_for(StatusId::new(3)), "Entregado");
        assert_eq!(OrderStatus::label_for(StatusId::new(0)), "Desconocido");
    }

    #[test]
    fn test_order_status_from_str_accepts_ids() {
        assert_eq!("shipped".parse::<OrderStatus>(), Ok(OrderStatus::Shipped));
        assert_eq!("3".parse::<OrderStatus>(), Ok(OrderStatus::Delivered));
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_role_from_id() {
        assert_eq!(Role::from_id(RoleId::new(2)), Some(Role::Admin));
        assert_eq!(Role::from_id(RoleId::new(1)), Some(Role::Customer));
        assert_eq!(Role::from_id(RoleId::new(5)), None);
    }

    #[test]
    fn test_verification_status_from_service() {
        assert_eq!(
            EmailVerificationStatus::from_service("VERIFIED"),
            EmailVerificationStatus::Verified
        );
        assert_eq!(
            EmailVerificationStatus::from_service("pending"),
            EmailVerificationStatus::Pending
        );
        assert_eq!(
            EmailVerificationStatus::from_service("bounced"),
            EmailVerificationStatus::Unverified
        );
    }
}

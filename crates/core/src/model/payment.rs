use serde::{Deserialize, Serialize};

use super::User;
use crate::types::{PaymentDetailId, PaymentId, UserId};

/// Well-known values of [`Payment::method`].
pub mod payment_method {
    pub const PSE: &str = "PSE";
    pub const CREDIT_CARD: &str = "CREDIT_CARD";
    pub const DEBIT_CARD: &str = "DEBIT_CARD";
    pub const CASH: &str = "CASH";

    /// All known method codes.
    pub const ALL: [&str; 4] = [PSE, CREDIT_CARD, DEBIT_CARD, CASH];
}

/// A payment method offered by the store (`/api/payments`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(default)]
    pub id: PaymentId,
    pub name: String,
    pub method: String,
    #[serde(rename = "isActive", default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

impl Payment {
    /// Whether saving a detail for this method needs card fields.
    #[must_use]
    pub fn requires_card_info(&self) -> bool {
        self.method == payment_method::CREDIT_CARD || self.method == payment_method::DEBIT_CARD
    }
}

/// A shopper's saved payment configuration (`/api/payment-details`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetail {
    #[serde(default)]
    pub id: PaymentDetailId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<Payment>,
    pub payment_id: PaymentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    pub user_id: UserId,
    #[serde(rename = "cardNumber", default)]
    pub card_number: Option<String>,
    #[serde(rename = "expirationDate", default)]
    pub expiration_date: Option<String>,
    #[serde(default)]
    pub cvc: Option<String>,
    #[serde(rename = "cardholderName", default)]
    pub cardholder_name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(rename = "addressLine1", default)]
    pub address_line1: Option<String>,
    #[serde(rename = "addressLine2", default)]
    pub address_line2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(rename = "stateOrProvince", default)]
    pub state_or_province: Option<String>,
    #[serde(rename = "postalCode", default)]
    pub postal_code: Option<String>,
}

impl PaymentDetail {
    /// An empty detail for `user_id` paying with `payment_id`.
    #[must_use]
    pub const fn new(user_id: UserId, payment_id: PaymentId) -> Self {
        Self {
            id: PaymentDetailId::new(0),
            payment: None,
            payment_id,
            user: None,
            user_id,
            card_number: None,
            expiration_date: None,
            cvc: None,
            cardholder_name: None,
            country: None,
            address_line1: None,
            address_line2: None,
            city: None,
            state_or_province: None,
            postal_code: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_payment_requires_card_info() {
        let mut payment = Payment {
            id: PaymentId::new(1),
            name: "Tarjeta".to_string(),
            method: payment_method::CREDIT_CARD.to_string(),
            is_active: true,
        };
        assert!(payment.requires_card_info());
        payment.method = payment_method::DEBIT_CARD.to_string();
        assert!(payment.requires_card_info());
        payment.method = payment_method::PSE.to_string();
        assert!(!payment.requires_card_info());
    }

    #[test]
    fn test_payment_is_active_wire_name() {
        let payment: Payment =
            serde_json::from_value(json!({"name": "Efectivo", "method": "CASH"})).unwrap();
        assert!(payment.is_active);
        let json = serde_json::to_value(&payment).unwrap();
        assert_eq!(json["isActive"], json!(true));
    }

    #[test]
    fn test_payment_detail_camel_case_fields() {
        let mut detail = PaymentDetail::new(UserId::new(3), PaymentId::new(2));
        detail.card_number = Some("4111111111111111".to_string());
        detail.state_or_province = Some("Antioquia".to_string());
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["cardNumber"], json!("4111111111111111"));
        assert_eq!(json["stateOrProvince"], json!("Antioquia"));
        assert_eq!(json["user_id"], json!(3));
        assert!(json.get("payment").is_none());
    }
}

use serde::{Deserialize, Serialize};

use super::Payment;
use crate::types::{PaymentId, SettingId};

/// Store or client settings row (`/api/settings`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    #[serde(default)]
    pub id: SettingId,
    pub payment_id: PaymentId,
    pub name: String,
    pub nickname: String,
    pub phone: i64,
    pub city: String,
    pub address: String,
}

/// `GET /api/settings/{id}/details`: settings with accepted payments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingDetail {
    pub id: SettingId,
    pub name: String,
    pub nickname: String,
    pub phone: i64,
    pub city: String,
    pub address: String,
    #[serde(default)]
    pub payments: Vec<Payment>,
}

/// Body of `POST /api/settings/payments`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPaymentToSetting {
    pub settings_id: SettingId,
    pub payment_id: PaymentId,
}

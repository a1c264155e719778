use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{OrderDetailId, OrderId, OrderStatus, PaymentId, ProductId, StatusId, UserId};

/// Format of `date_order` on the wire (`yyyy-MM-dd HH:mm:ss`).
pub const ORDER_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An order header as returned by `/api/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(default)]
    pub order_id: OrderId,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub date_order: String,
    pub user_id: UserId,
    pub status_id: StatusId,
    pub total_products: i32,
    #[serde(default)]
    pub additional_info_payment_id: Option<PaymentId>,
    /// Carrier tracking number, once assigned by an administrator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
}

impl Order {
    /// A new pending order header, ready to be POSTed.
    #[must_use]
    pub fn pending(user_id: UserId, total: Decimal, total_products: i32, placed_at: NaiveDateTime) -> Self {
        Self {
            order_id: OrderId::default(),
            total,
            date_order: placed_at.format(ORDER_DATE_FORMAT).to_string(),
            user_id,
            status_id: OrderStatus::Pending.id(),
            total_products,
            additional_info_payment_id: None,
            tracking_number: None,
        }
    }

    /// Known status, if the id is one of the well-known ones.
    #[must_use]
    pub fn status(&self) -> Option<OrderStatus> {
        OrderStatus::from_id(self.status_id)
    }

    /// Spanish status label.
    #[must_use]
    pub fn status_label(&self) -> &'static str {
        OrderStatus::label_for(self.status_id)
    }

    /// Parsed `date_order`, `None` if the backend sent another format.
    #[must_use]
    pub fn placed_at(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.date_order, ORDER_DATE_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(&self.date_order, "%Y-%m-%dT%H:%M:%S"))
            .ok()
    }
}

/// A row of `/api/order-details`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(default)]
    pub detail_order_id: OrderDetailId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(rename = "productName")]
    pub product_name: String,
}

const fn default_quantity() -> i32 {
    1
}

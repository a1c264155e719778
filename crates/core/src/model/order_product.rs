use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Product;
use crate::types::{OrderId, OrderProductId, ProductId};

/// An order line as returned by `/api/order-products`.
///
/// The backend has shipped two spellings of the order reference over time
/// (`orderId` and `order_id`); both are accepted and
/// [`effective_order_id`](Self::effective_order_id) picks whichever is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderProductDetail {
    #[serde(default)]
    pub id: OrderProductId,
    #[serde(rename = "orderId", default, skip_serializing_if = "Option::is_none")]
    pub order_id_camel: Option<OrderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    pub product: Product,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float", default)]
    pub price: Decimal,
    #[serde(
        rename = "unitPrice",
        with = "rust_decimal::serde::float_option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub unit_price: Option<Decimal>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub subtotal: Option<Decimal>,
}

const fn default_quantity() -> i32 {
    1
}

impl OrderProductDetail {
    /// `orderId`, else `order_id`, else unassigned.
    #[must_use]
    pub fn effective_order_id(&self) -> OrderId {
        self.order_id_camel.or(self.order_id).unwrap_or_default()
    }

    /// Line amount: the backend subtotal when present, otherwise the unit
    /// price (or plain price) times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.subtotal.unwrap_or_else(|| {
            self.unit_price.unwrap_or(self.price) * Decimal::from(self.quantity)
        })
    }
}

/// Body of `POST /api/order-products`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderProductRequest {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// Body of `PUT /api/order-products/{id}`. Absent fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOrderProductRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<Decimal>,
}

impl UpdateOrderProductRequest {
    /// Request that only changes the quantity.
    #[must_use]
    pub fn quantity(quantity: i32) -> Self {
        Self {
            quantity: Some(quantity),
            ..Self::default()
        }
    }
}

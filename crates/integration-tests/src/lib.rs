//! Integration tests for the Tienda Suplementos client.
//!
//! Every test runs the real repositories and services against an
//! `httpmock` server standing in for the store backend; nothing needs to be
//! running beforehand.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tienda-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `storefront_resilience` - Retry, backoff and list cache fallback
//! - `checkout_flow` - Checkout with partial failure and rollback
//! - `admin_flow` - Bulk status with undo, refunds, CSV export
//! - `session_store` - Local store, cart persistence and login session

use std::time::Duration;

use httpmock::MockServer;
use serde_json::{Value, json};
use tienda_storefront::api::{ApiClient, RetryPolicy};
use tienda_storefront::config::ApiConfig;
use tienda_storefront::repository::Repositories;

/// Retry policy with millisecond delays so retry tests stay fast.
#[must_use]
pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        multiplier: 2.0,
    }
}

/// Client pointed at the mock server.
///
/// # Panics
///
/// Panics if the mock server URL does not parse.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn client(server: &MockServer, retry: RetryPolicy) -> ApiClient {
    let config = ApiConfig::new(&server.base_url()).unwrap();
    ApiClient::new(&config, retry).unwrap()
}

/// Every repository, pointed at the mock server.
#[must_use]
pub fn repositories(server: &MockServer, retry: RetryPolicy) -> Repositories {
    Repositories::new(&client(server, retry), Duration::from_secs(60))
}

/// Backend JSON for a product.
#[must_use]
pub fn product_json(id: i64, stock: i32) -> Value {
    json!({
        "id": id,
        "name": format!("P{id}"),
        "description": "Suplemento",
        "price": 50000.0,
        "stock": stock,
        "url_image": "https://img.tienda.co/p.png"
    })
}

/// Backend JSON for an order.
#[must_use]
pub fn order_json(order_id: i64, user_id: i64, status_id: i64) -> Value {
    json!({
        "order_id": order_id,
        "total": 100_000.0,
        "date_order": format!("2024-05-{:02} 10:00:00", order_id % 28 + 1),
        "user_id": user_id,
        "status_id": status_id,
        "total_products": 2,
        "additional_info_payment_id": null
    })
}

/// Backend JSON for an order line.
#[must_use]
pub fn order_line_json(id: i64, order_id: i64, product_id: i64) -> Value {
    json!({
        "id": id,
        "order_id": order_id,
        "product_id": product_id,
        "product": product_json(product_id, 10),
        "quantity": 1,
        "price": 50000.0
    })
}

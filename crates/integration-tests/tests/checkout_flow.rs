//! Checkout against a mock backend: partial failures and rollback.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use tienda_core::{OrderId, Product, UserId};
use tienda_integration_tests::{fast_retry, order_json, order_line_json, product_json, repositories};
use tienda_storefront::api::ApiClient;
use tienda_storefront::config::ApiConfig;
use tienda_storefront::repository::Repositories;
use tienda_storefront::cart::Cart;
use tienda_storefront::checkout::{Checkout, CheckoutError};

fn cart_with(ids: &[i64]) -> Cart {
    let mut cart = Cart::new();
    for id in ids {
        let product: Product = serde_json::from_value(product_json(*id, 5)).unwrap();
        cart.add_to_cart(&product).unwrap();
    }
    cart
}

async fn order_created(server: &MockServer) -> httpmock::Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/orders")
                .json_body_partial(r#"{"user_id": 3, "status_id": 1, "total_products": 2}"#);
            then.status(201).body(order_json(50, 3, 1).to_string());
        })
        .await
}

#[tokio::test]
async fn test_rollback_deletes_created_lines_then_order() {
    let server = MockServer::start_async().await;
    let order = order_created(&server).await;
    let first_line = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/order-products")
                .json_body_partial(r#"{"order_id": 50, "product_id": 1}"#);
            then.status(201).body(order_line_json(100, 50, 1).to_string());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/order-products")
                .json_body_partial(r#"{"order_id": 50, "product_id": 2}"#);
            then.status(409).body("Stock insuficiente");
        })
        .await;
    let delete_line = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/api/order-products/100");
            then.status(204);
        })
        .await;
    let delete_order = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/api/orders/50");
            then.status(204);
        })
        .await;

    let cart = cart_with(&[1, 2]);
    let checkout = Checkout::new(repositories(&server, fast_retry(1)));
    let result = checkout
        .process_checkout_with_rollback(cart.items(), UserId::new(3))
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.order_id, None);
    assert!(result.created_order_products.is_empty());
    assert_eq!(result.failed_items.len(), 1);
    assert_eq!(result.failed_items[0].message, "Stock insuficiente para P2");
    order.assert_async().await;
    first_line.assert_async().await;
    delete_line.assert_async().await;
    delete_order.assert_async().await;
}

#[tokio::test]
async fn test_partial_checkout_keeps_order() {
    let server = MockServer::start_async().await;
    order_created(&server).await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/order-products")
                .json_body_partial(r#"{"product_id": 1}"#);
            then.status(201).body(order_line_json(100, 50, 1).to_string());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/order-products")
                .json_body_partial(r#"{"product_id": 2}"#);
            then.status(400).body("Producto no disponible");
        })
        .await;
    let deletes = server
        .mock_async(|when, then| {
            when.method(DELETE);
            then.status(204);
        })
        .await;

    let mut cart = cart_with(&[1, 2]);
    let checkout = Checkout::new(repositories(&server, fast_retry(1)));
    let result = checkout
        .process_checkout(cart.items(), UserId::new(3))
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.order_id, Some(OrderId::new(50)));
    assert_eq!(result.created_order_products.len(), 1);
    assert_eq!(
        result.failure_summary().as_deref(),
        Some("Algunos productos no pudieron procesarse: P2")
    );
    assert_eq!(deletes.hits_async().await, 0);

    result.record_in(&mut cart);
    assert!(cart.order_product_id(result.created_order_products[0].product.id).is_some());
}

#[tokio::test]
async fn test_failed_order_creation_is_reported() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/orders");
            then.status(500);
        })
        .await;
    let lines = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/order-products");
            then.status(201).body(json!({}).to_string());
        })
        .await;

    let cart = cart_with(&[1]);
    let checkout = Checkout::new(repositories(&server, fast_retry(1)));
    let err = checkout
        .process_checkout(cart.items(), UserId::new(3))
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::Order(_)));
    assert_eq!(
        err.to_string(),
        "Error durante el checkout: Error interno del servidor"
    );
    assert_eq!(lines.hits_async().await, 0);
}

#[tokio::test]
async fn test_slow_line_is_posted_once_and_order_rolled_back() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/orders");
            then.status(201).body(order_json(50, 3, 1).to_string());
        })
        .await;
    let line = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/order-products");
            then.status(201)
                .delay(Duration::from_millis(400))
                .body(order_line_json(100, 50, 1).to_string());
        })
        .await;
    let delete_order = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/api/orders/50");
            then.status(204);
        })
        .await;

    let mut config = ApiConfig::new(&server.base_url()).unwrap();
    config.timeout = Duration::from_millis(150);
    let client = ApiClient::new(&config, fast_retry(3)).unwrap();
    let checkout = Checkout::new(Repositories::new(&client, Duration::from_secs(60)));

    let cart = cart_with(&[1]);
    let result = checkout
        .process_checkout_with_rollback(cart.items(), UserId::new(3))
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.failed_items.len(), 1);
    assert_eq!(line.hits_async().await, 1);
    delete_order.assert_async().await;
}

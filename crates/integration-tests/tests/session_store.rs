//! Local store persistence of the cart and the login session.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use httpmock::prelude::*;
use serde_json::json;
use tienda_core::{Product, ProductId};
use tienda_integration_tests::{fast_retry, product_json, repositories};
use tienda_storefront::auth::AuthSession;
use tienda_storefront::cart::Cart;
use tienda_storefront::store::LocalStore;

#[tokio::test]
async fn test_session_and_cart_survive_restart() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/users/login");
            then.status(200).body(
                json!({"user": {
                    "id": 11, "username": "lucia", "email": "lucia@tienda.co",
                    "password": "hash", "role_id": 1, "enabled": true
                }})
                .to_string(),
            );
        })
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("tienda.json");
    {
        let repos = repositories(&server, fast_retry(1));
        let store = Arc::new(LocalStore::new(&path));
        let auth = AuthSession::new(repos.users.clone(), Arc::clone(&store));
        auth.login("lucia@tienda.co", "clave123").await.unwrap();

        let mut cart = Cart::new();
        let product: Product = serde_json::from_value(product_json(4, 6)).unwrap();
        cart.add_to_cart(&product).unwrap();
        cart.update_quantity(ProductId::new(4), 3).unwrap();
        cart.save_to(&store).await.unwrap();
    }

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(!raw.contains("hash"));

    let repos = repositories(&server, fast_retry(1));
    let store = Arc::new(LocalStore::new(&path));
    let auth = AuthSession::new(repos.users.clone(), Arc::clone(&store));
    let user = auth.restore().await.unwrap();
    assert_eq!(user.username, "lucia");
    assert!(!auth.is_admin().await);

    let mut cart = Cart::new();
    cart.load_from(&store).await;
    assert_eq!(cart.total_quantity(), 3);

    auth.logout().await.unwrap();
    assert_eq!(store.session_email().await, None);
    assert!(store.cart().await.is_some());
}

#[tokio::test]
async fn test_stock_refresh_clamps_saved_cart() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/products/4");
            then.status(200).body(product_json(4, 1).to_string());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/products/5");
            then.status(200).body(product_json(5, 0).to_string());
        })
        .await;

    let mut cart = Cart::new();
    for id in [4, 5] {
        let product: Product = serde_json::from_value(product_json(id, 6)).unwrap();
        cart.add_to_cart(&product).unwrap();
        cart.update_quantity(ProductId::new(id), 2).unwrap();
    }

    let repos = repositories(&server, fast_retry(1));
    let failed = cart.refresh_all_products_stock(&repos.products).await;
    assert!(failed.is_empty());
    assert_eq!(cart.items().len(), 1);
    assert_eq!(cart.items()[0].quantity, 1);
    assert_eq!(cart.items()[0].product.stock, 1);
}

#[tokio::test]
async fn test_corrupt_store_reads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tienda.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = LocalStore::new(&path);
    assert!(store.cart().await.is_none());
    assert!(store.session_user().await.is_none());

    let mut cart = Cart::new();
    cart.load_from(&store).await;
    assert!(cart.is_empty());
}

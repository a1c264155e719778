//! Admin order operations over the real repositories and a mock backend.

#![allow(clippy::unwrap_used)]

use httpmock::prelude::*;
use serde_json::json;
use tienda_admin::AdminError;
use tienda_admin::export::{CSV_HEADER, export_orders_to_file};
use tienda_admin::orders::AdminOrders;
use tienda_core::{OrderId, OrderStatus};
use tienda_integration_tests::{fast_retry, order_json, order_line_json, repositories};

async fn mock_order(server: &MockServer, id: i64, status: i64) {
    server
        .mock_async(|when, then| {
            when.method(GET).path(format!("/api/orders/{id}"));
            then.status(200).body(order_json(id, 3, status).to_string());
        })
        .await;
}

#[tokio::test]
async fn test_bulk_ship_then_undo_restores_previous_statuses() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/orders");
            then.status(200)
                .body(json!([order_json(1, 3, 1), order_json(2, 3, 3)]).to_string());
        })
        .await;
    mock_order(&server, 1, 1).await;
    mock_order(&server, 2, 3).await;

    let mut puts = Vec::new();
    for (id, status) in [(1, 2), (2, 2), (1, 1), (2, 3)] {
        let body = json!({ "status_id": status }).to_string();
        puts.push(
            server
                .mock_async(|when, then| {
                    when.method(PUT)
                        .path(format!("/api/orders/{id}"))
                        .json_body_partial(body);
                    then.status(200).body(order_json(id, 3, status).to_string());
                })
                .await,
        );
    }

    let mut admin = AdminOrders::new(repositories(&server, fast_retry(1)));
    admin.refresh().await.unwrap();
    admin.select(OrderId::new(1));
    admin.select(OrderId::new(2));

    let outcome = admin.mark_selected_as_shipped().await.unwrap();
    assert_eq!(outcome.updated.len(), 2);
    assert!(admin.selected().is_empty());
    assert!(admin.can_undo());

    let undone = admin.undo_last_bulk_action().await.unwrap();
    assert_eq!(undone.updated.len(), 2);
    assert!(!admin.can_undo());

    for put in &puts {
        assert_eq!(put.hits_async().await, 1);
    }
}

#[tokio::test]
async fn test_refund_restocks_lines_and_marks_refunded() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/orders");
            then.status(200).body(json!([order_json(7, 3, 2)]).to_string());
        })
        .await;
    mock_order(&server, 7, 2).await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/order-products/order/7");
            then.status(200).body(
                json!([order_line_json(70, 7, 1), order_line_json(71, 7, 2)]).to_string(),
            );
        })
        .await;
    let mut deletes = Vec::new();
    for line in [70, 71] {
        deletes.push(
            server
                .mock_async(|when, then| {
                    when.method(DELETE).path(format!("/api/order-products/{line}"));
                    then.status(204);
                })
                .await,
        );
    }
    let refunded = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/api/orders/7")
                .json_body_partial(r#"{"status_id": 4}"#);
            then.status(200).body(order_json(7, 3, 4).to_string());
        })
        .await;

    let mut admin = AdminOrders::new(repositories(&server, fast_retry(1)));
    admin.refresh().await.unwrap();
    let outcome = admin.refund_order(OrderId::new(7)).await.unwrap();

    assert_eq!(outcome.restocked_lines, 2);
    assert_eq!(outcome.order.status(), Some(OrderStatus::Refunded));
    for delete in &deletes {
        delete.assert_async().await;
    }
    refunded.assert_async().await;

    let again = admin.refund_order(OrderId::new(7)).await.unwrap_err();
    assert!(matches!(again, AdminError::AlreadyRefunded(_)));
}

#[tokio::test]
async fn test_tracking_number_is_trimmed_and_sent() {
    let server = MockServer::start_async().await;
    mock_order(&server, 5, 2).await;
    let put = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/api/orders/5")
                .json_body_partial(r#"{"tracking_number": "SERV-123"}"#);
            let mut order = order_json(5, 3, 2);
            order["tracking_number"] = json!("SERV-123");
            then.status(200).body(order.to_string());
        })
        .await;

    let mut admin = AdminOrders::new(repositories(&server, fast_retry(1)));
    let err = admin.assign_tracking(OrderId::new(5), "   ").await.unwrap_err();
    assert_eq!(err.to_string(), "El número de guía no puede estar vacío");

    let order = admin
        .assign_tracking(OrderId::new(5), "  SERV-123 ")
        .await
        .unwrap();
    assert_eq!(order.tracking_number.as_deref(), Some("SERV-123"));
    put.assert_async().await;
}

#[tokio::test]
async fn test_loaded_orders_export_to_csv() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/orders");
            then.status(200)
                .body(json!([order_json(1, 3, 1), order_json(2, 4, 2)]).to_string());
        })
        .await;

    let mut admin = AdminOrders::new(repositories(&server, fast_retry(1)));
    admin.refresh().await.unwrap();
    assert_eq!(admin.status_counts().get(&OrderStatus::Shipped.id()), Some(&1));

    let dir = tempfile::tempdir().unwrap();
    let path = export_orders_to_file(admin.orders(), dir.path()).await.unwrap();
    let csv = std::fs::read_to_string(path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], CSV_HEADER);
    assert_eq!(lines[1], "1,3,1,100000,2024-05-02 10:00:00,2");
    assert_eq!(lines.len(), 3);
}

use std::time::Duration;

use tienda_core::{Order, OrderId, OrderStatus, StatusId};
use tracing::{info, instrument};

use super::ResourceRepository;
use crate::api::{ApiClient, ApiError};
use crate::paging::{OrderQuery, page_orders};

/// `/api/orders` with status, tracking and paging helpers.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    resource: ResourceRepository<Order>,
}

impl OrderRepository {
    #[must_use]
    pub fn new(client: ApiClient, cache_ttl: Duration) -> Self {
        Self {
            resource: ResourceRepository::new(client, cache_ttl),
        }
    }

    /// List every order, from the cache unless `force`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails and no valid snapshot exists.
    pub async fn get_all(&self, force: bool) -> Result<Vec<Order>, ApiError> {
        self.resource.get_all(force).await
    }

    /// Get one order.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is not cached and the backend call fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Order, ApiError> {
        self.resource.get_by_id(id).await
    }

    /// Create an order header.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    pub async fn create(&self, order: &Order) -> Result<Order, ApiError> {
        self.resource.create(order).await
    }

    /// Replace an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    pub async fn update(&self, id: OrderId, order: &Order) -> Result<Order, ApiError> {
        self.resource.update(id, order).await
    }

    /// Delete an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    pub async fn delete(&self, id: OrderId) -> Result<(), ApiError> {
        self.resource.delete(id).await
    }

    /// Change an order's status (read, modify, replace).
    ///
    /// Always reads the order from the backend so the PUT carries its
    /// current fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the read or the update fails.
    #[instrument(skip(self))]
    pub async fn update_status(&self, id: OrderId, status_id: StatusId) -> Result<Order, ApiError> {
        let mut order: Order = self.resource.client().get(&format!("api/orders/{id}")).await?;
        order.status_id = status_id;
        let updated = self.update(id, &order).await?;
        info!(order_id = %id, status = OrderStatus::label_for(status_id), "Order status updated");
        Ok(updated)
    }

    /// Attach a carrier tracking number to an order (read, modify, replace).
    ///
    /// # Errors
    ///
    /// Returns an error if the read or the update fails.
    #[instrument(skip(self))]
    pub async fn assign_tracking(&self, id: OrderId, tracking_number: &str) -> Result<Order, ApiError> {
        let mut order: Order = self.resource.client().get(&format!("api/orders/{id}")).await?;
        order.tracking_number = Some(tracking_number.trim().to_string());
        let updated = self.update(id, &order).await?;
        info!(order_id = %id, "Tracking number assigned");
        Ok(updated)
    }

    /// One page of orders, filtered and newest first.
    ///
    /// Pages are cut client-side from the cached full list; see
    /// [`page_orders`].
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be loaded.
    #[instrument(skip(self))]
    pub async fn get_paged(
        &self,
        page: usize,
        size: usize,
        status: Option<OrderStatus>,
        search: Option<&str>,
    ) -> Result<Vec<Order>, ApiError> {
        let orders = self.get_all(false).await?;
        let query = OrderQuery {
            status: status.map(OrderStatus::id),
            search: search.map(str::to_string),
        };
        Ok(page_orders(&orders, &query, page, size))
    }

    /// Drop the cached order list.
    pub async fn invalidate(&self) {
        self.resource.invalidate().await;
    }
}

use tienda_core::{
    CreateOrderProductRequest, OrderId, OrderProductDetail, OrderProductId,
    UpdateOrderProductRequest,
};
use tracing::instrument;

use crate::api::{ApiClient, ApiError};

const PATH: &str = "api/order-products";

/// `/api/order-products`: order lines. Never cached, since lines change
/// stock on the backend as a side effect.
#[derive(Debug, Clone)]
pub struct OrderProductRepository {
    client: ApiClient,
}

impl OrderProductRepository {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Create an order line.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the line (e.g. stock conflict).
    #[instrument(skip(self))]
    pub async fn create(&self, request: &CreateOrderProductRequest) -> Result<OrderProductDetail, ApiError> {
        self.client.post(PATH, request).await
    }

    /// Partially update an order line.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: OrderProductId,
        request: &UpdateOrderProductRequest,
    ) -> Result<OrderProductDetail, ApiError> {
        self.client.put(&format!("{PATH}/{id}"), request).await
    }

    /// Delete an order line.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: OrderProductId) -> Result<(), ApiError> {
        self.client.delete(&format!("{PATH}/{id}")).await
    }

    /// Get an order line.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: OrderProductId) -> Result<OrderProductDetail, ApiError> {
        self.client.get(&format!("{PATH}/{id}")).await
    }

    /// Every line of one order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn for_order(&self, order_id: OrderId) -> Result<Vec<OrderProductDetail>, ApiError> {
        self.client.get(&format!("{PATH}/order/{order_id}")).await
    }
}

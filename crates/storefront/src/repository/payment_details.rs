use tienda_core::{PaymentDetail, PaymentDetailId, UserId};
use tracing::instrument;

use crate::api::{ApiClient, ApiError};

const PATH: &str = "api/payment-details";

/// `/api/payment-details`: a shopper's saved payment configurations.
#[derive(Debug, Clone)]
pub struct PaymentDetailRepository {
    client: ApiClient,
}

impl PaymentDetailRepository {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Saved details of one user.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn for_user(&self, user_id: UserId) -> Result<Vec<PaymentDetail>, ApiError> {
        self.client.get(&format!("{PATH}/user/{user_id}")).await
    }

    /// Save a new detail.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self, detail), fields(user_id = %detail.user_id, payment_id = %detail.payment_id))]
    pub async fn create(&self, detail: &PaymentDetail) -> Result<PaymentDetail, ApiError> {
        self.client.post(PATH, detail).await
    }

    /// Replace a detail.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self, detail))]
    pub async fn update(&self, id: PaymentDetailId, detail: &PaymentDetail) -> Result<PaymentDetail, ApiError> {
        self.client.put(&format!("{PATH}/{id}"), detail).await
    }

    /// Delete a detail.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: PaymentDetailId) -> Result<(), ApiError> {
        self.client.delete(&format!("{PATH}/{id}")).await
    }
}

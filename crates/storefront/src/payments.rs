//! Payment methods: the catalog of payment types, a shopper's saved payment
//! details and the methods a store setting accepts.
//!
//! Deleting and editing a saved detail is optimistic: the local list changes
//! first and is restored if the backend call fails.

use chrono::NaiveDate;
use thiserror::Error;
use tienda_core::validation::{ValidationError, validate_card_detail, validate_payment_name};
use tienda_core::{Payment, PaymentDetail, PaymentDetailId, PaymentId, SettingDetail, SettingId, UserId};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::api::ApiError;
use crate::events::EventBus;
use crate::repository::Repositories;

/// Errors from payment method operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("{}", .0.first().map_or("Datos inválidos", |e| e.message.as_str()))]
    Validation(Vec<ValidationError>),

    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),

    #[error("No se encontró el método de pago a actualizar")]
    NotFound(PaymentDetailId),

    #[error("Error al eliminar el método de pago. Por favor, intente nuevamente.")]
    DeleteFailed(#[source] ApiError),

    #[error("Error al actualizar el método de pago. Por favor, intente nuevamente.")]
    UpdateFailed(#[source] ApiError),
}

impl From<ValidationError> for PaymentError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(vec![err])
    }
}

/// Payment method service for one shopper session.
#[derive(Debug)]
pub struct PaymentMethods {
    repos: Repositories,
    events: EventBus,
    details: Mutex<Vec<PaymentDetail>>,
}

impl PaymentMethods {
    #[must_use]
    pub fn new(repos: Repositories, events: EventBus) -> Self {
        Self {
            repos,
            events,
            details: Mutex::new(Vec::new()),
        }
    }

    // =========================================================================
    // Payment catalog
    // =========================================================================

    /// Every payment type the store knows.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be loaded.
    pub async fn payments(&self, force: bool) -> Result<Vec<Payment>, PaymentError> {
        Ok(self.repos.payments.get_all(force).await?)
    }

    /// One payment type.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment cannot be loaded.
    pub async fn payment(&self, id: PaymentId) -> Result<Payment, PaymentError> {
        Ok(self.repos.payments.get_by_id(id).await?)
    }

    /// Create a payment type.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad name, or the backend error.
    #[instrument(skip(self, payment), fields(name = %payment.name))]
    pub async fn create_payment(&self, payment: &Payment) -> Result<Payment, PaymentError> {
        validate_payment_name(&payment.name)?;
        Ok(self.repos.payments.create(payment).await?)
    }

    /// Replace a payment type.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad name, or the backend error.
    #[instrument(skip(self, payment))]
    pub async fn update_payment(&self, id: PaymentId, payment: &Payment) -> Result<Payment, PaymentError> {
        validate_payment_name(&payment.name)?;
        Ok(self.repos.payments.update(id, payment).await?)
    }

    // =========================================================================
    // Saved payment details
    // =========================================================================

    /// Load the saved details of `user_id` into the local list.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the local list is emptied.
    #[instrument(skip(self))]
    pub async fn fetch_payment_details(&self, user_id: UserId) -> Result<Vec<PaymentDetail>, PaymentError> {
        match self.repos.payment_details.for_user(user_id).await {
            Ok(details) => {
                debug!(count = details.len(), "Payment details loaded");
                self.details.lock().await.clone_from(&details);
                Ok(details)
            }
            Err(e) => {
                self.details.lock().await.clear();
                self.events.error(e.user_message());
                Err(e.into())
            }
        }
    }

    /// Current local list of saved details.
    pub async fn payment_details(&self) -> Vec<PaymentDetail> {
        self.details.lock().await.clone()
    }

    /// Validate and save a new detail.
    ///
    /// Card fields are only checked when the payment type takes cards.
    ///
    /// # Errors
    ///
    /// `Validation` with every failing field, or the backend error.
    #[instrument(skip(self, detail), fields(user_id = %detail.user_id, payment_id = %detail.payment_id))]
    pub async fn save_payment_detail(
        &self,
        detail: &PaymentDetail,
        today: NaiveDate,
    ) -> Result<PaymentDetail, PaymentError> {
        let payment = match &detail.payment {
            Some(payment) => payment.clone(),
            None => self.payment(detail.payment_id).await?,
        };
        if payment.requires_card_info() {
            validate_card_detail(detail, today).map_err(PaymentError::Validation)?;
        }

        let saved = match self.repos.payment_details.create(detail).await {
            Ok(saved) => saved,
            Err(e) => {
                self.events.error(e.user_message());
                return Err(e.into());
            }
        };
        self.details.lock().await.push(saved.clone());
        self.events.snackbar("Método de pago guardado");
        Ok(saved)
    }

    /// Remove a detail locally, then on the backend; restore the list if
    /// the backend refuses. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// `DeleteFailed` when the backend call fails.
    #[instrument(skip(self))]
    pub async fn delete_payment_detail(&self, id: PaymentDetailId) -> Result<(), PaymentError> {
        let previous = {
            let mut details = self.details.lock().await;
            if !details.iter().any(|d| d.id == id) {
                return Ok(());
            }
            let previous = details.clone();
            details.retain(|d| d.id != id);
            previous
        };

        if let Err(e) = self.repos.payment_details.delete(id).await {
            warn!(payment_detail_id = %id, error = %e, "Delete failed, restoring list");
            *self.details.lock().await = previous;
            let err = PaymentError::DeleteFailed(e);
            self.events.error(err.to_string());
            return Err(err);
        }
        Ok(())
    }

    /// Replace a detail locally, then on the backend; restore the list if
    /// the backend refuses.
    ///
    /// # Errors
    ///
    /// `NotFound` when the detail is not in the local list, `UpdateFailed`
    /// when the backend call fails.
    #[instrument(skip(self, detail), fields(payment_detail_id = %detail.id))]
    pub async fn update_payment_detail(&self, detail: &PaymentDetail) -> Result<PaymentDetail, PaymentError> {
        let previous = {
            let mut details = self.details.lock().await;
            let Some(slot) = details.iter_mut().find(|d| d.id == detail.id) else {
                return Err(PaymentError::NotFound(detail.id));
            };
            std::mem::replace(slot, detail.clone())
        };

        match self.repos.payment_details.update(detail.id, detail).await {
            Ok(updated) => {
                if let Some(slot) = self.details.lock().await.iter_mut().find(|d| d.id == detail.id) {
                    *slot = updated.clone();
                }
                Ok(updated)
            }
            Err(e) => {
                warn!(error = %e, "Update failed, restoring previous detail");
                if let Some(slot) = self.details.lock().await.iter_mut().find(|d| d.id == detail.id) {
                    *slot = previous;
                }
                let err = PaymentError::UpdateFailed(e);
                self.events.error(err.to_string());
                Err(err)
            }
        }
    }

    // =========================================================================
    // Store settings
    // =========================================================================

    /// Store settings with the payment types they accept.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    pub async fn store_settings(&self, id: SettingId) -> Result<SettingDetail, PaymentError> {
        Ok(self.repos.settings.details(id).await?)
    }

    /// Accept another payment type in a store setting.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    pub async fn add_payment_method(
        &self,
        settings_id: SettingId,
        payment_id: PaymentId,
    ) -> Result<(), PaymentError> {
        self.repos
            .settings
            .add_payment_method(settings_id, payment_id)
            .await?;
        self.events.snackbar("Método de pago agregado");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::api::{ApiClient, RetryPolicy};
    use crate::config::ApiConfig;
    use crate::events::UiEvent;

    fn service(server: &MockServer) -> PaymentMethods {
        let config = ApiConfig::new(&server.base_url()).unwrap();
        let client = ApiClient::new(&config, RetryPolicy::no_retry()).unwrap();
        PaymentMethods::new(Repositories::new(&client, Duration::from_secs(60)), EventBus::new())
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn detail_json(id: i64, city: &str) -> serde_json::Value {
        json!({"id": id, "payment_id": 1, "user_id": 5, "city": city})
    }

    async fn mock_details(server: &MockServer) {
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/payment-details/user/5");
                then.status(200)
                    .body(json!([detail_json(1, "Cali"), detail_json(2, "Bogotá")]).to_string());
            })
            .await;
    }

    fn card_payment() -> Payment {
        Payment {
            id: PaymentId::new(1),
            name: "Tarjeta".to_string(),
            method: tienda_core::payment_method::CREDIT_CARD.to_string(),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_save_rejects_invalid_card_without_calling_backend() {
        let server = MockServer::start_async().await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/payment-details");
                then.status(201).body(detail_json(9, "Cali").to_string());
            })
            .await;

        let payments = service(&server);
        let mut detail = PaymentDetail::new(UserId::new(5), PaymentId::new(1));
        detail.payment = Some(card_payment());
        detail.card_number = Some("1234".to_string());

        let err = payments.save_payment_detail(&detail, today()).await.unwrap_err();
        let PaymentError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.len() > 1);
        assert_eq!(create.hits_async().await, 0);
    }

    #[tokio::test]
    async fn test_save_cash_detail_skips_card_checks() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/payments/3");
                then.status(200)
                    .body(json!({"id": 3, "name": "Efectivo", "method": "CASH"}).to_string());
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/payment-details");
                then.status(201).body(json!({"id": 9, "payment_id": 3, "user_id": 5}).to_string());
            })
            .await;

        let payments = service(&server);
        let mut rx = payments.events.subscribe();
        let saved = payments
            .save_payment_detail(&PaymentDetail::new(UserId::new(5), PaymentId::new(3)), today())
            .await
            .unwrap();
        assert_eq!(saved.id, PaymentDetailId::new(9));
        assert_eq!(payments.payment_details().await.len(), 1);
        assert_eq!(
            rx.recv().await.unwrap(),
            UiEvent::ShowSnackbar("Método de pago guardado".to_string())
        );
    }

    #[tokio::test]
    async fn test_delete_rolls_back_on_failure() {
        let server = MockServer::start_async().await;
        mock_details(&server).await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).path("/api/payment-details/1");
                then.status(400);
            })
            .await;

        let payments = service(&server);
        payments.fetch_payment_details(UserId::new(5)).await.unwrap();
        let err = payments
            .delete_payment_detail(PaymentDetailId::new(1))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error al eliminar el método de pago. Por favor, intente nuevamente."
        );
        assert_eq!(payments.payment_details().await.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_removes_locally() {
        let server = MockServer::start_async().await;
        mock_details(&server).await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).path("/api/payment-details/2");
                then.status(204);
            })
            .await;

        let payments = service(&server);
        payments.fetch_payment_details(UserId::new(5)).await.unwrap();
        payments.delete_payment_detail(PaymentDetailId::new(2)).await.unwrap();
        let left: Vec<_> = payments.payment_details().await.iter().map(|d| d.id).collect();
        assert_eq!(left, vec![PaymentDetailId::new(1)]);
    }

    #[tokio::test]
    async fn test_update_rolls_back_on_failure() {
        let server = MockServer::start_async().await;
        mock_details(&server).await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path("/api/payment-details/2");
                then.status(400);
            })
            .await;

        let payments = service(&server);
        let details = payments.fetch_payment_details(UserId::new(5)).await.unwrap();
        let mut edited = details[1].clone();
        edited.city = Some("Medellín".to_string());

        let err = payments.update_payment_detail(&edited).await.unwrap_err();
        assert!(matches!(err, PaymentError::UpdateFailed(_)));
        let current = payments.payment_details().await;
        assert_eq!(current[1].city.as_deref(), Some("Bogotá"));
    }

    #[tokio::test]
    async fn test_update_keeps_backend_copy() {
        let server = MockServer::start_async().await;
        mock_details(&server).await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path("/api/payment-details/2");
                then.status(200).body(detail_json(2, "Medellín (Antioquia)").to_string());
            })
            .await;

        let payments = service(&server);
        let details = payments.fetch_payment_details(UserId::new(5)).await.unwrap();
        let mut edited = details[1].clone();
        edited.city = Some("Medellín".to_string());

        let updated = payments.update_payment_detail(&edited).await.unwrap();
        assert_eq!(updated.city.as_deref(), Some("Medellín (Antioquia)"));
        let current = payments.payment_details().await;
        assert_eq!(current[1], updated);
    }

    #[tokio::test]
    async fn test_update_unknown_detail() {
        let server = MockServer::start_async().await;
        let payments = service(&server);
        let detail = PaymentDetail::new(UserId::new(5), PaymentId::new(1));
        let err = payments.update_payment_detail(&detail).await.unwrap_err();
        assert_eq!(err.to_string(), "No se encontró el método de pago a actualizar");
    }

    #[tokio::test]
    async fn test_add_payment_method_posts_ids() {
        let server = MockServer::start_async().await;
        let post = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/settings/payments")
                    .json_body(json!({"settings_id": 1, "payment_id": 4}));
                then.status(200);
            })
            .await;

        service(&server)
            .add_payment_method(SettingId::new(1), PaymentId::new(4))
            .await
            .unwrap();
        post.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_payment_validates_name() {
        let server = MockServer::start_async().await;
        let payments = service(&server);
        let mut payment = card_payment();
        payment.name = " ".to_string();
        assert!(matches!(
            payments.create_payment(&payment).await,
            Err(PaymentError::Validation(_))
        ));
    }
}

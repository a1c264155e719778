use std::time::Duration;

use tienda_core::{AddPaymentToSetting, PaymentId, Setting, SettingDetail, SettingId};
use tracing::instrument;

use super::ResourceRepository;
use crate::api::{ApiClient, ApiError};

/// `/api/settings` plus the accepted-payments endpoints.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    resource: ResourceRepository<Setting>,
}

impl SettingsRepository {
    #[must_use]
    pub fn new(client: ApiClient, cache_ttl: Duration) -> Self {
        Self {
            resource: ResourceRepository::new(client, cache_ttl),
        }
    }

    /// Plain CRUD access to settings rows.
    #[must_use]
    pub const fn resource(&self) -> &ResourceRepository<Setting> {
        &self.resource
    }

    /// Settings with the payment methods they accept.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn details(&self, id: SettingId) -> Result<SettingDetail, ApiError> {
        self.resource
            .client()
            .get(&format!("api/settings/{id}/details"))
            .await
    }

    /// Accept another payment method.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn add_payment_method(
        &self,
        settings_id: SettingId,
        payment_id: PaymentId,
    ) -> Result<(), ApiError> {
        let body = AddPaymentToSetting {
            settings_id,
            payment_id,
        };
        self.resource
            .client()
            .post_unit("api/settings/payments", &body)
            .await?;
        self.resource.invalidate().await;
        Ok(())
    }
}

use tienda_core::{
    EmailVerificationInfo, EmailVerificationRequest, EmailVerificationResponse,
    VerificationStatusResponse,
};
use tracing::instrument;

use crate::api::{ApiClient, ApiError};

/// `/api/email-verification`: the backend's email verification proxy.
#[derive(Debug, Clone)]
pub struct EmailVerificationRepository {
    client: ApiClient,
}

impl EmailVerificationRepository {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Start verifying an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn start(&self, request: &EmailVerificationRequest) -> Result<EmailVerificationResponse, ApiError> {
        self.client.post("api/email-verification/verify", request).await
    }

    /// Current state of a verification.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn status(&self, verification_id: &str) -> Result<VerificationStatusResponse, ApiError> {
        self.client
            .get(&format!("api/email-verification/status/{verification_id}"))
            .await
    }

    /// Service description.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn info(&self) -> Result<EmailVerificationInfo, ApiError> {
        self.client.get("api/email-verification/info").await
    }
}

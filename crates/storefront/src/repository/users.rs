use std::time::Duration;

use tienda_core::{LoginRequest, LoginResponse, RoleId, User, UserDetail, UserId};
use tracing::instrument;

use super::ResourceRepository;
use crate::api::{ApiClient, ApiError};

/// `/api/users` plus login and the aggregated client views.
#[derive(Debug, Clone)]
pub struct UserRepository {
    resource: ResourceRepository<User>,
}

impl UserRepository {
    #[must_use]
    pub fn new(client: ApiClient, cache_ttl: Duration) -> Self {
        Self {
            resource: ResourceRepository::new(client, cache_ttl),
        }
    }

    /// Plain CRUD access to accounts.
    #[must_use]
    pub const fn resource(&self) -> &ResourceRepository<User> {
        &self.resource
    }

    /// Exchange credentials for the account.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the call fails.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.resource.client().post("api/users/login", &request).await?;
        Ok(response.user)
    }

    /// Aggregated view of one client.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn details(&self, id: UserId) -> Result<UserDetail, ApiError> {
        self.resource
            .client()
            .get(&format!("api/users/details/{id}"))
            .await
    }

    /// Aggregated views of every account with `role_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self))]
    pub async fn details_by_role(&self, role_id: RoleId) -> Result<Vec<UserDetail>, ApiError> {
        self.resource
            .client()
            .get(&format!("api/users/details/role/{role_id}"))
            .await
    }
}

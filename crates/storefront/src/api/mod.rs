//! REST client for the store backend.
//!
//! Every call is a JSON request against `base_url`, tagged with a fresh
//! `X-Request-Id` and wrapped in the configured [`RetryPolicy`]. GET, PUT
//! and DELETE retry every transient failure; POST creates resources, so it
//! is only resent when the connection never opened.

mod error;
mod retry;

pub use error::ApiError;
pub use retry::RetryPolicy;

use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use crate::config::ApiConfig;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Client for the store backend REST API.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("retry", &self.inner.retry)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig, retry: RetryPolicy) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                retry,
            }),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Retry policy applied to every call.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.inner.retry
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Execute a GET request.
    ///
    /// # Errors
    ///
    /// Returns an error after retries are exhausted, or immediately for
    /// non-retryable failures.
    #[instrument(skip(self), level = "debug")]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = &self.url(path)?;
        self.inner
            .retry
            .run(path, || async move {
                let response = self.send(Method::GET, url.clone(), None::<&()>).await?;
                Self::handle_response(response).await
            })
            .await
    }

    /// Execute a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error after connect retries are exhausted, or at once
    /// for a timeout or an error status.
    #[instrument(skip(self, body), level = "debug")]
    pub async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = &self.url(path)?;
        self.inner
            .retry
            .run_when(path, ApiError::is_connect, || async move {
                let response = self.send(Method::POST, url.clone(), Some(body)).await?;
                Self::handle_response(response).await
            })
            .await
    }

    /// Execute a POST request whose response body is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error after connect retries are exhausted, or at once
    /// for a timeout or an error status.
    #[instrument(skip(self, body), level = "debug")]
    pub async fn post_unit<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let url = &self.url(path)?;
        self.inner
            .retry
            .run_when(path, ApiError::is_connect, || async move {
                let response = self.send(Method::POST, url.clone(), Some(body)).await?;
                Self::handle_empty(response).await
            })
            .await
    }

    /// Execute a PUT request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error after retries are exhausted, or immediately for
    /// non-retryable failures.
    #[instrument(skip(self, body), level = "debug")]
    pub async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = &self.url(path)?;
        self.inner
            .retry
            .run(path, || async move {
                let response = self.send(Method::PUT, url.clone(), Some(body)).await?;
                Self::handle_response(response).await
            })
            .await
    }

    /// Execute a DELETE request.
    ///
    /// # Errors
    ///
    /// Returns an error after retries are exhausted, or immediately for
    /// non-retryable failures.
    #[instrument(skip(self), level = "debug")]
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let url = &self.url(path)?;
        self.inner
            .retry
            .run(path, || async move {
                let response = self.send(Method::DELETE, url.clone(), None::<&()>).await?;
                Self::handle_empty(response).await
            })
            .await
    }

    async fn send<B: Serialize + Sync>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<reqwest::Response, ApiError> {
        let request_id = Uuid::new_v4().to_string();
        debug!(%method, %url, %request_id, "Backend request");

        let mut request = self
            .inner
            .client
            .request(method, url)
            .header(REQUEST_ID_HEADER, &request_id)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Handle API response and parse JSON.
    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::parse_error(response).await);
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Decode(e.to_string())
        })
    }

    async fn handle_empty(response: reqwest::Response) -> Result<(), ApiError> {
        if response.status().is_success() {
            return Ok(());
        }
        Err(Self::parse_error(response).await)
    }

    /// Turn a non-success response into [`ApiError::Http`].
    async fn parse_error(response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(
            status,
            body = %body.chars().take(500).collect::<String>(),
            "Backend returned non-success status"
        );
        ApiError::Http { status, body }
    }
}

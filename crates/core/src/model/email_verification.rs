use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::EmailVerificationStatus;

/// Body of `POST /api/email-verification/verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailVerificationRequest {
    pub email: String,
    pub callback: CallbackConfig,
}

/// Where the verification service reports back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackConfig {
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl CallbackConfig {
    /// A JSON `POST` callback to `url`, optionally carrying a bearer token.
    #[must_use]
    pub fn post(url: impl Into<String>, bearer: Option<&str>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        if let Some(token) = bearer {
            headers.insert("Authorization".to_string(), format!("Bearer {token}"));
        }
        Self {
            url: url.into(),
            method: "POST".to_string(),
            headers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailVerificationResponse {
    pub verification_id: String,
    pub status: String,
    #[serde(default)]
    pub message: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationStatusResponse {
    pub verification_id: String,
    pub email_address: String,
    pub status: String,
    #[serde(default)]
    pub email_status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub verified_at: Option<String>,
}

impl VerificationStatusResponse {
    /// Interpreted verification state.
    #[must_use]
    pub fn state(&self) -> EmailVerificationStatus {
        if self.verified_at.is_some() {
            return EmailVerificationStatus::Verified;
        }
        EmailVerificationStatus::from_service(&self.status)
    }
}

/// `GET /api/email-verification/info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailVerificationInfo {
    #[serde(default)]
    pub endpoints: BTreeMap<String, String>,
    #[serde(default)]
    pub email_statuses: BTreeMap<String, String>,
    pub service: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub verification_statuses: BTreeMap<String, String>,
    pub version: String,
}

//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `TIENDA_API_BASE_URL` - Backend base URL (default: `http://10.0.2.2:8080/`)
//! - `TIENDA_API_TIMEOUT_SECS` - Per-request timeout (default: 15)
//! - `TIENDA_RETRY_MAX_ATTEMPTS` - Attempts per call, including the first (default: 3)
//! - `TIENDA_RETRY_BASE_DELAY_MS` - First backoff delay (default: 300)
//! - `TIENDA_RETRY_MAX_DELAY_MS` - Backoff cap (default: 3000)
//! - `TIENDA_CACHE_TTL_SECS` - List cache lifetime (default: 300)
//! - `TIENDA_DATA_DIR` - Directory for the local store (default: `./.tienda`)
//! - `TIENDA_EMAIL_API_KEY` - Token sent to the email verification callback
//!   (high entropy, placeholders rejected)

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::api::RetryPolicy;

const DEFAULT_BASE_URL: &str = "http://10.0.2.2:8080/";
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_app_token",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend connection settings.
    pub api: ApiConfig,
    /// Backoff for transient failures.
    pub retry: RetryPolicy,
    /// Lifetime of cached resource lists.
    pub cache_ttl: Duration,
    /// Directory holding the local store file.
    pub data_dir: PathBuf,
    /// Bearer token for email verification callbacks.
    pub email_api_key: Option<SecretString>,
}

/// Backend connection settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, always ending in `/`.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ApiConfig {
    /// Settings for `base_url` with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL does not parse.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("TIENDA_API_BASE_URL", base_url)?,
            timeout: Duration::from_secs(15),
        })
    }
}

impl ClientConfig {
    /// Defaults for everything except the backend connection.
    #[must_use]
    pub fn with_api(api: ApiConfig) -> Self {
        Self {
            api,
            retry: RetryPolicy::default(),
            cache_ttl: Duration::from_secs(300),
            data_dir: PathBuf::from(".tienda"),
            email_api_key: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid, or if the
    /// email API key fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = parse_base_url(
            "TIENDA_API_BASE_URL",
            &get_env_or_default("TIENDA_API_BASE_URL", DEFAULT_BASE_URL),
        )?;
        let timeout = Duration::from_secs(get_parsed_or_default("TIENDA_API_TIMEOUT_SECS", 15)?);

        let retry = RetryPolicy {
            max_attempts: get_parsed_or_default("TIENDA_RETRY_MAX_ATTEMPTS", 3)?,
            base_delay: Duration::from_millis(get_parsed_or_default(
                "TIENDA_RETRY_BASE_DELAY_MS",
                300,
            )?),
            max_delay: Duration::from_millis(get_parsed_or_default(
                "TIENDA_RETRY_MAX_DELAY_MS",
                3000,
            )?),
            ..RetryPolicy::default()
        };
        if retry.max_attempts == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "TIENDA_RETRY_MAX_ATTEMPTS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let cache_ttl = Duration::from_secs(get_parsed_or_default("TIENDA_CACHE_TTL_SECS", 300)?);
        let data_dir = PathBuf::from(get_env_or_default("TIENDA_DATA_DIR", ".tienda"));

        let email_api_key = match get_optional_env("TIENDA_EMAIL_API_KEY") {
            Some(value) => {
                validate_secret_strength(&value, "TIENDA_EMAIL_API_KEY")?;
                Some(SecretString::from(value))
            }
            None => None,
        };

        Ok(Self {
            api: ApiConfig { base_url, timeout },
            retry,
            cache_ttl,
            data_dir,
            email_api_key,
        })
    }

    /// Path of the local store file inside `data_dir`.
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("tienda.json")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn get_parsed_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Parse a base URL and make sure relative joins keep its path.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "cannot be used as a base URL".to_string(),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated token."
            ),
        ));
    }

    Ok(())
}

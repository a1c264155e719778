//! Command implementations.
//!
//! Every command builds on a shared [`Context`] loaded from the environment
//! (see `tienda_storefront::config` for the variables).

pub mod account;
pub mod admin;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod payments;

use std::sync::Arc;

use thiserror::Error;
use tienda_admin::AdminError;
use tienda_core::User;
use tienda_storefront::api::ApiError;
use tienda_storefront::auth::{AuthError, AuthSession};
use tienda_storefront::cart::CartError;
use tienda_storefront::checkout::CheckoutError;
use tienda_storefront::config::{ClientConfig, ConfigError};
use tienda_storefront::events::{EventBus, UiEvent};
use tienda_storefront::payments::PaymentError;
use tienda_storefront::repository::Repositories;
use tienda_storefront::store::{LocalStore, StoreError};
use tokio::sync::Mutex;
use tokio::sync::broadcast;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Admin(#[from] AdminError),

    #[error("No se pudo guardar el estado local: {0}")]
    Store(#[from] StoreError),

    #[error("No hay sesión activa. Inicie sesión con `tienda login`.")]
    NotLoggedIn,

    #[error("Acceso restringido a administradores")]
    NotAdmin,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Configuration, repositories and session shared by every command.
pub struct Context {
    pub config: ClientConfig,
    pub repos: Repositories,
    pub store: Arc<LocalStore>,
    pub events: EventBus,
    pub auth: AuthSession,
    ui: Mutex<broadcast::Receiver<UiEvent>>,
}

impl Context {
    /// Load configuration and wire up the client.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn from_env() -> Result<Self, CliError> {
        let config = ClientConfig::from_env()?;
        let repos = Repositories::from_config(&config)?;
        let store = Arc::new(LocalStore::new(config.store_path()));
        let auth = AuthSession::new(repos.users.clone(), Arc::clone(&store));
        let events = EventBus::new();
        let ui = Mutex::new(events.subscribe());
        tracing::debug!(base_url = %config.api.base_url, store = %store.path().display(), "Context ready");
        Ok(Self {
            config,
            repos,
            store,
            events,
            auth,
            ui,
        })
    }

    /// The remembered session user.
    ///
    /// # Errors
    ///
    /// Returns `CliError::NotLoggedIn` when nobody is logged in.
    pub async fn require_user(&self) -> Result<User, CliError> {
        self.auth.restore().await.ok_or(CliError::NotLoggedIn)
    }

    /// Print the UI events emitted so far.
    #[allow(clippy::print_stdout, clippy::print_stderr)]
    pub async fn flush_events(&self) {
        let mut ui = self.ui.lock().await;
        while let Ok(event) = ui.try_recv() {
            match event {
                UiEvent::ShowSnackbar(message) => println!("✔ {message}"),
                UiEvent::ShowError(message) => eprintln!("✘ {message}"),
                UiEvent::Navigate(_) | UiEvent::NavigateBack => {}
            }
        }
    }
}

/// Parse an order status argument.
pub(crate) fn parse_status(raw: &str) -> Result<tienda_core::OrderStatus, CliError> {
    raw.trim()
        .to_lowercase()
        .parse()
        .map_err(CliError::InvalidArgument)
}

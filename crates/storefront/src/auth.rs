//! Shopper session: login, registration and the remembered user.

use std::sync::Arc;

use thiserror::Error;
use tienda_core::{Email, EmailError, User};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::api::ApiError;
use crate::repository::UserRepository;
use crate::store::{LocalStore, StoreError};

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Por favor complete todos los campos")]
    MissingFields,

    #[error("{}", .0.user_message())]
    InvalidEmail(#[from] EmailError),

    #[error("Usuario deshabilitado. Contacte al administrador.")]
    Disabled,

    #[error("{}", login_message(.0))]
    Api(#[from] ApiError),

    #[error("No se pudo guardar la sesión: {0}")]
    Store(#[from] StoreError),
}

/// The backend explains rejected logins (unknown email, wrong password,
/// locked account) in the body; show that text when there is one.
fn login_message(err: &ApiError) -> String {
    match err {
        ApiError::Http {
            status: 401 | 404 | 423,
            body,
        } if !body.trim().is_empty() => body.trim().to_string(),
        _ => err.user_message(),
    }
}

/// Logged-in user state backed by the local store.
#[derive(Debug, Clone)]
pub struct AuthSession {
    users: UserRepository,
    store: Arc<LocalStore>,
    current: Arc<RwLock<Option<User>>>,
}

impl AuthSession {
    #[must_use]
    pub fn new(users: UserRepository, store: Arc<LocalStore>) -> Self {
        Self {
            users,
            store,
            current: Arc::new(RwLock::new(None)),
        }
    }

    /// Log in and remember the session.
    ///
    /// # Errors
    ///
    /// `MissingFields` for blank input, `InvalidEmail`, `Disabled` for
    /// disabled accounts, or the backend/store error.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        if email.trim().is_empty() || password.trim().is_empty() {
            return Err(AuthError::MissingFields);
        }
        let email = Email::parse(email)?;

        let result = self.users.login(email.as_str(), password).await;
        let user = match result {
            Ok(user) if user.enabled => user,
            Ok(user) => {
                warn!(user_id = %user.id, "Login rejected: account disabled");
                *self.current.write().await = None;
                return Err(AuthError::Disabled);
            }
            Err(e) => {
                *self.current.write().await = None;
                return Err(e.into());
            }
        };

        self.remember(&user).await?;
        info!(user_id = %user.id, "Logged in");
        Ok(user.without_password())
    }

    /// Create an account and log it in.
    ///
    /// # Errors
    ///
    /// `MissingFields` for a blank email or password, `InvalidEmail`, or the
    /// backend/store error.
    #[instrument(skip(self, user), fields(username = %user.username))]
    pub async fn register(&self, user: &User) -> Result<User, AuthError> {
        if user.email.trim().is_empty() || user.password.trim().is_empty() {
            return Err(AuthError::MissingFields);
        }
        let email = Email::parse(&user.email)?;
        let request = User {
            email: email.into_inner(),
            ..user.clone()
        };

        let created = self.users.resource().create(&request).await?;
        self.remember(&created).await?;
        info!(user_id = %created.id, "Registered");
        Ok(created.without_password())
    }

    async fn remember(&self, user: &User) -> Result<(), StoreError> {
        let user = user.without_password();
        self.store.save_session(&user).await?;
        *self.current.write().await = Some(user);
        Ok(())
    }

    /// Load the remembered session, if any.
    pub async fn restore(&self) -> Option<User> {
        let user = self.store.session_user().await.filter(|u| !u.id.is_unassigned());
        (*self.current.write().await).clone_from(&user);
        user
    }

    /// Forget the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), AuthError> {
        *self.current.write().await = None;
        self.store.clear_session().await?;
        Ok(())
    }

    pub async fn current_user(&self) -> Option<User> {
        self.current.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Whether the logged-in user has the admin role.
    pub async fn is_admin(&self) -> bool {
        self.current.read().await.as_ref().is_some_and(User::is_admin)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use httpmock::prelude::*;
    use serde_json::json;
    use tienda_core::{RoleId, UserId};

    use super::*;
    use crate::api::{ApiClient, RetryPolicy};
    use crate::config::ApiConfig;

    fn session(server: &MockServer, dir: &tempfile::TempDir) -> AuthSession {
        let config = ApiConfig::new(&server.base_url()).unwrap();
        let client = ApiClient::new(&config, RetryPolicy::no_retry()).unwrap();
        AuthSession::new(
            UserRepository::new(client, Duration::from_secs(60)),
            Arc::new(LocalStore::new(dir.path().join("tienda.json"))),
        )
    }

    fn user_json(enabled: bool, role: i64) -> serde_json::Value {
        json!({
            "id": 4, "username": "ana", "email": "ana@tienda.co", "password": "hash",
            "role_id": role, "setting_id": null, "enabled": enabled
        })
    }

    #[tokio::test]
    async fn test_blank_fields_are_rejected() {
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().unwrap();
        let err = session(&server, &dir).login(" ", "x").await.unwrap_err();
        assert_eq!(err.to_string(), "Por favor complete todos los campos");
    }

    #[tokio::test]
    async fn test_login_saves_session_without_password() {
        let server = MockServer::start_async().await;
        let login = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/users/login")
                    .json_body(json!({"email": "ana@tienda.co", "password": "clave123"}));
                then.status(200).body(json!({"user": user_json(true, 2)}).to_string());
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let auth = session(&server, &dir);
        let user = auth.login(" Ana@Tienda.co ", "clave123").await.unwrap();
        login.assert_async().await;
        assert!(user.password.is_empty());
        assert!(auth.is_admin().await);

        let restored = session(&server, &dir).restore().await.unwrap();
        assert_eq!(restored.id, UserId::new(4));
        assert!(restored.password.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_user_is_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/users/login");
                then.status(200).body(json!({"user": user_json(false, 1)}).to_string());
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let auth = session(&server, &dir);
        let err = auth.login("ana@tienda.co", "clave123").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Usuario deshabilitado. Contacte al administrador."
        );
        assert!(!auth.is_authenticated().await);
        assert!(auth.restore().await.is_none());
    }

    #[tokio::test]
    async fn test_rejected_login_shows_backend_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/users/login");
                then.status(401).body("Contraseña incorrecta");
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = session(&server, &dir)
            .login("ana@tienda.co", "mala")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Contraseña incorrecta");
    }

    #[tokio::test]
    async fn test_register_then_logout() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/users")
                    .json_body_partial(r#"{"email": "nuevo@tienda.co"}"#);
                then.status(201).body(
                    json!({"id": 9, "username": "nuevo", "email": "nuevo@tienda.co", "role_id": 1})
                        .to_string(),
                );
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let auth = session(&server, &dir);
        let new_user = User {
            id: UserId::default(),
            username: "nuevo".to_string(),
            email: "Nuevo@Tienda.co".to_string(),
            password: "clave123".to_string(),
            role_id: RoleId::new(1),
            setting_id: None,
            enabled: true,
        };
        let created = auth.register(&new_user).await.unwrap();
        assert_eq!(created.id, UserId::new(9));
        assert!(!auth.is_admin().await);

        auth.logout().await.unwrap();
        assert!(auth.current_user().await.is_none());
        assert!(auth.restore().await.is_none());
    }

    #[tokio::test]
    async fn test_register_rejects_bad_email() {
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().unwrap();
        let user = User {
            id: UserId::default(),
            username: "x".to_string(),
            email: "sin-arroba".to_string(),
            password: "clave".to_string(),
            role_id: RoleId::new(1),
            setting_id: None,
            enabled: true,
        };
        let err = session(&server, &dir).register(&user).await.unwrap_err();
        assert_eq!(err.to_string(), "Correo electrónico inválido");
    }
}

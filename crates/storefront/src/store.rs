//! Local key-value store persisted as one JSON file.
//!
//! Holds the serialized cart, the session email and the logged-in user.
//! A missing or unreadable file reads as an empty store; writes go through
//! a temporary file and a rename so a crash never leaves half a file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tienda_core::User;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

/// Errors that can occur when writing the local store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Everything the store keeps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreData {
    /// Serialized cart lines.
    #[serde(default)]
    pub cart: Option<serde_json::Value>,
    #[serde(default)]
    pub session_email: Option<String>,
    /// Logged-in user, always stored without password.
    #[serde(default)]
    pub session_user: Option<User>,
}

/// JSON file store. Writers are serialized through an internal lock.
#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl LocalStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current contents; empty when the file is missing or corrupt.
    pub async fn load(&self) -> StoreData {
        let _guard = self.lock.lock().await;
        self.read_unlocked().await
    }

    async fn read_unlocked(&self) -> StoreData {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return StoreData::default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read local store");
                return StoreData::default();
            }
        };
        serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Local store is corrupt, starting empty");
            StoreData::default()
        })
    }

    async fn write_unlocked(&self, data: &StoreData) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let bytes = serde_json::to_vec_pretty(data)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;
        debug!(path = %self.path.display(), "Local store written");
        Ok(())
    }

    /// Read, modify and write the store under the lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn update<F>(&self, change: F) -> Result<StoreData, StoreError>
    where
        F: FnOnce(&mut StoreData),
    {
        let _guard = self.lock.lock().await;
        let mut data = self.read_unlocked().await;
        change(&mut data);
        self.write_unlocked(&data).await?;
        Ok(data)
    }

    /// Persist the serialized cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    #[instrument(skip(self, cart))]
    pub async fn save_cart(&self, cart: serde_json::Value) -> Result<(), StoreError> {
        self.update(|data| data.cart = Some(cart)).await.map(drop)
    }

    /// The serialized cart, if one was saved.
    pub async fn cart(&self) -> Option<serde_json::Value> {
        self.load().await.cart
    }

    /// Persist the logged-in user (password stripped) and its email.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn save_session(&self, user: &User) -> Result<(), StoreError> {
        let user = user.without_password();
        self.update(|data| {
            data.session_email = Some(user.email.clone());
            data.session_user = Some(user);
        })
        .await
        .map(drop)
    }

    /// Email of the remembered session.
    pub async fn session_email(&self) -> Option<String> {
        self.load().await.session_email
    }

    /// User of the remembered session.
    pub async fn session_user(&self) -> Option<User> {
        self.load().await.session_user
    }

    /// Forget the session; the cart is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    #[instrument(skip(self))]
    pub async fn clear_session(&self) -> Result<(), StoreError> {
        self.update(|data| {
            data.session_email = None;
            data.session_user = None;
        })
        .await
        .map(drop)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use tienda_core::{RoleId, UserId};

    use super::*;

    fn user() -> User {
        User {
            id: UserId::new(3),
            username: "ana".to_string(),
            email: "ana@tienda.co".to_string(),
            password: "s3creta".to_string(),
            role_id: RoleId::new(1),
            setting_id: None,
            enabled: true,
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("nope.json"));
        assert_eq!(store.load().await, StoreData::default());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tienda.json");
        std::fs::write(&path, b"{not json").unwrap();
        let store = LocalStore::new(&path);
        assert_eq!(store.load().await, StoreData::default());

        store.save_cart(json!([])).await.unwrap();
        assert_eq!(store.cart().await, Some(json!([])));
    }

    #[tokio::test]
    async fn test_session_is_saved_without_password() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("sub/tienda.json"));
        store.save_session(&user()).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(!raw.contains("s3creta"));

        let reopened = LocalStore::new(store.path());
        assert_eq!(reopened.session_email().await.as_deref(), Some("ana@tienda.co"));
        let restored = reopened.session_user().await.unwrap();
        assert_eq!(restored.id, UserId::new(3));
        assert!(restored.password.is_empty());
    }

    #[tokio::test]
    async fn test_clear_session_keeps_cart() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("tienda.json"));
        store.save_cart(json!([{"quantity": 2}])).await.unwrap();
        store.save_session(&user()).await.unwrap();
        store.clear_session().await.unwrap();

        let data = store.load().await;
        assert!(data.session_email.is_none());
        assert!(data.session_user.is_none());
        assert_eq!(data.cart, Some(json!([{"quantity": 2}])));
    }
}

//! Persisted session.

use crate::error::StorageError;
use crate::providers::KeyValueStorage;
use crate::types::Session;

/// Storage key the session is kept under unless configured otherwise
pub const DEFAULT_SESSION_KEY: &str = "userInfo";

/// Reads and writes the serialized [`Session`] in a [`KeyValueStorage`]
///
/// The vault is the single owner of the session key. The session store
/// writes through it; the todo store reads the token from it at the start
/// of every networked operation.
#[derive(Debug, Clone)]
pub struct SessionVault<K> {
    storage: K,
    key: String,
}

impl<K: KeyValueStorage> SessionVault<K> {
    /// Vault over `storage` using [`DEFAULT_SESSION_KEY`]
    #[must_use]
    pub fn new(storage: K) -> Self {
        Self::with_key(storage, DEFAULT_SESSION_KEY)
    }

    /// Vault over `storage` using a custom key
    #[must_use]
    pub fn with_key(storage: K, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Storage key
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Underlying storage
    #[must_use]
    pub const fn storage(&self) -> &K {
        &self.storage
    }

    /// Read the persisted session
    ///
    /// # Returns
    ///
    /// `None` if nothing is stored.
    ///
    /// # Errors
    ///
    /// - `StorageError::Corrupt` if the stored value is not a session
    /// - Any other `StorageError` if the storage cannot be read
    pub async fn load(&self) -> Result<Option<Session>, StorageError> {
        let Some(raw) = self.storage.get(&self.key).await? else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                key: self.key.clone(),
                reason: e.to_string(),
            })
    }

    /// Persist `session`, replacing any previous one
    ///
    /// # Errors
    ///
    /// Returns error if the session cannot be serialized or written.
    pub async fn save(&self, session: &Session) -> Result<(), StorageError> {
        let raw =
            serde_json::to_string(session).map_err(|e| StorageError::Serialize(e.to_string()))?;
        self.storage.set(&self.key, &raw).await
    }

    /// Remove the persisted session
    ///
    /// # Errors
    ///
    /// Returns error if the storage cannot be written.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(&self.key).await
    }

    /// Token of the persisted session
    ///
    /// Storage failures are logged and read as "no session".
    pub async fn token(&self) -> Option<String> {
        match self.load().await {
            Ok(session) => session.map(|session| session.token),
            Err(error) => {
                tracing::warn!(%error, key = %self.key, "Could not read persisted session");
                None
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mocks::MemoryStorage;
    use crate::types::User;

    fn session() -> Session {
        Session::new(
            "t1".to_string(),
            User {
                id: "u1".to_string(),
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn save_then_load() {
        let vault = SessionVault::new(MemoryStorage::new());

        vault.save(&session()).await.unwrap();

        assert_eq!(vault.load().await.unwrap(), Some(session()));
        assert_eq!(vault.token().await.as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn empty_vault_loads_none() {
        let vault = SessionVault::new(MemoryStorage::new());

        assert_eq!(vault.load().await.unwrap(), None);
        assert_eq!(vault.token().await, None);
    }

    #[tokio::test]
    async fn unparseable_entry_is_corrupt() {
        let storage = MemoryStorage::new();
        storage.insert(DEFAULT_SESSION_KEY, "{\"token\":");
        let vault = SessionVault::new(storage);

        let err = vault.load().await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { ref key, .. } if key == "userInfo"));
        assert_eq!(vault.token().await, None);
    }

    #[tokio::test]
    async fn entry_without_user_is_corrupt() {
        let storage = MemoryStorage::new();
        storage.insert(DEFAULT_SESSION_KEY, r#"{"token":"t1"}"#);
        let vault = SessionVault::new(storage);

        assert!(matches!(vault.load().await, Err(StorageError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn clear_removes_entry() {
        let storage = MemoryStorage::new();
        let vault = SessionVault::with_key(storage.clone(), "session");

        vault.save(&session()).await.unwrap();
        assert!(storage.contains("session"));

        vault.clear().await.unwrap();
        assert!(!storage.contains("session"));
        assert_eq!(vault.key(), "session");
    }
}

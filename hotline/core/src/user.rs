//! User Profile
//!
//! Anonymous device identity: a UUID generated on first launch plus an
//! editable display name, both persisted in a small key-value store.
//!
//! ```text
//! hal_user_id   -> "3f1c...-..."     (generated once, never changes)
//! hal_user_name -> "Dana"            (defaults to "Anonymous User")
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use uuid::Uuid;

use crate::chat::ChatAuthor;
use crate::error::ValidationError;

/// Key holding the device user id
pub const USER_ID_KEY: &str = "hal_user_id";

/// Key holding the display name
pub const USER_NAME_KEY: &str = "hal_user_name";

/// Display name used until the user picks one
pub const DEFAULT_USER_NAME: &str = "Anonymous User";

/// Placeholder avatar attached to every chat author from this device
pub const DEFAULT_AVATAR_URL: &str = "https://placeimg.com/140/140/any";

/// Key-value persistence failures
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Reading or writing the backing file failed
    #[error("Profile storage at {path} failed: {source}")]
    Io {
        /// Backing file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The backing file is not a JSON object of strings
    #[error("Profile storage at {path} is corrupt: {reason}")]
    Corrupt {
        /// Backing file
        path: PathBuf,
        /// Decoder message
        reason: String,
    },

    /// Rejected input
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

// ============================================================================
// Key-value stores
// ============================================================================

/// Device key-value persistence
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    async fn get(&self, key: &str) -> Result<Option<String>, ProfileError>;

    /// Write a value
    async fn set(&self, key: &str, value: &str) -> Result<(), ProfileError>;
}

/// JSON-object file store
///
/// The whole file is rewritten on every `set`; it only ever holds a few keys.
#[derive(Clone, Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    write_lock: Arc<tokio::sync::Mutex<()>>,
}

impl FileKeyValueStore {
    /// Store backed by `path` (created on first write)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_map(&self) -> Result<BTreeMap<String, String>, ProfileError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(ProfileError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| ProfileError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    fn io_error(&self, source: std::io::Error) -> ProfileError {
        ProfileError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ProfileError> {
        Ok(self.read_map().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), ProfileError> {
        let _guard = self.write_lock.lock().await;

        let mut map = self.read_map().await?;
        map.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let json = serde_json::to_string_pretty(&map).map_err(|e| ProfileError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| self.io_error(e))?;

        tracing::debug!(key, path = %self.path.display(), "Profile value saved");
        Ok(())
    }
}

/// In-memory store
#[derive(Clone, Debug, Default)]
pub struct MemoryKeyValueStore {
    values: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryKeyValueStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ProfileError> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), ProfileError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ============================================================================
// Profile
// ============================================================================

/// The device user
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    /// Stable anonymous id
    pub user_id: String,
    /// Display name
    pub user_name: String,
}

impl UserProfile {
    /// Load the profile, generating and persisting an id on first launch
    pub async fn load<K: KeyValueStore + ?Sized>(store: &K) -> Result<Self, ProfileError> {
        let user_id = match store.get(USER_ID_KEY).await? {
            Some(id) if !id.is_empty() => id,
            _ => {
                let id = Uuid::new_v4().to_string();
                store.set(USER_ID_KEY, &id).await?;
                tracing::info!(user_id = %id, "Generated new user id");
                id
            }
        };

        let user_name = store
            .get(USER_NAME_KEY)
            .await?
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_USER_NAME.to_string());

        Ok(Self { user_id, user_name })
    }

    /// Chat author for this user
    #[must_use]
    pub fn author(&self) -> ChatAuthor {
        ChatAuthor::new(self.user_id.clone(), self.user_name.clone())
            .with_avatar(DEFAULT_AVATAR_URL)
    }
}

/// Persist a new display name
///
/// Blank names are rejected without touching the store. The stored value is
/// trimmed.
pub async fn set_user_name<K: KeyValueStore + ?Sized>(
    store: &K,
    name: &str,
) -> Result<String, ProfileError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyDisplayName.into());
    }
    store.set(USER_NAME_KEY, name).await?;
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_first_load_generates_and_persists_id() {
        let store = MemoryKeyValueStore::new();

        let first = UserProfile::load(&store).await.unwrap();
        assert!(Uuid::parse_str(&first.user_id).is_ok());
        assert_eq!(first.user_name, DEFAULT_USER_NAME);

        let second = UserProfile::load(&store).await.unwrap();
        assert_eq!(first.user_id, second.user_id);
    }

    #[tokio::test]
    async fn test_set_user_name() {
        let store = MemoryKeyValueStore::new();
        let stored = set_user_name(&store, "  Dana  ").await.unwrap();
        assert_eq!(stored, "Dana");

        let profile = UserProfile::load(&store).await.unwrap();
        assert_eq!(profile.user_name, "Dana");
        assert_eq!(profile.author().name, "Dana");
        assert_eq!(profile.author().avatar.as_deref(), Some(DEFAULT_AVATAR_URL));
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let store = MemoryKeyValueStore::new();
        let err = set_user_name(&store, "   ").await.unwrap_err();
        assert!(matches!(
            err,
            ProfileError::Invalid(ValidationError::EmptyDisplayName)
        ));
        assert_eq!(store.get(USER_NAME_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("profile.json");

        let store = FileKeyValueStore::new(&path);
        assert_eq!(store.get(USER_ID_KEY).await.unwrap(), None);
        let profile = UserProfile::load(&store).await.unwrap();
        set_user_name(&store, "Dana").await.unwrap();

        let reopened = FileKeyValueStore::new(&path);
        let again = UserProfile::load(&reopened).await.unwrap();
        assert_eq!(again.user_id, profile.user_id);
        assert_eq!(again.user_name, "Dana");
    }

    #[tokio::test]
    async fn test_corrupt_file_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("profile.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileKeyValueStore::new(&path);
        let err = store.get(USER_ID_KEY).await.unwrap_err();
        assert!(matches!(err, ProfileError::Corrupt { .. }));
    }
}

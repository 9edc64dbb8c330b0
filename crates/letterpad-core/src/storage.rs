//! Durable local key-value storage trait.
//!
//! Three logical keys survive a restart: the identity token, the
//! drive-scoped access token, and the cached cloud folder id.

use crate::error::Result;

/// The well-known keys of the durable local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// The identity bearer token, mirrored on every credential change so a
    /// restart can restore it before the provider observer fires.
    IdToken,
    /// The drive-scoped access token, cleared on the first observed
    /// authorization failure.
    DriveToken,
    /// The cached id of the well-known cloud folder.
    FolderId,
}

impl StorageKey {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageKey::IdToken => "auth_token",
            StorageKey::DriveToken => "drive_access_token",
            StorageKey::FolderId => "letters_folder_id",
        }
    }
}

/// Durable local key-value storage.
#[async_trait::async_trait]
pub trait KeyValueStorage: Send + Sync {
    async fn get(&self, key: StorageKey) -> Result<Option<String>>;

    async fn set(&self, key: StorageKey, value: &str) -> Result<()>;

    /// Removes the key; removing an absent key is not an error.
    async fn remove(&self, key: StorageKey) -> Result<()>;
}

//! Cloud storage trait.

use crate::error::Result;

/// An abstract cloud file store the save workflow mirrors letters into.
///
/// Implementations own folder resolution, token handling and the single
/// retry on credential expiry; callers only see the resulting file id. A
/// failed `save_file` must leave no document-store side effects behind.
#[async_trait::async_trait]
pub trait CloudStore: Send + Sync {
    /// Materializes the letter as a remote file and returns its id.
    async fn save_file(&self, title: &str, content: &str) -> Result<String>;

    /// Fetches the content of a previously saved remote file.
    async fn fetch_file(&self, file_id: &str) -> Result<String>;
}

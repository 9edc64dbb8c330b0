//! Letter store trait.
//!
//! Defines the interface for letter persistence against the remote document
//! store.

use super::model::{Letter, LetterWrite};
use crate::error::Result;

/// An abstract store for letter records keyed by an opaque id.
///
/// This trait decouples the save workflow from the concrete document
/// database. Writes use merge semantics: only the fields present in the
/// [`LetterWrite`] are updated, other fields of an existing record are left
/// untouched, and `updated_at` is assigned server-side on every write.
#[async_trait::async_trait]
pub trait LetterStore: Send + Sync {
    /// Retrieves a letter by id on behalf of `owner_id`.
    ///
    /// Implementations must verify the returned record actually belongs to
    /// the requesting identity; a record owned by someone else is reported
    /// as absent.
    async fn get(&self, letter_id: &str, owner_id: &str) -> Result<Option<Letter>>;

    /// Lists all letters owned by `owner_id`, unordered.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Letter>>;

    /// Merge-writes `write` into the record at `letter_id`, creating it if
    /// absent.
    ///
    /// # Errors
    ///
    /// Transport failure surfaces as `RemoteIo`; no partial-write rollback
    /// is attempted.
    async fn upsert(&self, letter_id: &str, write: &LetterWrite) -> Result<()>;
}

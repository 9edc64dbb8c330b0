//! Letter domain model.
//!
//! A letter is the user-authored document being edited and persisted. Its
//! content is opaque rich-text markup; this crate never interprets it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder title substituted whenever the user left the title empty.
pub const UNTITLED_TITLE: &str = "Untitled Letter";

/// The most recent successful save target of a letter.
///
/// This records history, not a state machine: a letter moves freely between
/// `Draft` and `Cloud` depending on where the user last saved it.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LetterStatus {
    /// Persisted only to the document store
    #[default]
    Draft,
    /// Mirrored to the user's cloud storage on the last save
    Cloud,
}

/// Where an explicit user save action should persist the letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTarget {
    Draft,
    Cloud,
}

impl SaveTarget {
    /// The status a successful save with this target stamps on the record.
    pub fn status(self) -> LetterStatus {
        match self {
            SaveTarget::Draft => LetterStatus::Draft,
            SaveTarget::Cloud => LetterStatus::Cloud,
        }
    }
}

/// A persisted letter record as held by the document store.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Letter {
    /// Opaque identifier, assigned before the first write
    pub id: String,
    /// Display title
    pub title: String,
    /// Opaque rich-text payload
    pub content: String,
    /// Identity of the owning user; set on every write, never user-editable
    pub owner_id: String,
    /// Last successful save target
    #[serde(default)]
    pub status: LetterStatus,
    /// Cloud file id, present once the letter was materialized in cloud
    /// storage. Never cleared once set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_file_id: Option<String>,
    /// Server-assigned creation timestamp
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Server-assigned timestamp, rewritten on every save
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// The in-memory edit buffer the editor populates before a save commits.
///
/// `id` is absent for a letter that has never been persisted. The buffer is
/// owned by the save workflow until a save succeeds, after which the document
/// store holds the record of truth.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LetterBuffer {
    pub id: Option<String>,
    pub title: String,
    pub content: String,
    /// Carried over from a previously loaded letter so a draft save does not
    /// drop an earlier cloud materialization.
    pub cloud_file_id: Option<String>,
}

impl LetterBuffer {
    /// Builds an edit buffer from a loaded letter.
    pub fn from_letter(letter: &Letter) -> Self {
        Self {
            id: Some(letter.id.clone()),
            title: letter.title.clone(),
            content: letter.content.clone(),
            cloud_file_id: letter.cloud_file_id.clone(),
        }
    }

    /// The title with the placeholder substituted when empty.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            UNTITLED_TITLE
        } else {
            &self.title
        }
    }
}

/// The partial record handed to a merge-write.
///
/// Fields absent from the record (timestamps, creation metadata) are left
/// untouched by the store; `updated_at` is assigned server-side on every
/// write.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LetterWrite {
    pub title: String,
    pub content: String,
    pub owner_id: String,
    pub status: LetterStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_file_id: Option<String>,
}

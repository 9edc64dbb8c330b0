//! Save workflow orchestration.
//!
//! Reconciles the in-memory edit buffer with the document store and,
//! for cloud saves, the cloud file store. The workflow never mutates the
//! buffer: on any failure the caller still holds the exact state the user
//! typed and may retry.

use letterpad_core::cloud::CloudStore;
use letterpad_core::error::Result;
use letterpad_core::letter::{Letter, LetterBuffer, LetterStore, LetterWrite, SaveTarget};
use letterpad_core::notify::{Notice, Notifier};
use letterpad_core::session::CredentialSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;

/// How long `Saved`/`Failed` stay visible before the reset to `Idle`.
const SAVE_STATUS_RESET: Duration = Duration::from_secs(2);

/// Observable save progress, published on a watch channel.
///
/// `Saved` and `Failed` are display states: they transition back to `Idle`
/// after a fixed interval with no further side effects. The `Saving` guard
/// is advisory only; nothing server-side prevents two devices from racing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    Idle,
    Saving,
    Saved,
    Failed,
}

/// Result of a save request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The record was written; `created` marks a first-time save, in which
    /// case the caller should re-address to `letter_id`.
    Saved { letter_id: String, created: bool },
    /// Precondition unmet (not signed in, or a save already in flight).
    /// Not an error.
    Skipped,
}

/// Orchestrates letter persistence for the current identity.
pub struct LetterService {
    letters: Arc<dyn LetterStore>,
    cloud: Arc<dyn CloudStore>,
    credentials: Arc<dyn CredentialSource>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<SaveState>,
}

impl LetterService {
    pub fn new(
        letters: Arc<dyn LetterStore>,
        cloud: Arc<dyn CloudStore>,
        credentials: Arc<dyn CredentialSource>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (state, _) = watch::channel(SaveState::Idle);
        Self {
            letters,
            cloud,
            credentials,
            notifier,
            state,
        }
    }

    /// Subscribes to save-state transitions.
    pub fn save_state(&self) -> watch::Receiver<SaveState> {
        self.state.subscribe()
    }

    /// Persists the edit buffer to the requested target.
    ///
    /// For a cloud target the file is materialized first; only then is the
    /// merged record written to the document store, so a failed cloud save
    /// never corrupts the draft record. The letter id is determined before
    /// any write so the cloud file and the document record share it.
    pub async fn save(&self, buffer: &LetterBuffer, target: SaveTarget) -> Result<SaveOutcome> {
        let Some(user) = self.credentials.identity().await else {
            tracing::debug!("save requested without an authenticated identity, skipped");
            return Ok(SaveOutcome::Skipped);
        };
        if *self.state.borrow() == SaveState::Saving {
            tracing::debug!("save already in flight, skipped");
            return Ok(SaveOutcome::Skipped);
        }
        self.state.send_replace(SaveState::Saving);

        let created = buffer.id.is_none();
        let letter_id = buffer
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut cloud_file_id = buffer.cloud_file_id.clone();
        if target == SaveTarget::Cloud {
            match self.cloud.save_file(buffer.display_title(), &buffer.content).await {
                Ok(file_id) => cloud_file_id = Some(file_id),
                Err(e) => {
                    tracing::error!(error = %e, "cloud save failed");
                    self.notifier
                        .notify(Notice::error("Failed to save to cloud storage"));
                    self.fail();
                    return Err(e);
                }
            }
        }

        let write = LetterWrite {
            title: buffer.display_title().to_string(),
            content: buffer.content.clone(),
            owner_id: user.uid,
            status: target.status(),
            cloud_file_id,
        };

        match self.letters.upsert(&letter_id, &write).await {
            Ok(()) => {
                self.state.send_replace(SaveState::Saved);
                self.schedule_reset();
                self.notifier.notify(Notice::success(match target {
                    SaveTarget::Draft => "Draft saved successfully",
                    SaveTarget::Cloud => "Letter saved to cloud storage",
                }));
                tracing::info!(%letter_id, ?target, "letter saved");
                Ok(SaveOutcome::Saved { letter_id, created })
            }
            Err(e) => {
                tracing::error!(error = %e, %letter_id, "letter save failed");
                self.notifier.notify(Notice::error("Failed to save letter"));
                self.fail();
                Err(e)
            }
        }
    }

    /// Loads a letter owned by the current identity.
    pub async fn load(&self, letter_id: &str) -> Result<Option<Letter>> {
        let Some(user) = self.credentials.identity().await else {
            return Ok(None);
        };
        self.letters.get(letter_id, &user.uid).await
    }

    /// Lists the current identity's letters, unordered.
    pub async fn list(&self) -> Result<Vec<Letter>> {
        let Some(user) = self.credentials.identity().await else {
            return Ok(Vec::new());
        };
        self.letters.list_by_owner(&user.uid).await
    }

    /// Fetches the cloud copy of a previously saved letter.
    pub async fn fetch_cloud_content(&self, file_id: &str) -> Result<String> {
        self.cloud.fetch_file(file_id).await
    }

    fn fail(&self) {
        self.state.send_replace(SaveState::Failed);
        self.schedule_reset();
    }

    fn schedule_reset(&self) {
        let state = self.state.clone();
        tokio::spawn(async move {
            tokio::time::sleep(SAVE_STATUS_RESET).await;
            // Only reset a terminal display state; a save that started in
            // the meantime keeps its own state.
            state.send_if_modified(|s| {
                if matches!(s, SaveState::Saved | SaveState::Failed) {
                    *s = SaveState::Idle;
                    true
                } else {
                    false
                }
            });
        });
    }
}

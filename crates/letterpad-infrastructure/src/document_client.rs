//! REST document store client for letter records.
//!
//! Letters live in a `letters` collection keyed by an opaque id. Writes are
//! merge-writes: the server folds the supplied fields into any existing
//! record and stamps `updated_at` itself. Every request bears the current
//! identity token.

use letterpad_core::error::{LetterpadError, Result};
use letterpad_core::letter::{Letter, LetterStore, LetterWrite};
use letterpad_core::session::CredentialSource;
use reqwest::{Client, StatusCode};
use std::sync::Arc;

/// [`LetterStore`] backed by the document store's REST surface.
#[derive(Clone)]
pub struct RestDocumentStore {
    http: Client,
    base_url: String,
    credentials: Arc<dyn CredentialSource>,
}

impl RestDocumentStore {
    pub fn new(base_url: impl Into<String>, credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            credentials,
        }
    }

    fn letter_url(&self, letter_id: &str) -> String {
        format!("{}/letters/{letter_id}", self.base_url)
    }
}

fn reject_failure(status: StatusCode, context: &str) -> LetterpadError {
    if status == StatusCode::UNAUTHORIZED {
        LetterpadError::auth_expired(format!("{context}: {status}"))
    } else {
        LetterpadError::remote_io(format!("{context}: {status}"))
    }
}

#[async_trait::async_trait]
impl LetterStore for RestDocumentStore {
    async fn get(&self, letter_id: &str, owner_id: &str) -> Result<Option<Letter>> {
        let token = self.credentials.id_token().await?;
        let response = self
            .http
            .get(self.letter_url(letter_id))
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(reject_failure(status, "letter fetch failed"));
        }

        let letter: Letter = response.json().await?;
        // Lookups are by id alone, so ownership is enforced here: someone
        // else's record is reported as absent.
        if letter.owner_id != owner_id {
            tracing::warn!(%letter_id, "letter owner mismatch, treating as absent");
            return Ok(None);
        }
        Ok(Some(letter))
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Letter>> {
        let token = self.credentials.id_token().await?;
        let response = self
            .http
            .get(format!("{}/letters", self.base_url))
            .query(&[("owner_id", owner_id)])
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(reject_failure(status, "letter list failed"));
        }
        Ok(response.json().await?)
    }

    async fn upsert(&self, letter_id: &str, write: &LetterWrite) -> Result<()> {
        let token = self.credentials.id_token().await?;
        let response = self
            .http
            .patch(self.letter_url(letter_id))
            .bearer_auth(token)
            .json(write)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(reject_failure(status, "letter upsert failed"));
        }
        tracing::debug!(%letter_id, "letter upserted");
        Ok(())
    }
}

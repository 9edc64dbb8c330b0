//! Cloud drive REST client: folder resolution and file save/fetch.
//!
//! All letters of a user live under a single well-known "Letters" folder.
//! Folder resolution trusts the cached id first, re-validates it against the
//! remote store, then falls back to a search by name and finally to
//! creation; this avoids duplicate folders across sessions while tolerating
//! a stale cache (folder deleted out-of-band).
//!
//! Authorization failures are recovered by invalidating the cached drive
//! token and retrying the whole operation once through an explicit bounded
//! loop; a second rejection propagates as `AuthExpired`.

use letterpad_core::cloud::CloudStore;
use letterpad_core::error::{LetterpadError, Result};
use letterpad_core::session::DriveTokenSource;
use letterpad_core::storage::{KeyValueStorage, StorageKey};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Name of the well-known folder holding all of a user's letters.
pub const LETTERS_FOLDER_NAME: &str = "Letters";

const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
const DOCUMENT_MIME_TYPE: &str = "application/vnd.google-apps.document";
const CONTENT_TYPE: &str = "text/html";

/// One invalidate-and-retry on a rejected drive token.
const AUTH_RETRIES: usize = 1;

/// Drive REST client implementing [`CloudStore`].
#[derive(Clone)]
pub struct DriveClient {
    http: Client,
    api_base_url: String,
    upload_base_url: String,
    tokens: Arc<dyn DriveTokenSource>,
    folder_cache: Arc<dyn KeyValueStorage>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileMetadata<'a> {
    name: &'a str,
    mime_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parents: Option<Vec<&'a str>>,
}

#[derive(Deserialize)]
struct FileResource {
    id: String,
}

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileResource>,
}

impl DriveClient {
    pub fn new(
        api_base_url: impl Into<String>,
        upload_base_url: impl Into<String>,
        tokens: Arc<dyn DriveTokenSource>,
        folder_cache: Arc<dyn KeyValueStorage>,
    ) -> Self {
        Self {
            http: Client::new(),
            api_base_url: api_base_url.into(),
            upload_base_url: upload_base_url.into(),
            tokens,
            folder_cache,
        }
    }

    /// Resolves the id of the well-known letters folder: trust the cached id
    /// after re-validation, otherwise search by name, otherwise create.
    pub async fn get_or_create_folder(&self, token: &str) -> Result<String> {
        if let Some(folder_id) = self.folder_cache.get(StorageKey::FolderId).await? {
            match self.folder_exists(token, &folder_id).await {
                Ok(true) => return Ok(folder_id),
                Ok(false) => {
                    tracing::warn!(%folder_id, "cached letters folder no longer exists");
                }
                Err(e) => {
                    // A failed existence check falls through to the search
                    // path rather than aborting the save.
                    tracing::warn!(error = %e, "letters folder existence check failed");
                }
            }
        }

        if let Some(folder_id) = self.search_folder(token).await? {
            self.folder_cache
                .set(StorageKey::FolderId, &folder_id)
                .await?;
            return Ok(folder_id);
        }

        let folder_id = self.create_folder(token).await?;
        self.folder_cache
            .set(StorageKey::FolderId, &folder_id)
            .await?;
        tracing::info!(%folder_id, "created letters folder");
        Ok(folder_id)
    }

    async fn folder_exists(&self, token: &str, folder_id: &str) -> Result<bool> {
        let response = self
            .http
            .get(format!("{}/files/{folder_id}", self.api_base_url))
            .bearer_auth(token)
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    async fn search_folder(&self, token: &str) -> Result<Option<String>> {
        let query = format!(
            "name='{LETTERS_FOLDER_NAME}' and mimeType='{FOLDER_MIME_TYPE}' and trashed=false"
        );
        let response = self
            .http
            .get(format!("{}/files", self.api_base_url))
            .query(&[("q", query.as_str())])
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            // Like a failed existence check, a failed search just means we
            // try to create the folder instead.
            tracing::warn!(status = %response.status(), "letters folder search failed");
            return Ok(None);
        }

        let list: FileList = response.json().await?;
        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    async fn create_folder(&self, token: &str) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/files", self.api_base_url))
            .bearer_auth(token)
            .json(&FileMetadata {
                name: LETTERS_FOLDER_NAME,
                mime_type: FOLDER_MIME_TYPE,
                parents: None,
            })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(LetterpadError::auth_expired("folder create returned 401"));
        }
        if !status.is_success() {
            return Err(LetterpadError::remote_io(format!(
                "failed to create letters folder: {status}"
            )));
        }
        let folder: FileResource = response.json().await?;
        Ok(folder.id)
    }

    async fn create_file(&self, token: &str, title: &str, folder_id: &str) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/files", self.api_base_url))
            .bearer_auth(token)
            .json(&FileMetadata {
                name: title,
                mime_type: DOCUMENT_MIME_TYPE,
                parents: Some(vec![folder_id]),
            })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(LetterpadError::auth_expired("file create returned 401"));
        }
        if !status.is_success() {
            return Err(LetterpadError::remote_io(format!(
                "failed to create file: {status}"
            )));
        }
        let file: FileResource = response.json().await?;
        Ok(file.id)
    }

    async fn upload_content(&self, token: &str, file_id: &str, content: &str) -> Result<()> {
        let response = self
            .http
            .patch(format!("{}/files/{file_id}", self.upload_base_url))
            .query(&[("uploadType", "media")])
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .body(content.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LetterpadError::remote_io(format!(
                "failed to upload file content: {status}"
            )));
        }
        Ok(())
    }

    /// One pass of the save sequence: resolve folder, create metadata,
    /// upload content.
    async fn try_save(&self, title: &str, content: &str) -> Result<String> {
        let token = self.tokens.drive_token().await?;
        let folder_id = self.get_or_create_folder(&token).await?;
        let file_id = self.create_file(&token, title, &folder_id).await?;
        self.upload_content(&token, &file_id, content).await?;
        Ok(file_id)
    }

    async fn try_fetch(&self, file_id: &str) -> Result<String> {
        let token = self.tokens.drive_token().await?;
        let response = self
            .http
            .get(format!("{}/files/{file_id}", self.api_base_url))
            .query(&[("alt", "media")])
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(LetterpadError::auth_expired("file fetch returned 401"));
        }
        if !status.is_success() {
            return Err(LetterpadError::remote_io(format!(
                "failed to fetch file: {status}"
            )));
        }
        Ok(response.text().await?)
    }
}

#[async_trait::async_trait]
impl CloudStore for DriveClient {
    async fn save_file(&self, title: &str, content: &str) -> Result<String> {
        for attempt in 0..=AUTH_RETRIES {
            match self.try_save(title, content).await {
                Err(e) if e.is_auth_expired() && attempt < AUTH_RETRIES => {
                    tracing::warn!("drive token rejected, acquiring a fresh one");
                    self.tokens.invalidate_drive_token().await?;
                }
                other => return other,
            }
        }
        Err(LetterpadError::auth_expired(
            "drive authorization rejected after token refresh",
        ))
    }

    async fn fetch_file(&self, file_id: &str) -> Result<String> {
        for attempt in 0..=AUTH_RETRIES {
            match self.try_fetch(file_id).await {
                Err(e) if e.is_auth_expired() && attempt < AUTH_RETRIES => {
                    tracing::warn!("drive token rejected, acquiring a fresh one");
                    self.tokens.invalidate_drive_token().await?;
                }
                other => return other,
            }
        }
        Err(LetterpadError::auth_expired(
            "drive authorization rejected after token refresh",
        ))
    }
}

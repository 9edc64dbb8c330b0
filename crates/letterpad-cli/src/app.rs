//! Service wiring: config -> adapters -> services.

use anyhow::Result;
use letterpad_application::{LetterService, SessionService};
use letterpad_core::notify::{Notice, Notifier, NoticeLevel};
use letterpad_core::storage::KeyValueStorage;
use letterpad_infrastructure::{
    AppConfig, DriveClient, JsonFileStorage, RestDocumentStore, RestIdentityProvider,
};
use std::sync::Arc;

/// Prints notices to stderr, the CLI's snackbar.
struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, notice: Notice) {
        let prefix = match notice.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Info => "info",
            NoticeLevel::Error => "error",
        };
        eprintln!("[{prefix}] {}", notice.message);
    }
}

pub struct App {
    pub session: Arc<SessionService>,
    pub letters: Arc<LetterService>,
}

/// Builds the full service graph from configuration.
pub fn build(config: AppConfig) -> Result<App> {
    let storage: Arc<dyn KeyValueStorage> = match &config.storage.path {
        Some(path) => Arc::new(JsonFileStorage::new(path)?),
        None => Arc::new(JsonFileStorage::default_location()?),
    };
    let notifier: Arc<dyn Notifier> = Arc::new(StderrNotifier);

    let provider = Arc::new(RestIdentityProvider::new(config.identity.clone()));
    let session = Arc::new(SessionService::new(
        provider,
        storage.clone(),
        notifier.clone(),
    ));

    let drive = Arc::new(DriveClient::new(
        config.drive.api_base_url.clone(),
        config.drive.upload_base_url.clone(),
        session.clone(),
        storage,
    ));
    let documents = Arc::new(RestDocumentStore::new(
        config.documents.base_url.clone(),
        session.clone(),
    ));
    let letters = Arc::new(LetterService::new(
        documents,
        drive,
        session.clone(),
        notifier,
    ));

    Ok(App { session, letters })
}

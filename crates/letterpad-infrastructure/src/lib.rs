//! Infrastructure adapters for Letterpad.
//!
//! Concrete implementations of the core traits: file-backed local storage,
//! the REST identity provider, the cloud drive client and the document
//! store client, plus configuration loading.

pub mod config;
pub mod document_client;
pub mod drive_client;
pub mod identity_client;
pub mod json_file_storage;

pub use crate::config::AppConfig;
pub use crate::document_client::RestDocumentStore;
pub use crate::drive_client::{DriveClient, LETTERS_FOLDER_NAME};
pub use crate::identity_client::RestIdentityProvider;
pub use crate::json_file_storage::JsonFileStorage;

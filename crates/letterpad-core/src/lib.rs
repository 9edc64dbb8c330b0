//! Core domain types and traits for Letterpad.
//!
//! This crate defines the letter and session models, the error taxonomy and
//! the traits at the seams between the save workflow and its collaborators
//! (document store, cloud store, identity provider, local storage,
//! notifications). Concrete adapters live in `letterpad-infrastructure`;
//! orchestration lives in `letterpad-application`.

pub mod cloud;
pub mod error;
pub mod letter;
pub mod notify;
pub mod session;
pub mod storage;

// Re-export common error type
pub use error::{LetterpadError, Result};

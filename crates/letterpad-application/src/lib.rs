//! Application services for Letterpad.
//!
//! `SessionService` owns the credential lifecycle; `LetterService` drives
//! the save workflow. Both depend only on the core traits and are wired to
//! concrete adapters by the host (see `letterpad-cli`).

pub mod letter_service;
pub mod session_service;

pub use letter_service::{LetterService, SaveOutcome, SaveState};
pub use session_service::{SessionService, TOKEN_REFRESH_INTERVAL};

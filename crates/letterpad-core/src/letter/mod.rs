//! Letter domain: models and the store trait.

pub mod model;
pub mod repository;

pub use model::{Letter, LetterBuffer, LetterStatus, LetterWrite, SaveTarget, UNTITLED_TITLE};
pub use repository::LetterStore;

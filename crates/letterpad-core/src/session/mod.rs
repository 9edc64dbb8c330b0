//! Session domain: identity models and provider traits.

pub mod model;
pub mod provider;

pub use model::{SessionCredential, SignInOutcome, UserIdentity};
pub use provider::{CredentialSource, DriveTokenSource, IdentityProvider};

//! Session and identity models.

use serde::{Deserialize, Serialize};

/// The authenticated user as reported by the identity provider.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    /// Stable provider-assigned user id
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

/// The identity-scoped credential held while a session is active.
///
/// `id_token` is the bearer credential presented to the document store;
/// `refresh_token` is exchanged for a fresh id token on the refresh timer.
/// The drive-scoped access token is tracked separately in durable storage
/// and refreshed reactively, not here.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionCredential {
    pub user: UserIdentity,
    pub id_token: String,
    pub refresh_token: String,
}

/// The result of a sign-in, by any method.
///
/// Only the cloud-capable method yields a `drive_token`; email/password
/// sign-ins leave it absent and the drive token is acquired lazily on the
/// first cloud save.
#[derive(Debug, Clone)]
pub struct SignInOutcome {
    pub credential: SessionCredential,
    pub drive_token: Option<String>,
}

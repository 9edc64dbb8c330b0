//! Identity provider and credential source traits.

use super::model::{SessionCredential, SignInOutcome, UserIdentity};
use crate::error::Result;

/// An abstract identity provider.
///
/// Decouples the session store from the concrete authentication backend.
/// All tokens are opaque strings with provider-defined expiry.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Signs in through the provider's own consent flow (the cloud-capable
    /// method). Yields a drive-scoped access token alongside the identity
    /// credential.
    async fn sign_in_with_google(&self) -> Result<SignInOutcome>;

    /// Email/password sign-in.
    async fn sign_in_with_email(&self, email: &str, password: &str) -> Result<SignInOutcome>;

    /// Email/password account creation.
    async fn sign_up_with_email(&self, email: &str, password: &str) -> Result<SignInOutcome>;

    /// Exchanges the current refresh token for a fresh identity credential.
    ///
    /// # Errors
    ///
    /// `SessionExpired` when the provider rejects the refresh; the caller
    /// must treat the session as terminated.
    async fn refresh_credential(&self, current: &SessionCredential) -> Result<SessionCredential>;

    /// Acquires a fresh drive-scoped access token via the provider's
    /// consent/offline flow.
    async fn acquire_drive_token(&self) -> Result<String>;
}

/// Read access to the current identity credential.
///
/// Reads always observe the latest completed credential write, never a torn
/// value; the refresh timer and in-flight saves share this view.
#[async_trait::async_trait]
pub trait CredentialSource: Send + Sync {
    /// The current identity bearer token.
    ///
    /// # Errors
    ///
    /// `AuthExpired` when no authenticated session (or restored token) is
    /// present.
    async fn id_token(&self) -> Result<String>;

    /// The currently signed-in user, if any.
    async fn identity(&self) -> Option<UserIdentity>;
}

/// Access to the separately tracked drive-scoped token.
///
/// The drive token is refreshed reactively: callers invalidate it on the
/// first observed authorization failure and the next `drive_token` call
/// acquires a fresh one.
#[async_trait::async_trait]
pub trait DriveTokenSource: Send + Sync {
    /// Returns the cached drive token, acquiring (and caching) one through
    /// the provider when absent.
    async fn drive_token(&self) -> Result<String>;

    /// Drops the cached drive token so the next call acquires a fresh one.
    async fn invalidate_drive_token(&self) -> Result<()>;
}

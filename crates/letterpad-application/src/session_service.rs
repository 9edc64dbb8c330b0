//! Session store: credential lifecycle, durable mirroring and the refresh
//! scheduler.
//!
//! The session object owns all credential state and is injected into the
//! save workflow and the drive client; nothing here is process-global. The
//! identity token is refreshed proactively on a fixed timer while a session
//! is active; the drive-scoped token is refreshed reactively through the
//! [`DriveTokenSource`] implementation when a caller reports it rejected.

use letterpad_core::error::{LetterpadError, Result};
use letterpad_core::notify::{Notice, Notifier};
use letterpad_core::session::{
    CredentialSource, DriveTokenSource, IdentityProvider, SessionCredential, SignInOutcome,
    UserIdentity,
};
use letterpad_core::storage::{KeyValueStorage, StorageKey};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::interval;

/// Proactive identity token refresh period.
pub const TOKEN_REFRESH_INTERVAL: Duration = Duration::from_secs(55 * 60);

/// Holds the current identity and bearer credential.
///
/// Every credential change is mirrored into durable storage so a restart
/// can restore the bearer token before any provider round trip.
pub struct SessionService {
    provider: Arc<dyn IdentityProvider>,
    storage: Arc<dyn KeyValueStorage>,
    notifier: Arc<dyn Notifier>,
    credential: RwLock<Option<SessionCredential>>,
    /// Token restored from durable storage before any sign-in this run.
    /// Carries no identity, so identity-gated workflow operations still
    /// require a sign-in; `id_token` falls back to it for hosts that read
    /// the document store directly before the provider observer fires.
    restored_token: RwLock<Option<String>>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionService {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        storage: Arc<dyn KeyValueStorage>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            provider,
            storage,
            notifier,
            credential: RwLock::new(None),
            restored_token: RwLock::new(None),
            refresh_task: Mutex::new(None),
        }
    }

    /// Re-hydrates the identity token mirrored by a previous run.
    pub async fn restore(&self) -> Result<()> {
        if let Some(token) = self.storage.get(StorageKey::IdToken).await? {
            tracing::debug!("restored identity token from storage");
            *self.restored_token.write().await = Some(token);
        }
        Ok(())
    }

    /// The current session credential, if signed in.
    pub async fn credential(&self) -> Option<SessionCredential> {
        self.credential.read().await.clone()
    }

    /// Interactive provider sign-in; also yields the drive-scoped token.
    pub async fn sign_in_with_google(&self) -> Result<()> {
        match self.provider.sign_in_with_google().await {
            Ok(outcome) => {
                self.install(outcome).await?;
                self.notifier
                    .notify(Notice::success("Successfully signed in with Google!"));
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "google sign-in failed");
                self.notifier
                    .notify(Notice::error("Failed to sign in with Google"));
                Err(e)
            }
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<()> {
        match self.provider.sign_in_with_email(email, password).await {
            Ok(outcome) => {
                self.install(outcome).await?;
                self.notifier
                    .notify(Notice::success("Successfully signed in!"));
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "email sign-in failed");
                self.notifier
                    .notify(Notice::error("Invalid email or password"));
                Err(e)
            }
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<()> {
        match self.provider.sign_up_with_email(email, password).await {
            Ok(outcome) => {
                self.install(outcome).await?;
                self.notifier
                    .notify(Notice::success("Account created successfully!"));
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "sign-up failed");
                self.notifier
                    .notify(Notice::error("Failed to create account"));
                Err(e)
            }
        }
    }

    /// Ends the session: cancels the refresh timer and clears every cached
    /// token from durable storage.
    pub async fn logout(&self) -> Result<()> {
        self.stop_refresh_scheduler();
        self.clear_session().await?;
        self.notifier.notify(Notice::info("Successfully signed out"));
        Ok(())
    }

    /// Exchanges the refresh token for a fresh identity credential.
    ///
    /// A refresh with no active session is a silent no-op. A rejected
    /// refresh terminates the session: all cached tokens are cleared and
    /// the user must sign in again.
    pub async fn refresh_credential(&self) -> Result<()> {
        let Some(current) = self.credential().await else {
            tracing::debug!("no active session, refresh skipped");
            return Ok(());
        };

        match self.provider.refresh_credential(&current).await {
            Ok(refreshed) => {
                self.storage
                    .set(StorageKey::IdToken, &refreshed.id_token)
                    .await?;
                *self.credential.write().await = Some(refreshed);
                tracing::debug!("identity token refreshed");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "token refresh rejected, terminating session");
                self.notifier
                    .notify(Notice::error("Session expired. Please sign in again."));
                if let Err(clear_err) = self.clear_session().await {
                    tracing::warn!(error = %clear_err, "failed to clear session state");
                }
                Err(e)
            }
        }
    }

    /// Starts the proactive refresh timer. Replaces any previous timer.
    pub fn start_refresh_scheduler(self: &Arc<Self>) {
        self.spawn_refresh_task(TOKEN_REFRESH_INTERVAL);
    }

    fn spawn_refresh_task(self: &Arc<Self>, period: Duration) {
        let service = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            // The first tick completes immediately; the first refresh should
            // only happen after a full period.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = service.refresh_credential().await {
                    tracing::error!(target: "session", error = %e, "scheduled refresh failed");
                }
            }
        });

        let mut guard = self.refresh_task.lock().unwrap();
        if let Some(previous) = guard.replace(handle) {
            previous.abort();
        }
    }

    fn stop_refresh_scheduler(&self) {
        if let Some(handle) = self.refresh_task.lock().unwrap().take() {
            handle.abort();
        }
    }

    async fn install(&self, outcome: SignInOutcome) -> Result<()> {
        self.storage
            .set(StorageKey::IdToken, &outcome.credential.id_token)
            .await?;
        if let Some(drive_token) = &outcome.drive_token {
            self.storage.set(StorageKey::DriveToken, drive_token).await?;
        }
        *self.credential.write().await = Some(outcome.credential);
        Ok(())
    }

    async fn clear_session(&self) -> Result<()> {
        *self.credential.write().await = None;
        *self.restored_token.write().await = None;
        self.storage.remove(StorageKey::IdToken).await?;
        self.storage.remove(StorageKey::DriveToken).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl CredentialSource for SessionService {
    async fn id_token(&self) -> Result<String> {
        if let Some(credential) = self.credential.read().await.as_ref() {
            return Ok(credential.id_token.clone());
        }
        if let Some(token) = self.restored_token.read().await.as_ref() {
            return Ok(token.clone());
        }
        Err(LetterpadError::auth_expired("no authenticated session"))
    }

    async fn identity(&self) -> Option<UserIdentity> {
        self.credential
            .read()
            .await
            .as_ref()
            .map(|c| c.user.clone())
    }
}

#[async_trait::async_trait]
impl DriveTokenSource for SessionService {
    async fn drive_token(&self) -> Result<String> {
        if let Some(token) = self.storage.get(StorageKey::DriveToken).await? {
            return Ok(token);
        }
        tracing::info!("no cached drive token, acquiring one");
        let token = self.provider.acquire_drive_token().await?;
        self.storage.set(StorageKey::DriveToken, &token).await?;
        Ok(token)
    }

    async fn invalidate_drive_token(&self) -> Result<()> {
        self.storage.remove(StorageKey::DriveToken).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use letterpad_core::notify::NoticeLevel;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct ScriptedProvider {
        refresh_calls: AtomicUsize,
        drive_acquires: AtomicUsize,
        fail_refresh: AtomicBool,
    }

    impl ScriptedProvider {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                refresh_calls: AtomicUsize::new(0),
                drive_acquires: AtomicUsize::new(0),
                fail_refresh: AtomicBool::new(false),
            })
        }

        fn outcome(drive_token: Option<&str>) -> SignInOutcome {
            SignInOutcome {
                credential: SessionCredential {
                    user: UserIdentity {
                        uid: "user-1".to_string(),
                        email: Some("a@example.com".to_string()),
                        display_name: None,
                    },
                    id_token: "id-token-1".to_string(),
                    refresh_token: "refresh-1".to_string(),
                },
                drive_token: drive_token.map(|t| t.to_string()),
            }
        }
    }

    #[async_trait::async_trait]
    impl IdentityProvider for ScriptedProvider {
        async fn sign_in_with_google(&self) -> Result<SignInOutcome> {
            Ok(Self::outcome(Some("drive-token-1")))
        }

        async fn sign_in_with_email(&self, _email: &str, _password: &str) -> Result<SignInOutcome> {
            Ok(Self::outcome(None))
        }

        async fn sign_up_with_email(&self, _email: &str, _password: &str) -> Result<SignInOutcome> {
            Ok(Self::outcome(None))
        }

        async fn refresh_credential(
            &self,
            current: &SessionCredential,
        ) -> Result<SessionCredential> {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_refresh.load(Ordering::SeqCst) {
                return Err(LetterpadError::session_expired("refresh rejected"));
            }
            Ok(SessionCredential {
                user: current.user.clone(),
                id_token: "id-token-refreshed".to_string(),
                refresh_token: "refresh-2".to_string(),
            })
        }

        async fn acquire_drive_token(&self) -> Result<String> {
            let n = self.drive_acquires.fetch_add(1, Ordering::SeqCst);
            Ok(format!("drive-token-{}", n + 1))
        }
    }

    #[derive(Default)]
    struct MemoryStorage {
        values: StdMutex<HashMap<&'static str, String>>,
    }

    #[async_trait::async_trait]
    impl KeyValueStorage for MemoryStorage {
        async fn get(&self, key: StorageKey) -> Result<Option<String>> {
            Ok(self.values.lock().unwrap().get(key.as_str()).cloned())
        }

        async fn set(&self, key: StorageKey, value: &str) -> Result<()> {
            self.values
                .lock()
                .unwrap()
                .insert(key.as_str(), value.to_string());
            Ok(())
        }

        async fn remove(&self, key: StorageKey) -> Result<()> {
            self.values.lock().unwrap().remove(key.as_str());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        notices: StdMutex<Vec<Notice>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notice: Notice) {
            self.notices.lock().unwrap().push(notice);
        }
    }

    fn service(
        provider: Arc<ScriptedProvider>,
        storage: Arc<MemoryStorage>,
        notifier: Arc<RecordingNotifier>,
    ) -> Arc<SessionService> {
        Arc::new(SessionService::new(provider, storage, notifier))
    }

    #[tokio::test]
    async fn test_refresh_without_session_is_noop() {
        let provider = ScriptedProvider::new();
        let session = service(
            provider.clone(),
            Arc::new(MemoryStorage::default()),
            Arc::new(RecordingNotifier::default()),
        );

        session.refresh_credential().await.unwrap();
        assert_eq!(provider.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_google_sign_in_mirrors_both_tokens() {
        let storage = Arc::new(MemoryStorage::default());
        let session = service(
            ScriptedProvider::new(),
            storage.clone(),
            Arc::new(RecordingNotifier::default()),
        );

        session.sign_in_with_google().await.unwrap();
        assert_eq!(
            storage.get(StorageKey::IdToken).await.unwrap().as_deref(),
            Some("id-token-1")
        );
        assert_eq!(
            storage.get(StorageKey::DriveToken).await.unwrap().as_deref(),
            Some("drive-token-1")
        );
        assert!(session.identity().await.is_some());
    }

    #[tokio::test]
    async fn test_email_sign_in_leaves_drive_token_absent() {
        let storage = Arc::new(MemoryStorage::default());
        let session = service(
            ScriptedProvider::new(),
            storage.clone(),
            Arc::new(RecordingNotifier::default()),
        );

        session.sign_in("a@example.com", "secret").await.unwrap();
        assert!(storage.get(StorageKey::DriveToken).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_updates_credential_and_storage() {
        let storage = Arc::new(MemoryStorage::default());
        let session = service(
            ScriptedProvider::new(),
            storage.clone(),
            Arc::new(RecordingNotifier::default()),
        );

        session.sign_in("a@example.com", "secret").await.unwrap();
        session.refresh_credential().await.unwrap();

        assert_eq!(session.id_token().await.unwrap(), "id-token-refreshed");
        assert_eq!(
            storage.get(StorageKey::IdToken).await.unwrap().as_deref(),
            Some("id-token-refreshed")
        );
    }

    #[tokio::test]
    async fn test_rejected_refresh_terminates_session() {
        let provider = ScriptedProvider::new();
        let storage = Arc::new(MemoryStorage::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let session = service(provider.clone(), storage.clone(), notifier.clone());

        session.sign_in_with_google().await.unwrap();
        provider.fail_refresh.store(true, Ordering::SeqCst);

        let err = session.refresh_credential().await.unwrap_err();
        assert!(err.is_session_expired());
        assert!(session.credential().await.is_none());
        assert!(storage.get(StorageKey::IdToken).await.unwrap().is_none());
        assert!(storage.get(StorageKey::DriveToken).await.unwrap().is_none());
        assert!(notifier
            .notices
            .lock()
            .unwrap()
            .iter()
            .any(|n| n.level == NoticeLevel::Error));
    }

    #[tokio::test]
    async fn test_drive_token_acquired_once_then_cached() {
        let provider = ScriptedProvider::new();
        let session = service(
            provider.clone(),
            Arc::new(MemoryStorage::default()),
            Arc::new(RecordingNotifier::default()),
        );

        let first = session.drive_token().await.unwrap();
        let second = session.drive_token().await.unwrap();
        assert_eq!(first, "drive-token-1");
        assert_eq!(second, "drive-token-1");
        assert_eq!(provider.drive_acquires.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidated_drive_token_reacquired() {
        let provider = ScriptedProvider::new();
        let session = service(
            provider.clone(),
            Arc::new(MemoryStorage::default()),
            Arc::new(RecordingNotifier::default()),
        );

        let first = session.drive_token().await.unwrap();
        session.invalidate_drive_token().await.unwrap();
        let second = session.drive_token().await.unwrap();
        assert_ne!(first, second);
        assert_eq!(provider.drive_acquires.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_restore_rehydrates_token_without_identity() {
        let storage = Arc::new(MemoryStorage::default());
        storage.set(StorageKey::IdToken, "stored-token").await.unwrap();
        let session = service(
            ScriptedProvider::new(),
            storage,
            Arc::new(RecordingNotifier::default()),
        );

        session.restore().await.unwrap();
        assert_eq!(session.id_token().await.unwrap(), "stored-token");
        assert!(session.identity().await.is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_tokens() {
        let storage = Arc::new(MemoryStorage::default());
        let session = service(
            ScriptedProvider::new(),
            storage.clone(),
            Arc::new(RecordingNotifier::default()),
        );

        session.sign_in_with_google().await.unwrap();
        session.logout().await.unwrap();

        assert!(session.credential().await.is_none());
        assert!(storage.get(StorageKey::IdToken).await.unwrap().is_none());
        assert!(storage.get(StorageKey::DriveToken).await.unwrap().is_none());
        assert!(session.id_token().await.is_err());
    }

    #[tokio::test]
    async fn test_scheduler_refreshes_and_stops_on_logout() {
        let provider = ScriptedProvider::new();
        let session = service(
            provider.clone(),
            Arc::new(MemoryStorage::default()),
            Arc::new(RecordingNotifier::default()),
        );

        session.sign_in("a@example.com", "secret").await.unwrap();
        session.spawn_refresh_task(Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(150)).await;
        let refreshed = provider.refresh_calls.load(Ordering::SeqCst);
        assert!(refreshed >= 2, "expected at least two refreshes, got {refreshed}");

        session.logout().await.unwrap();
        let after_logout = provider.refresh_calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(provider.refresh_calls.load(Ordering::SeqCst), after_logout);
    }
}

//! REST identity provider client.
//!
//! Talks to a Firebase-style auth surface: password sign-in/sign-up and an
//! IdP-credential sign-in on the auth endpoint, refresh-token exchange on
//! the secure-token endpoint, and an OAuth offline exchange for the
//! drive-scoped access token. The browser original acquired the drive token
//! through a consent popup; headless, the one-time consent grant leaves an
//! offline refresh token behind and this client exchanges it on demand.

use crate::config::IdentityConfig;
use letterpad_core::error::{LetterpadError, Result};
use letterpad_core::session::{
    IdentityProvider, SessionCredential, SignInOutcome, UserIdentity,
};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

/// [`IdentityProvider`] backed by the provider's REST endpoints.
#[derive(Clone)]
pub struct RestIdentityProvider {
    http: Client,
    config: IdentityConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpSignInRequest<'a> {
    post_body: &'a str,
    request_uri: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    id_token: String,
    refresh_token: String,
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

impl AuthResponse {
    fn into_credential(self) -> SessionCredential {
        SessionCredential {
            user: UserIdentity {
                uid: self.local_id,
                email: self.email,
                display_name: self.display_name,
            },
            id_token: self.id_token,
            refresh_token: self.refresh_token,
        }
    }
}

#[derive(Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
}

#[derive(Deserialize)]
struct OauthTokenResponse {
    access_token: String,
}

impl RestIdentityProvider {
    pub fn new(config: IdentityConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    fn auth_url(&self, operation: &str) -> String {
        format!(
            "{}/accounts:{operation}?key={}",
            self.config.auth_base_url, self.config.api_key
        )
    }

    async fn sign_in_password_flow(&self, operation: &str, email: &str, password: &str) -> Result<SignInOutcome> {
        let response = self
            .http
            .post(self.auth_url(operation))
            .json(&PasswordRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await?;
        let response = reject_auth_failure(response, "sign-in rejected").await?;
        let auth: AuthResponse = response.json().await?;
        Ok(SignInOutcome {
            credential: auth.into_credential(),
            drive_token: None,
        })
    }

    /// Exchanges the configured offline refresh token for a drive-scoped
    /// access token.
    async fn exchange_drive_token(&self) -> Result<String> {
        let client_id = self
            .config
            .oauth_client_id
            .as_deref()
            .ok_or_else(|| LetterpadError::config("missing oauth_client_id"))?;
        let client_secret = self
            .config
            .oauth_client_secret
            .as_deref()
            .ok_or_else(|| LetterpadError::config("missing oauth_client_secret"))?;
        let refresh_token = self
            .config
            .google_refresh_token
            .as_deref()
            .ok_or_else(|| LetterpadError::config("missing google_refresh_token"))?;

        let response = self
            .http
            .post(&self.config.oauth_token_url)
            .form(&[
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;
        let response = reject_auth_failure(response, "drive token exchange rejected").await?;
        let token: OauthTokenResponse = response.json().await?;
        Ok(token.access_token)
    }
}

/// Maps a failed auth endpoint response to the error taxonomy: 4xx means the
/// credential was rejected, anything else is transport-level.
async fn reject_auth_failure(response: Response, context: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    if status.is_client_error() {
        Err(LetterpadError::auth_expired(format!(
            "{context}: {status} {body}"
        )))
    } else {
        Err(LetterpadError::remote_io(format!(
            "{context}: {status} {body}"
        )))
    }
}

#[async_trait::async_trait]
impl IdentityProvider for RestIdentityProvider {
    async fn sign_in_with_google(&self) -> Result<SignInOutcome> {
        let access_token = self.exchange_drive_token().await?;

        let post_body = format!("access_token={access_token}&providerId=google.com");
        let response = self
            .http
            .post(self.auth_url("signInWithIdp"))
            .json(&IdpSignInRequest {
                post_body: &post_body,
                request_uri: "http://localhost",
                return_secure_token: true,
            })
            .send()
            .await?;
        let response = reject_auth_failure(response, "provider sign-in rejected").await?;
        let auth: AuthResponse = response.json().await?;

        tracing::info!(uid = %auth.local_id, "signed in with google");
        Ok(SignInOutcome {
            credential: auth.into_credential(),
            drive_token: Some(access_token),
        })
    }

    async fn sign_in_with_email(&self, email: &str, password: &str) -> Result<SignInOutcome> {
        self.sign_in_password_flow("signInWithPassword", email, password)
            .await
    }

    async fn sign_up_with_email(&self, email: &str, password: &str) -> Result<SignInOutcome> {
        self.sign_in_password_flow("signUp", email, password).await
    }

    async fn refresh_credential(&self, current: &SessionCredential) -> Result<SessionCredential> {
        let url = format!(
            "{}/token?key={}",
            self.config.token_base_url, self.config.api_key
        );
        let response = self
            .http
            .post(url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", current.refresh_token.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Server hiccups are still fatal here: the caller tears the
            // session down either way, so everything maps to SessionExpired.
            if status.is_server_error() {
                tracing::warn!(%status, "token refresh failed server-side");
            }
            return Err(LetterpadError::session_expired(format!(
                "token refresh rejected: {status} {body}"
            )));
        }

        let refreshed: RefreshResponse = response.json().await?;
        Ok(SessionCredential {
            user: current.user.clone(),
            id_token: refreshed.id_token,
            refresh_token: refreshed.refresh_token,
        })
    }

    async fn acquire_drive_token(&self) -> Result<String> {
        self.exchange_drive_token().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Form, Json, Query, State};
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::Router;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct ServerState {
        refresh_calls: AtomicUsize,
    }

    async fn sign_in_handler(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if body["password"] == "secret" {
            (
                StatusCode::OK,
                Json(json!({
                    "idToken": "id-token-1",
                    "refreshToken": "refresh-1",
                    "localId": "user-1",
                    "email": "a@example.com",
                    "displayName": "Alice"
                })),
            )
        } else {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": {"message": "INVALID_PASSWORD"}})),
            )
        }
    }

    async fn refresh_handler(
        State(state): State<Arc<ServerState>>,
        Form(form): Form<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        state.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if form.get("refresh_token").map(String::as_str) == Some("refresh-1") {
            (
                StatusCode::OK,
                Json(json!({
                    "id_token": "id-token-2",
                    "refresh_token": "refresh-2",
                    "user_id": "user-1"
                })),
            )
        } else {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "invalid_grant"})),
            )
        }
    }

    async fn oauth_handler(
        Form(form): Form<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        if form.get("refresh_token").map(String::as_str) == Some("offline-token") {
            (
                StatusCode::OK,
                Json(json!({"access_token": "drive-access-1", "expires_in": 3599})),
            )
        } else {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "invalid_grant"})),
            )
        }
    }

    async fn spawn_server() -> (SocketAddr, Arc<ServerState>) {
        let state = Arc::new(ServerState::default());
        // The `Query` extractor keeps the ?key= suffix from 404-ing.
        let app = Router::new()
            .route(
                "/v1/accounts:signInWithPassword",
                post(|_q: Query<HashMap<String, String>>, body: Json<Value>| sign_in_handler(body)),
            )
            .route(
                "/v1/accounts:signUp",
                post(|_q: Query<HashMap<String, String>>, body: Json<Value>| sign_in_handler(body)),
            )
            .route(
                "/securetoken/token",
                post(
                    |state: State<Arc<ServerState>>,
                     _q: Query<HashMap<String, String>>,
                     form: Form<HashMap<String, String>>| refresh_handler(state, form),
                ),
            )
            .route("/oauth/token", post(oauth_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (addr, state)
    }

    fn test_config(addr: SocketAddr) -> IdentityConfig {
        IdentityConfig {
            api_key: "test-key".to_string(),
            auth_base_url: format!("http://{addr}/v1"),
            token_base_url: format!("http://{addr}/securetoken"),
            oauth_token_url: format!("http://{addr}/oauth/token"),
            oauth_client_id: Some("client-1".to_string()),
            oauth_client_secret: Some("secret-1".to_string()),
            google_refresh_token: Some("offline-token".to_string()),
        }
    }

    #[tokio::test]
    async fn test_password_sign_in() {
        let (addr, _state) = spawn_server().await;
        let provider = RestIdentityProvider::new(test_config(addr));

        let outcome = provider
            .sign_in_with_email("a@example.com", "secret")
            .await
            .unwrap();
        assert_eq!(outcome.credential.user.uid, "user-1");
        assert_eq!(outcome.credential.id_token, "id-token-1");
        assert!(outcome.drive_token.is_none());
    }

    #[tokio::test]
    async fn test_invalid_password_is_auth_expired() {
        let (addr, _state) = spawn_server().await;
        let provider = RestIdentityProvider::new(test_config(addr));

        let err = provider
            .sign_in_with_email("a@example.com", "wrong")
            .await
            .unwrap_err();
        assert!(err.is_auth_expired());
    }

    #[tokio::test]
    async fn test_refresh_credential() {
        let (addr, state) = spawn_server().await;
        let provider = RestIdentityProvider::new(test_config(addr));

        let current = SessionCredential {
            user: UserIdentity {
                uid: "user-1".to_string(),
                email: Some("a@example.com".to_string()),
                display_name: None,
            },
            id_token: "id-token-1".to_string(),
            refresh_token: "refresh-1".to_string(),
        };
        let refreshed = provider.refresh_credential(&current).await.unwrap();
        assert_eq!(refreshed.id_token, "id-token-2");
        assert_eq!(refreshed.refresh_token, "refresh-2");
        assert_eq!(refreshed.user, current.user);
        assert_eq!(state.refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejected_refresh_is_session_expired() {
        let (addr, _state) = spawn_server().await;
        let provider = RestIdentityProvider::new(test_config(addr));

        let current = SessionCredential {
            user: UserIdentity {
                uid: "user-1".to_string(),
                email: None,
                display_name: None,
            },
            id_token: "stale".to_string(),
            refresh_token: "revoked".to_string(),
        };
        let err = provider.refresh_credential(&current).await.unwrap_err();
        assert!(err.is_session_expired());
    }

    #[tokio::test]
    async fn test_acquire_drive_token() {
        let (addr, _state) = spawn_server().await;
        let provider = RestIdentityProvider::new(test_config(addr));

        let token = provider.acquire_drive_token().await.unwrap();
        assert_eq!(token, "drive-access-1");
    }

    #[tokio::test]
    async fn test_missing_oauth_config_is_config_error() {
        let (addr, _state) = spawn_server().await;
        let mut config = test_config(addr);
        config.google_refresh_token = None;
        let provider = RestIdentityProvider::new(config);

        let err = provider.acquire_drive_token().await.unwrap_err();
        assert!(matches!(err, LetterpadError::Config(_)));
    }
}

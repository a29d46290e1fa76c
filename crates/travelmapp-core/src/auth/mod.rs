//! Traveller accounts backed by Supabase email/password auth.
//!
//! [`SupabaseAuthClient`] signs travellers up and in and keeps the result in
//! a [`SupabaseSession`] handle, which the place repository reads to decide
//! who owns new places. Sessions are handed to a [`SessionPersistence`] so a
//! later process can pick them up again with
//! [`SupabaseAuthClient::restore_session`].

mod session;
mod token;

use std::fmt;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::{parse_api_error, supabase_endpoint, unix_seconds_now};

pub use session::SupabaseSession;
use token::{Credentials, TokenGrant, TokenReply};

const AUTH_SERVICE_PATH: &str = "auth/v1";
/// Sessions this close to expiry are treated as expired.
const EXPIRY_MARGIN_SECONDS: i64 = 60;

/// The signed-in traveller as Supabase reports them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds
    pub expires_at: i64,
    pub user: AuthUser,
}

impl AuthSession {
    /// Seconds until the access token lapses, negative once it has.
    pub fn seconds_left(&self) -> i64 {
        self.expires_at.saturating_sub(unix_seconds_now())
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.seconds_left() <= EXPIRY_MARGIN_SECONDS
    }
}

// Tokens stay out of logs.
impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("user", &self.user)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    SignedIn(AuthSession),
    /// The account exists but the emailed link must be followed before signing in.
    ConfirmationRequired,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid auth setup: {0}")]
    Config(&'static str),
    /// Input refused locally or by the auth server.
    #[error("{0}")]
    Rejected(String),
    #[error("Auth request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unreadable auth payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Secure storage error: {0}")]
    SecureStorage(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Storage that outlives the process, such as the OS keychain.
pub trait SessionPersistence: Clone + Send + Sync + 'static {
    fn load_session(&self) -> AuthResult<Option<AuthSession>>;
    fn save_session(&self, session: &AuthSession) -> AuthResult<()>;
    fn clear_session(&self) -> AuthResult<()>;
}

/// Supabase auth for one project.
///
/// Whatever session the client ends up with is written through `S` and
/// published on the handle from [`SupabaseAuthClient::session`].
#[derive(Clone)]
pub struct SupabaseAuthClient<S: SessionPersistence> {
    endpoint: String,
    anon_key: String,
    http: Client,
    persistence: S,
    live: SupabaseSession,
}

impl<S: SessionPersistence> SupabaseAuthClient<S> {
    pub fn new(
        project_url: impl AsRef<str>,
        anon_key: impl Into<String>,
        persistence: S,
    ) -> AuthResult<Self> {
        let endpoint =
            supabase_endpoint(project_url.as_ref(), AUTH_SERVICE_PATH).map_err(AuthError::Config)?;
        let anon_key = anon_key.into().trim().to_string();
        if anon_key.is_empty() {
            return Err(AuthError::Config("Supabase anon key must not be empty"));
        }

        Ok(Self {
            endpoint,
            anon_key,
            http: Client::builder().build()?,
            persistence,
            live: SupabaseSession::default(),
        })
    }

    /// Handle that follows this client's sign-ins and sign-outs.
    #[must_use]
    pub fn session(&self) -> SupabaseSession {
        self.live.clone()
    }

    /// Pick up the persisted session, refreshing it when it has expired.
    ///
    /// A session that can no longer be refreshed is discarded and the client
    /// ends up signed out.
    pub async fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        let Some(stored) = self.persistence.load_session()? else {
            self.live.clear();
            return Ok(None);
        };
        if !stored.is_expired() {
            self.live.set(stored.clone());
            return Ok(Some(stored));
        }

        tracing::debug!("Stored session of {} expired, refreshing", stored.user.id);
        match self.refresh_session(&stored.refresh_token).await {
            Ok(fresh) => Ok(Some(fresh)),
            Err(error) => {
                tracing::warn!("Discarding stored session of {}: {}", stored.user.id, error);
                self.adopt(None)?;
                Ok(None)
            }
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpOutcome> {
        let credentials = Credentials::new(email, password)?;
        let reply = self.post_for_reply("signup", None, &credentials).await?;

        match reply.into_session()? {
            Some(session) => {
                self.adopt(Some(&session))?;
                Ok(SignUpOutcome::SignedIn(session))
            }
            None => {
                tracing::debug!("Sign-up of {} awaits email confirmation", email.trim());
                Ok(SignUpOutcome::ConfirmationRequired)
            }
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        self.exchange(TokenGrant::Password(Credentials::new(email, password)?))
            .await
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> AuthResult<AuthSession> {
        self.exchange(TokenGrant::refresh(refresh_token)?).await
    }

    /// Revoke `access_token` and forget the local session.
    ///
    /// A 401 means the token was already dead, which is just as signed out.
    pub async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        let response = self
            .http
            .post(format!("{}/logout", self.endpoint))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() && status != StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected(parse_api_error(status, &body)));
        }
        self.adopt(None)
    }

    async fn exchange(&self, grant: TokenGrant<'_>) -> AuthResult<AuthSession> {
        let grant_type = grant.grant_type();
        let session = self
            .post_for_reply("token", Some(grant_type), &grant)
            .await?
            .into_session()?
            .ok_or_else(|| {
                AuthError::Rejected(format!("No session issued for the {grant_type} grant"))
            })?;

        self.adopt(Some(&session))?;
        Ok(session)
    }

    async fn post_for_reply<B: Serialize + ?Sized>(
        &self,
        path: &str,
        grant_type: Option<&str>,
        body: &B,
    ) -> AuthResult<TokenReply> {
        let mut request = self
            .http
            .post(format!("{}/{path}", self.endpoint))
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .json(body);
        if let Some(grant_type) = grant_type {
            request = request.query(&[("grant_type", grant_type)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected(parse_api_error(status, &body)));
        }
        Ok(response.json().await?)
    }

    /// Make `session` the current one everywhere, or sign out on `None`.
    fn adopt(&self, session: Option<&AuthSession>) -> AuthResult<()> {
        match session {
            Some(session) => {
                self.persistence.save_session(session)?;
                self.live.set(session.clone());
            }
            None => {
                self.live.clear();
                self.persistence.clear_session()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::session::SessionProvider;

    /// Persistence that keeps the session in memory.
    #[derive(Clone, Default)]
    struct Vault {
        slot: Arc<Mutex<Option<AuthSession>>>,
    }

    impl SessionPersistence for Vault {
        fn load_session(&self) -> AuthResult<Option<AuthSession>> {
            Ok(self.slot.lock().unwrap().clone())
        }

        fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
            *self.slot.lock().unwrap() = Some(session.clone());
            Ok(())
        }

        fn clear_session(&self) -> AuthResult<()> {
            self.slot.lock().unwrap().take();
            Ok(())
        }
    }

    fn traveller_session(expires_at: i64) -> AuthSession {
        AuthSession {
            access_token: "secret-access-token".to_string(),
            refresh_token: "secret-refresh-token".to_string(),
            expires_at,
            user: AuthUser {
                id: "u1".to_string(),
                email: Some("ana@example.com".to_string()),
            },
        }
    }

    fn client(vault: Vault) -> SupabaseAuthClient<Vault> {
        SupabaseAuthClient::new("https://demo.supabase.co", "anon", vault).unwrap()
    }

    #[test]
    fn client_targets_the_auth_service() {
        assert_eq!(client(Vault::default()).endpoint, "https://demo.supabase.co/auth/v1");

        let already_scoped =
            SupabaseAuthClient::new("https://demo.supabase.co/auth/v1/", "anon", Vault::default())
                .unwrap();
        assert_eq!(already_scoped.endpoint, "https://demo.supabase.co/auth/v1");
    }

    #[test]
    fn bad_setup_is_rejected() {
        assert!(matches!(
            SupabaseAuthClient::new("https://demo.supabase.co", " ", Vault::default()),
            Err(AuthError::Config(_))
        ));
        assert!(matches!(
            SupabaseAuthClient::new("demo.supabase.co", "anon", Vault::default()),
            Err(AuthError::Config(_))
        ));
    }

    #[test]
    fn expiry_includes_margin() {
        let now = unix_seconds_now();
        assert!(traveller_session(now - 1).is_expired());
        assert!(traveller_session(now + EXPIRY_MARGIN_SECONDS / 2).is_expired());
        assert!(!traveller_session(now + 3600).is_expired());
        assert!(traveller_session(now + 3600).seconds_left() > 3500);
    }

    #[test]
    fn debug_output_hides_tokens() {
        let rendered = format!("{:?}", traveller_session(1_700_000_000));
        assert!(!rendered.contains("secret-access-token"));
        assert!(!rendered.contains("secret-refresh-token"));
        assert!(rendered.contains("ana@example.com"));
    }

    #[tokio::test]
    async fn blank_credentials_fail_before_any_request() {
        let vault = Vault::default();
        let client = client(vault.clone());

        let error = client.sign_in("   ", "pw").await.unwrap_err();
        assert_eq!(error.to_string(), "Email is required");
        assert!(client.sign_up("ana@example.com", "").await.is_err());
        assert!(vault.load_session().unwrap().is_none());
    }

    #[tokio::test]
    async fn restore_publishes_live_stored_session() {
        let vault = Vault::default();
        vault
            .save_session(&traveller_session(unix_seconds_now() + 3600))
            .unwrap();
        let client = client(vault);

        let restored = client.restore_session().await.unwrap();

        assert_eq!(restored.map(|session| session.user.id), Some("u1".to_string()));
        assert_eq!(
            client.session().current_user_id().map(|user| user.to_string()),
            Some("u1".to_string())
        );
    }

    #[tokio::test]
    async fn restore_with_empty_vault_signs_out() {
        let client = client(Vault::default());
        client.live.set(traveller_session(unix_seconds_now() + 3600));

        assert!(client.restore_session().await.unwrap().is_none());
        assert!(!client.session().is_signed_in());
    }

    #[tokio::test]
    async fn restore_drops_session_that_cannot_be_refreshed() {
        let vault = Vault::default();
        let mut expired = traveller_session(unix_seconds_now() - 10);
        expired.refresh_token = "  ".to_string();
        vault.save_session(&expired).unwrap();
        let client = client(vault.clone());

        assert!(client.restore_session().await.unwrap().is_none());
        assert!(vault.load_session().unwrap().is_none());
        assert!(client.session().snapshot().is_none());
    }
}

//! Supabase session handling for the CLI, persisted in the OS keychain.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

#[cfg(not(test))]
use keyring::Entry;

use travelmapp_core::auth::{
    AuthResult, SessionPersistence, SignUpOutcome, SupabaseAuthClient, SupabaseSession,
};
pub use travelmapp_core::auth::{AuthError, AuthSession};
use travelmapp_core::ClientConfig;

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "travelmapp-cli";

/// Keychain slot holding the serialized session of one Supabase project.
#[derive(Clone)]
struct SessionStore {
    username: String,
}

impl SessionStore {
    fn new(supabase_url: &str) -> Self {
        Self {
            username: format!("supabase_session:{}", supabase_url.trim_end_matches('/')),
        }
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(not(test))]
    fn entry(&self) -> AuthResult<Entry> {
        Entry::new(KEYRING_SERVICE_NAME, &self.username)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))
    }
}

impl SessionPersistence for SessionStore {
    #[cfg(not(test))]
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        match self.entry()?.get_password() {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        let guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        guard
            .get(&self.username)
            .map(|raw| serde_json::from_str(raw))
            .transpose()
            .map_err(AuthError::from)
    }

    #[cfg(not(test))]
    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        self.entry()?
            .set_password(&raw)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))
    }

    #[cfg(test)]
    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        let raw = serde_json::to_string(session)?;
        Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?
            .insert(self.username.clone(), raw);
        Ok(())
    }

    #[cfg(not(test))]
    fn clear_session(&self) -> AuthResult<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(test)]
    fn clear_session(&self) -> AuthResult<()> {
        Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?
            .remove(&self.username);
        Ok(())
    }
}

#[derive(Clone)]
pub struct SupabaseAuthService {
    inner: SupabaseAuthClient<SessionStore>,
    store: SessionStore,
}

impl SupabaseAuthService {
    pub fn from_config(config: &ClientConfig) -> AuthResult<Self> {
        let store = SessionStore::new(&config.supabase_url);
        Ok(Self {
            inner: SupabaseAuthClient::new(
                &config.supabase_url,
                config.supabase_anon_key.clone(),
                store.clone(),
            )?,
            store,
        })
    }

    /// Live session shared with the place repository.
    pub fn session(&self) -> SupabaseSession {
        self.inner.session()
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpOutcome> {
        self.inner.sign_up(email, password).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        self.inner.sign_in(email, password).await
    }

    pub async fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        self.inner.restore_session().await
    }

    pub async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        self.inner.sign_out(access_token).await
    }

    pub fn stored_session(&self) -> AuthResult<Option<AuthSession>> {
        self.store.load_session()
    }

    pub fn clear_stored_session(&self) -> AuthResult<()> {
        self.store.clear_session()
    }
}

#[cfg(test)]
mod tests {
    use travelmapp_core::auth::AuthUser;

    use super::*;

    fn config(url: &str) -> ClientConfig {
        ClientConfig {
            supabase_url: url.to_string(),
            supabase_anon_key: "anon".to_string(),
            places_collection: "places".to_string(),
            r2: None,
        }
    }

    fn session() -> AuthSession {
        AuthSession {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: 1_700_000_000,
            user: AuthUser {
                id: "u1".to_string(),
                email: Some("u1@example.com".to_string()),
            },
        }
    }

    #[test]
    fn session_store_is_keyed_by_project() {
        let first = SessionStore::new("https://one.supabase.co/");
        let second = SessionStore::new("https://two.supabase.co");
        assert_eq!(first.username, "supabase_session:https://one.supabase.co");

        first.save_session(&session()).unwrap();
        assert!(second.load_session().unwrap().is_none());
        assert_eq!(first.load_session().unwrap(), Some(session()));

        first.clear_session().unwrap();
        assert!(first.load_session().unwrap().is_none());
    }

    #[test]
    fn service_reads_and_clears_stored_session() {
        let service = SupabaseAuthService::from_config(&config("https://svc.supabase.co")).unwrap();
        SessionStore::new("https://svc.supabase.co")
            .save_session(&session())
            .unwrap();

        assert!(service.stored_session().unwrap().is_some());
        service.clear_stored_session().unwrap();
        assert!(service.stored_session().unwrap().is_none());
        assert!(!service.session().is_signed_in());
    }
}

//! Shared handle on the signed-in Supabase session.

use std::sync::{Arc, RwLock};

use super::{AuthSession, AuthUser};
use crate::models::UserId;
use crate::session::SessionProvider;

/// Shared, live handle on the current Supabase session.
///
/// Clones observe the same session, so a handle given to the place
/// repository sees sign-in and sign-out performed through the auth client.
#[derive(Debug, Clone, Default)]
pub struct SupabaseSession {
    inner: Arc<RwLock<Option<AuthSession>>>,
}

impl SupabaseSession {
    pub fn new(session: Option<AuthSession>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(session)),
        }
    }

    pub fn set(&self, session: AuthSession) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = Some(session);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = None;
        }
    }

    /// The stored session, even if it has expired.
    pub fn snapshot(&self) -> Option<AuthSession> {
        self.inner.read().ok().and_then(|guard| guard.clone())
    }

    fn active(&self) -> Option<AuthSession> {
        self.snapshot().filter(|session| !session.is_expired())
    }

    pub fn user(&self) -> Option<AuthUser> {
        self.active().map(|session| session.user)
    }

    pub fn is_signed_in(&self) -> bool {
        self.active().is_some()
    }
}

impl SessionProvider for SupabaseSession {
    fn current_user_id(&self) -> Option<UserId> {
        self.user()
            .map(|user| UserId::new(user.id))
            .filter(|user| !user.is_empty())
    }

    fn access_token(&self) -> Option<String> {
        self.active().map(|session| session.access_token)
    }
}

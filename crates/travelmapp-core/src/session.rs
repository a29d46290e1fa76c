//! Identity of the signed-in user, as seen by the access layer.

use std::sync::RwLock;

use crate::models::UserId;

/// Source of the current user's identity.
///
/// `current_user_id` is consulted at the start of every write-class
/// operation, so implementations must reflect sign-in and sign-out
/// immediately.
pub trait SessionProvider: Send + Sync {
    /// Identifier of the signed-in user, `None` when nobody is signed in.
    fn current_user_id(&self) -> Option<UserId>;

    /// Bearer token for remote services acting on the user's behalf.
    fn access_token(&self) -> Option<String> {
        None
    }
}

/// Session whose user is set explicitly. Used by tests and local tools.
#[derive(Debug, Default)]
pub struct StaticSession {
    user: RwLock<Option<UserId>>,
}

impl StaticSession {
    /// A session with nobody signed in.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(user: impl Into<UserId>) -> Self {
        Self {
            user: RwLock::new(Some(user.into())),
        }
    }

    pub fn sign_in(&self, user: impl Into<UserId>) {
        if let Ok(mut guard) = self.user.write() {
            *guard = Some(user.into());
        }
    }

    pub fn sign_out(&self) {
        if let Ok(mut guard) = self.user.write() {
            *guard = None;
        }
    }
}

impl SessionProvider for StaticSession {
    fn current_user_id(&self) -> Option<UserId> {
        self.user
            .read()
            .ok()
            .and_then(|guard| guard.clone())
            .filter(|user| !user.is_empty())
    }
}

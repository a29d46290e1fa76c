//! Bodies exchanged with the Supabase `/signup` and `/token` endpoints.

use serde::{Deserialize, Serialize};

use super::{AuthError, AuthResult, AuthSession, AuthUser};
use crate::util::unix_seconds_now;

/// Email and password as typed by the traveller.
#[derive(Debug, Serialize)]
pub(super) struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

impl<'a> Credentials<'a> {
    /// The email is trimmed; the password is sent as typed but may not be blank.
    pub(super) fn new(email: &'a str, password: &'a str) -> AuthResult<Self> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AuthError::Rejected("Email is required".to_string()));
        }
        if password.trim().is_empty() {
            return Err(AuthError::Rejected("Password is required".to_string()));
        }
        Ok(Self { email, password })
    }
}

/// Body of a `POST /token?grant_type=...` request.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(super) enum TokenGrant<'a> {
    Password(Credentials<'a>),
    Refresh { refresh_token: &'a str },
}

impl<'a> TokenGrant<'a> {
    pub(super) fn refresh(refresh_token: &'a str) -> AuthResult<Self> {
        let refresh_token = refresh_token.trim();
        if refresh_token.is_empty() {
            return Err(AuthError::Config("Refresh token must not be empty"));
        }
        Ok(Self::Refresh { refresh_token })
    }

    /// Value of the `grant_type` query parameter.
    pub(super) const fn grant_type(&self) -> &'static str {
        match self {
            Self::Password(_) => "password",
            Self::Refresh { .. } => "refresh_token",
        }
    }
}

/// What `/signup` and `/token` answer with.
///
/// A sign-up that still needs email confirmation answers with the new user
/// and no tokens at all.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct TokenReply {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    user: Option<AuthUser>,
}

impl TokenReply {
    /// `Ok(None)` when no session was issued; an error when one was issued
    /// but is missing parts.
    pub(super) fn into_session(self) -> AuthResult<Option<AuthSession>> {
        let Self {
            access_token,
            refresh_token,
            expires_at,
            expires_in,
            user,
        } = self;

        let Some(access_token) = access_token else {
            return Ok(None);
        };
        let expires_at =
            expires_at.or_else(|| expires_in.map(|seconds| unix_seconds_now().saturating_add(seconds)));

        match (refresh_token, expires_at, user) {
            (Some(refresh_token), Some(expires_at), Some(user)) => Ok(Some(AuthSession {
                access_token,
                refresh_token,
                expires_at,
                user,
            })),
            _ => Err(AuthError::Rejected(
                "Supabase returned an incomplete session".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn reply(value: serde_json::Value) -> TokenReply {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn credentials_trim_email_and_require_both_parts() {
        let credentials = Credentials::new("  ana@example.com ", "hunter2").unwrap();
        assert_eq!(
            serde_json::to_value(&credentials).unwrap(),
            json!({"email": "ana@example.com", "password": "hunter2"})
        );

        assert!(matches!(
            Credentials::new(" ", "hunter2"),
            Err(AuthError::Rejected(ref message)) if message == "Email is required"
        ));
        assert!(matches!(
            Credentials::new("ana@example.com", "   "),
            Err(AuthError::Rejected(ref message)) if message == "Password is required"
        ));
    }

    #[test]
    fn grants_serialize_to_token_bodies() {
        let password = TokenGrant::Password(Credentials::new("ana@example.com", "pw").unwrap());
        assert_eq!(password.grant_type(), "password");
        assert_eq!(
            serde_json::to_value(&password).unwrap(),
            json!({"email": "ana@example.com", "password": "pw"})
        );

        let refresh = TokenGrant::refresh(" r-1 ").unwrap();
        assert_eq!(refresh.grant_type(), "refresh_token");
        assert_eq!(
            serde_json::to_value(&refresh).unwrap(),
            json!({"refresh_token": "r-1"})
        );

        assert!(matches!(TokenGrant::refresh(""), Err(AuthError::Config(_))));
    }

    #[test]
    fn reply_without_tokens_issues_no_session() {
        let pending = reply(json!({"id": "u1", "email": "ana@example.com", "confirmation_sent_at": "2024-05-01T10:00:00Z"}));
        assert!(pending.into_session().unwrap().is_none());

        let with_user = reply(json!({"user": {"id": "u1"}}));
        assert!(with_user.into_session().unwrap().is_none());
    }

    #[test]
    fn reply_with_expires_in_gets_absolute_expiry() {
        let session = reply(json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "token_type": "bearer",
            "user": {"id": "u1", "email": "ana@example.com", "role": "authenticated"}
        }))
        .into_session()
        .unwrap()
        .unwrap();

        assert_eq!(session.user.email.as_deref(), Some("ana@example.com"));
        assert!(session.expires_at > unix_seconds_now());
        assert!(!session.is_expired());
    }

    #[test]
    fn explicit_expires_at_wins() {
        let session = reply(json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_at": 1_900_000_000,
            "expires_in": 60,
            "user": {"id": "u1"}
        }))
        .into_session()
        .unwrap()
        .unwrap();
        assert_eq!(session.expires_at, 1_900_000_000);
    }

    #[test]
    fn incomplete_session_is_rejected() {
        let missing_refresh = reply(json!({"access_token": "a", "expires_in": 60, "user": {"id": "u1"}}));
        assert!(matches!(
            missing_refresh.into_session(),
            Err(AuthError::Rejected(_))
        ));

        let missing_user = reply(json!({"access_token": "a", "refresh_token": "r", "expires_in": 60}));
        assert!(missing_user.into_session().is_err());
    }
}

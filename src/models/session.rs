use std::fmt;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// An opaque bearer token issued by the remote API.
///
/// The token is wiped from memory when dropped and never shows up in
/// `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(Zeroizing<String>);

impl SessionToken {
    /// Wraps a raw token.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(Zeroizing::new(raw.into()))
    }

    /// The raw token, for the `Authorization` header and the storage slot.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// The cached user record of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// The remote identifier of the user.
    #[serde(alias = "_id")]
    pub id: String,
    /// The user's display name.
    #[serde(
        rename = "name",
        alias = "displayName",
        alias = "userName",
        alias = "username",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub display_name: Option<String>,
    /// The user's email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl SessionUser {
    /// Creates a user record with only an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            email: None,
        }
    }

    /// The name to show in headers and menus: the display name, else the
    /// part of the email before the `@`.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| {
                self.email
                    .as_deref()
                    .and_then(|email| email.split('@').next())
                    .filter(|local| !local.is_empty())
            })
            .unwrap_or("User")
    }

    /// The first letter of the label, upper-cased, for avatars.
    pub fn initial(&self) -> char {
        self.label()
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('U')
    }
}

/// A snapshot of the local authentication state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// The bearer token, if logged in.
    pub token: Option<SessionToken>,
    /// The cached user record. Only meaningful while `token` is present.
    pub user: Option<SessionUser>,
}

impl Session {
    /// The logged-out session.
    pub fn logged_out() -> Self {
        Self::default()
    }

    /// Whether a token is present.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// The user of this session, ignoring stale records left without a token.
    pub fn current_user(&self) -> Option<&SessionUser> {
        self.token.as_ref().and(self.user.as_ref())
    }

    /// The bearer token, if logged in.
    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_redacted_in_debug() {
        let session = Session {
            token: Some(SessionToken::new("super-secret")),
            user: None,
        };
        let printed = format!("{:?}", session);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("SessionToken(***)"));
    }

    #[test]
    fn stale_user_without_token_is_ignored() {
        let session = Session {
            token: None,
            user: Some(SessionUser::new("u1")),
        };
        assert!(!session.is_authenticated());
        assert!(session.current_user().is_none());
    }

    #[test]
    fn user_accepts_remote_field_names() {
        let user: SessionUser =
            sonic_rs::from_str(r#"{"_id":"u1","name":"Ada","email":"ada@example.com"}"#).unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.label(), "Ada");
        assert_eq!(user.initial(), 'A');
    }

    #[test]
    fn label_falls_back_to_email_local_part() {
        let mut user = SessionUser::new("u1");
        user.email = Some("ada.l@example.com".into());
        assert_eq!(user.label(), "ada.l");
        assert_eq!(user.initial(), 'A');

        user.email = None;
        assert_eq!(user.label(), "User");
    }

    #[test]
    fn username_key_is_a_display_name() {
        let user: SessionUser = sonic_rs::from_str(r#"{"id":"u1","username":"ada"}"#).unwrap();
        assert_eq!(user.label(), "ada");
    }
}

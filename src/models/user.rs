use std::fmt;
use garde::Validate;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::models::session::SessionUser;
use crate::validation::rules::{image_url, not_blank};

/// The credentials submitted by the login form.
#[derive(Serialize, Validate, Zeroize, ZeroizeOnDrop)]
pub struct LoginRequest {
    #[garde(email)]
    pub email: String,
    #[garde(length(chars, min = 6))]
    pub password: String,
}

impl LoginRequest {
    /// Creates a login request, trimming the email.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// The fields submitted by the registration form.
#[derive(Serialize, Validate, Zeroize, ZeroizeOnDrop)]
pub struct RegisterRequest {
    #[garde(custom(not_blank))]
    pub name: String,
    #[garde(email)]
    pub email: String,
    #[garde(length(chars, min = 6))]
    pub password: String,
}

impl RegisterRequest {
    /// Creates a registration request, trimming the name and email.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into().trim().to_string(),
            email: email.into().trim().to_string(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// A text field the remote may send as a string, a number, or something else.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum LenientText {
    Text(String),
    Number(i64),
    Other(IgnoredAny),
}

impl LenientText {
    fn into_text(self) -> Option<String> {
        match self {
            LenientText::Text(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            LenientText::Number(n) => Some(n.to_string()),
            LenientText::Other(_) => None,
        }
    }
}

fn first_text(candidates: impl IntoIterator<Item = Option<LenientText>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find_map(LenientText::into_text)
}

/// A user record as the remote sends it.
///
/// Endpoints and server versions disagree on field names, and some records
/// carry both `id` and `_id`. Every spelling gets its own slot so no shape
/// is rejected; the accessors pick the first usable one.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RemoteUser {
    #[serde(default)]
    id: Option<LenientText>,
    #[serde(rename = "_id", default)]
    mongo_id: Option<LenientText>,
    #[serde(default)]
    name: Option<LenientText>,
    #[serde(rename = "userName", default)]
    user_name: Option<LenientText>,
    #[serde(default)]
    username: Option<LenientText>,
    #[serde(rename = "displayName", default)]
    display_name: Option<LenientText>,
    #[serde(default)]
    email: Option<LenientText>,
    #[serde(rename = "profileImage", default)]
    profile_image: Option<LenientText>,
}

/// A user slot that may hold a record or junk.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum LenientUser {
    User(RemoteUser),
    Other(IgnoredAny),
}

impl LenientUser {
    pub(crate) fn into_user(self) -> Option<RemoteUser> {
        match self {
            LenientUser::User(user) => Some(user),
            LenientUser::Other(_) => None,
        }
    }
}

impl RemoteUser {
    /// Turns the record into a session user.
    ///
    /// `fallback_id` is used when the record names no id; without either,
    /// there is no user.
    pub(crate) fn into_session_user(self, fallback_id: Option<String>) -> Option<SessionUser> {
        let profile = UserProfile::from(self);
        let id = profile.id.or(fallback_id)?;
        Some(SessionUser {
            id,
            display_name: profile.user_name,
            email: profile.email,
        })
    }
}

/// The profile of the logged-in user as reported by the remote API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RemoteUser")]
pub struct UserProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "userName")]
    pub user_name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "profileImage")]
    pub profile_image: Option<String>,
}

impl From<RemoteUser> for UserProfile {
    fn from(user: RemoteUser) -> Self {
        Self {
            id: first_text([user.id, user.mongo_id]),
            user_name: first_text([user.user_name, user.name, user.username, user.display_name]),
            email: first_text([user.email]),
            profile_image: first_text([user.profile_image]),
        }
    }
}

impl UserProfile {
    /// The session user record equivalent to this profile, if it has an id.
    pub fn to_session_user(&self) -> Option<SessionUser> {
        self.id.as_ref().map(|id| SessionUser {
            id: id.clone(),
            display_name: self.user_name.clone(),
            email: self.email.clone(),
        })
    }
}

/// The editable fields of a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
pub struct ProfileUpdate {
    #[serde(rename = "userName")]
    #[garde(length(chars, min = 2, max = 50))]
    pub user_name: String,
    #[serde(rename = "profileImage", skip_serializing_if = "Option::is_none")]
    #[garde(custom(image_url))]
    pub profile_image: Option<String>,
}

impl ProfileUpdate {
    /// Creates a profile update, dropping an empty image URL.
    pub fn new(user_name: impl Into<String>, profile_image: Option<String>) -> Self {
        Self {
            user_name: user_name.into().trim().to_string(),
            profile_image: profile_image
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_rejects_short_password() {
        let request = LoginRequest::new("a@b.com", "12345");
        let report = request.validate().unwrap_err();
        let fields: Vec<String> = report.iter().map(|(path, _)| path.to_string()).collect();
        assert_eq!(fields, vec!["password".to_string()]);
    }

    #[test]
    fn login_accepts_valid_credentials() {
        assert!(LoginRequest::new(" a@b.com ", "secret1").validate().is_ok());
    }

    #[test]
    fn register_requires_name() {
        let request = RegisterRequest::new("   ", "a@b.com", "secret1");
        assert!(request.validate().is_err());
    }

    #[test]
    fn password_never_printed() {
        let request = LoginRequest::new("a@b.com", "hunter22");
        assert!(!format!("{:?}", request).contains("hunter22"));
    }

    #[test]
    fn multibyte_lengths_count_characters() {
        assert!(LoginRequest::new("a@b.com", "пароль").validate().is_ok());
        assert!(LoginRequest::new("a@b.com", "密码密码密").validate().is_err());
        assert!(ProfileUpdate::new("李", None).validate().is_err());
        assert!(ProfileUpdate::new("李".repeat(50), None).validate().is_ok());
        assert!(ProfileUpdate::new("李".repeat(51), None).validate().is_err());
    }

    #[test]
    fn remote_user_accepts_every_id_spelling() {
        let both: RemoteUser =
            sonic_rs::from_str(r#"{"_id":"u1","id":"u1","name":"Ann"}"#).unwrap();
        assert_eq!(both.into_session_user(None).map(|u| u.id), Some("u1".to_string()));

        let numeric: RemoteUser = sonic_rs::from_str(r#"{"id":42,"username":"ann"}"#).unwrap();
        let user = numeric.into_session_user(None).unwrap();
        assert_eq!(user.id, "42");
        assert_eq!(user.display_name.as_deref(), Some("ann"));
    }

    #[test]
    fn remote_user_without_id_uses_fallback() {
        let record: RemoteUser =
            sonic_rs::from_str(r#"{"name":"Ann","email":"a@b.com"}"#).unwrap();
        let user = record.into_session_user(Some("u7".into())).unwrap();
        assert_eq!(user.id, "u7");
        assert_eq!(user.email.as_deref(), Some("a@b.com"));

        let record: RemoteUser = sonic_rs::from_str(r#"{"name":"Ann"}"#).unwrap();
        assert!(record.into_session_user(None).is_none());
    }

    #[test]
    fn junk_user_slot_is_absent() {
        let slot: LenientUser = sonic_rs::from_str(r#""not a user""#).unwrap();
        assert!(slot.into_user().is_none());
    }

    #[test]
    fn profile_reads_any_name_field() {
        let profile: UserProfile =
            sonic_rs::from_str(r#"{"_id":"u1","id":"u1","name":"Ann","profileImage":null}"#).unwrap();
        assert_eq!(profile.id.as_deref(), Some("u1"));
        assert_eq!(profile.user_name.as_deref(), Some("Ann"));
        assert_eq!(profile.profile_image, None);
    }

    #[test]
    fn profile_update_bounds() {
        assert!(ProfileUpdate::new("A", None).validate().is_err());
        assert!(ProfileUpdate::new("Ada", Some("https://x.io/me.png".into())).validate().is_ok());
        assert!(ProfileUpdate::new("Ada", Some("https://x.io/me".into())).validate().is_err());
        assert_eq!(ProfileUpdate::new("Ada", Some("  ".into())).profile_image, None);
    }
}

use crate::{
    error::Result,
    models::session::{Session, SessionToken, SessionUser},
    session::token::claimed_user_id,
    storage::kv::{StorageChanges, StorageContext, StorageOp},
};

/// The storage slot holding the bearer token.
pub const TOKEN_KEY: &str = "token";
/// The storage slot holding the JSON-encoded user record.
pub const USER_KEY: &str = "user";

/// The single source of truth for "is a user logged in".
///
/// A passive store over the `token` and `user` slots of one storage context.
/// It never talks to the network.
#[derive(Clone)]
pub struct SessionStore {
    storage: StorageContext,
}

impl SessionStore {
    /// Creates a store over `storage`.
    pub fn new(storage: StorageContext) -> Self {
        Self { storage }
    }

    /// Persists a token and its user record in one write.
    ///
    /// A `None` user removes any stale record so the two slots always belong
    /// to the same login.
    ///
    /// # Arguments
    ///
    /// * `token` - The bearer token returned by the login endpoint.
    /// * `user` - The user record returned alongside it, if any.
    pub fn set_session(&self, token: SessionToken, user: Option<SessionUser>) -> Result<()> {
        let user_op = match &user {
            Some(user) => StorageOp::Set(USER_KEY.to_string(), sonic_rs::to_string(user)?),
            None => StorageOp::Remove(USER_KEY.to_string()),
        };

        self.storage.apply(vec![
            StorageOp::Set(TOKEN_KEY.to_string(), token.expose().to_string()),
            user_op,
        ])?;

        tracing::info!(
            "Session stored for user: {}",
            user.as_ref().map(|u| u.id.as_str()).unwrap_or("unknown")
        );
        Ok(())
    }

    /// Removes both slots. Clearing an empty session is a no-op.
    pub fn clear_session(&self) -> Result<()> {
        self.storage.apply(vec![
            StorageOp::Remove(TOKEN_KEY.to_string()),
            StorageOp::Remove(USER_KEY.to_string()),
        ])?;
        tracing::info!("Session cleared");
        Ok(())
    }

    /// Returns the current session.
    ///
    /// Never fails: a missing token reads as logged out, and an unreadable
    /// user record reads as absent.
    pub fn get_session(&self) -> Session {
        let [token, user] = self.storage.get_many([TOKEN_KEY, USER_KEY]);

        let token = match token.filter(|t| !t.is_empty()) {
            Some(token) => SessionToken::new(token),
            None => return Session::logged_out(),
        };

        let user = user.and_then(|raw| match sonic_rs::from_str::<SessionUser>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!("Ignoring unreadable user record: {}", e);
                None
            }
        });

        Session {
            token: Some(token),
            user,
        }
    }

    /// The id of the logged-in user.
    ///
    /// Falls back to the token's claims when no user record is cached.
    pub fn user_id(&self) -> Option<String> {
        let session = self.get_session();
        if let Some(user) = session.current_user() {
            return Some(user.id.clone());
        }
        session.token().and_then(claimed_user_id)
    }

    /// Changes to the session slots written by other contexts arrive here.
    pub fn changes(&self) -> StorageChanges {
        self.storage.changes()
    }
}

use garde::Validate;

use crate::error::{ClientError, Result};
use crate::models::session::{Session, SessionToken, SessionUser};
use crate::models::user::{LoginRequest, RegisterRequest};
use crate::remote::auth as auth_remote;
use crate::state::AppState;

/// Registers a new account.
///
/// Registration does not log the user in.
///
/// # Arguments
///
/// * `state` - The application's state.
/// * `request` - The registration form.
///
/// # Returns
///
/// A `Result` containing the created user, when the remote returns one.
pub async fn register(state: &AppState, request: &RegisterRequest) -> Result<Option<SessionUser>> {
    request.validate()?;

    let user = auth_remote::register(&state.api, request).await?;
    tracing::info!("Account registered: {}", request.email);
    Ok(user)
}

/// Logs a user in and announces the new session.
///
/// # Arguments
///
/// * `state` - The application's state.
/// * `request` - The login form.
///
/// # Returns
///
/// A `Result` containing the stored session.
pub async fn login(state: &AppState, request: &LoginRequest) -> Result<Session> {
    request.validate()?;

    let (token, user) = auth_remote::login(&state.api, request).await?;
    state.session.set_session(token, user)?;
    state.broadcaster.publish();

    tracing::info!("User logged in: {}", request.email);
    Ok(state.session.get_session())
}

/// Logs the current user out and announces it.
pub async fn logout(state: &AppState) -> Result<()> {
    state.session.clear_session()?;
    state.broadcaster.publish();
    Ok(())
}

/// Returns the current token, or `AuthRequired` without touching the network.
pub fn require_token(state: &AppState) -> Result<SessionToken> {
    state
        .session
        .get_session()
        .token
        .ok_or(ClientError::AuthRequired)
}

/// Ends the session when the remote rejected its token, then hands the
/// error back.
pub fn expire_on_auth_failure(state: &AppState, err: ClientError) -> ClientError {
    if err.is_auth_failure() {
        tracing::warn!("Session rejected by the remote, logging out: {}", err);
        if let Err(e) = state.session.clear_session() {
            tracing::error!("Failed to clear rejected session: {}", e);
        }
        state.broadcaster.publish();
    }
    err
}

use garde::Validate;

use crate::error::Result;
use crate::models::user::{ProfileUpdate, UserProfile};
use crate::remote::profile as profile_remote;
use crate::services::auth::{expire_on_auth_failure, require_token};
use crate::state::AppState;

/// Reads the logged-in user's profile.
pub async fn get_profile(state: &AppState) -> Result<UserProfile> {
    let token = require_token(state)?;
    profile_remote::get_profile(&state.api, &token)
        .await
        .map_err(|e| expire_on_auth_failure(state, e))
}

/// Updates the logged-in user's profile.
///
/// The cached user record is refreshed so every view shows the new name.
///
/// # Arguments
///
/// * `state` - The application's state.
/// * `update` - The new profile values.
///
/// # Returns
///
/// A `Result` containing the profile as stored by the remote.
pub async fn update_profile(state: &AppState, update: &ProfileUpdate) -> Result<UserProfile> {
    let token = require_token(state)?;
    update.validate()?;

    let profile = profile_remote::update_profile(&state.api, &token, update)
        .await
        .map_err(|e| expire_on_auth_failure(state, e))?;

    if let Some(user) = profile.to_session_user() {
        state.session.set_session(token, Some(user))?;
        state.broadcaster.publish();
    }

    tracing::info!("Profile updated: {}", profile.id.as_deref().unwrap_or("unknown"));
    Ok(profile)
}

/// Deletes the logged-in user's account and ends the session.
pub async fn delete_account(state: &AppState) -> Result<()> {
    let token = require_token(state)?;
    profile_remote::delete_account(&state.api, &token)
        .await
        .map_err(|e| expire_on_auth_failure(state, e))?;

    state.session.clear_session()?;
    state.broadcaster.publish();

    tracing::info!("Account deleted");
    Ok(())
}

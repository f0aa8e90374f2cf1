use serde::Deserialize;

use crate::{
    error::Result,
    models::session::SessionToken,
    models::user::{ProfileUpdate, UserProfile},
    remote::client::{with_bearer, with_json, ApiClient},
};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawProfile {
    Wrapped { user: UserProfile },
    Plain(UserProfile),
}

impl From<RawProfile> for UserProfile {
    fn from(raw: RawProfile) -> Self {
        match raw {
            RawProfile::Wrapped { user } | RawProfile::Plain(user) => user,
        }
    }
}

/// Reads the logged-in user's profile.
pub async fn get_profile(api: &ApiClient, token: &SessionToken) -> Result<UserProfile> {
    let raw: RawProfile = api
        .execute_json(with_bearer(api.get("/api/profile"), token), "Failed to fetch profile")
        .await?;
    Ok(raw.into())
}

/// Updates the logged-in user's profile.
///
/// # Returns
///
/// A `Result` containing the profile as stored by the remote.
pub async fn update_profile(
    api: &ApiClient,
    token: &SessionToken,
    update: &ProfileUpdate,
) -> Result<UserProfile> {
    let builder = with_json(with_bearer(api.put("/api/profile"), token), update)?;
    let raw: RawProfile = api.execute_json(builder, "Failed to update profile").await?;
    Ok(raw.into())
}

/// Deletes the logged-in user's account.
pub async fn delete_account(api: &ApiClient, token: &SessionToken) -> Result<()> {
    api.execute(
        with_bearer(api.delete("/api/profile"), token),
        "Failed to delete account",
    )
    .await?;
    Ok(())
}

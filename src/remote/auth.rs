use serde::Deserialize;

use crate::{
    error::{ClientError, Result},
    models::session::{SessionToken, SessionUser},
    models::user::{LenientUser, LoginRequest, RegisterRequest},
    remote::client::{with_json, ApiClient},
    session::token::claimed_user_id,
};

#[derive(Deserialize)]
struct LoginData {
    #[serde(default)]
    user: Option<LenientUser>,
}

/// The login response. Older servers put the user under `userData` or
/// `data.user`.
#[derive(Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    user: Option<LenientUser>,
    #[serde(rename = "userData", default)]
    user_data: Option<LenientUser>,
    #[serde(default)]
    data: Option<LoginData>,
}

impl LoginResponse {
    /// Splits the response into its token and the first usable user record.
    ///
    /// A record without an id takes the one claimed by the token. A record
    /// that cannot be used at all is dropped; the login still succeeds.
    fn into_session(self) -> Result<(SessionToken, Option<SessionUser>)> {
        let token = self
            .token
            .filter(|t| !t.is_empty())
            .map(SessionToken::new)
            .ok_or_else(|| ClientError::Serialization("Login response did not include a token".to_string()))?;

        let record = [self.user, self.user_data, self.data.and_then(|d| d.user)]
            .into_iter()
            .flatten()
            .find_map(LenientUser::into_user);

        let user = match record {
            Some(record) => {
                let user = record.into_session_user(claimed_user_id(&token));
                if user.is_none() {
                    tracing::warn!("Login user record has no id and the token claims none, ignoring it");
                }
                user
            }
            None => None,
        };

        Ok((token, user))
    }
}

#[derive(Deserialize)]
struct RegisterResponse {
    #[serde(default)]
    user: Option<LenientUser>,
}

/// Registers a new account.
///
/// # Arguments
///
/// * `api` - The API client.
/// * `request` - The validated registration form.
///
/// # Returns
///
/// A `Result` containing the created user, when the remote returns one.
pub async fn register(api: &ApiClient, request: &RegisterRequest) -> Result<Option<SessionUser>> {
    tracing::debug!("Registering account: {}", request.email);
    let builder = with_json(api.post("/api/register"), request)?;
    let response: RegisterResponse = api.execute_json(builder, "Registration failed!").await?;
    Ok(response
        .user
        .and_then(LenientUser::into_user)
        .and_then(|user| user.into_session_user(None)))
}

/// Exchanges credentials for a token.
///
/// # Arguments
///
/// * `api` - The API client.
/// * `request` - The validated login form.
///
/// # Returns
///
/// A `Result` containing the token and the user record, if one was sent.
pub async fn login(
    api: &ApiClient,
    request: &LoginRequest,
) -> Result<(SessionToken, Option<SessionUser>)> {
    tracing::debug!("Logging in: {}", request.email);
    let builder = with_json(api.post("/api/login"), request)?;
    let response: LoginResponse = api.execute_json(builder, "Login failed!").await?;
    response.into_session()
}

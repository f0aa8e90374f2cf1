use base64::{Engine as _, engine::general_purpose};
use sonic_rs::JsonValueTrait;

use crate::models::session::SessionToken;

/// Claim names the remote has used for the user id.
const USER_ID_CLAIMS: [&str; 4] = ["id", "_id", "userId", "sub"];

/// Reads the user id from a JWT's payload without verifying it.
///
/// The remote stays the authority on who the token belongs to; this is only
/// used to stamp the owner on new posts when no user record is cached.
/// Returns `None` for anything that is not a three-part JWT with a string or
/// integer id claim.
pub fn claimed_user_id(token: &SessionToken) -> Option<String> {
    let mut parts = token.expose().split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return None,
    };

    let bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: sonic_rs::Value = sonic_rs::from_slice(&bytes).ok()?;

    USER_ID_CLAIMS.iter().find_map(|name| {
        let claim = claims.get(*name)?;
        claim
            .as_str()
            .map(str::to_string)
            .or_else(|| claim.as_u64().map(|id| id.to_string()))
    })
}

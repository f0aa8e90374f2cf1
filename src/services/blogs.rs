use garde::Validate;

use crate::error::{ClientError, Result};
use crate::guard::ensure_can_mutate;
use crate::models::blog::{BlogDraft, BlogPage, BlogQuerySpec, BlogSummary};
use crate::remote::blogs as blog_remote;
use crate::services::auth::{expire_on_auth_failure, require_token};
use crate::state::AppState;

/// Fetches one page of the public listing.
pub async fn fetch_page(state: &AppState, spec: &BlogQuerySpec) -> Result<BlogPage> {
    blog_remote::fetch_page(&state.api, spec).await
}

/// Fetches a single post.
pub async fn fetch_blog(state: &AppState, id: &str) -> Result<BlogSummary> {
    blog_remote::fetch_blog_by_id(&state.api, id).await
}

/// Creates a post owned by the logged-in user.
///
/// Nothing is sent when the user is logged out or the draft is invalid.
///
/// # Arguments
///
/// * `state` - The application's state.
/// * `draft` - The post to create.
///
/// # Returns
///
/// A `Result` containing the created post, when the remote echoes it.
pub async fn create_blog(state: &AppState, draft: &BlogDraft) -> Result<Option<BlogSummary>> {
    let token = require_token(state)?;
    draft.validate()?;

    let user_id = state.session.user_id().ok_or(ClientError::AuthRequired)?;

    let created = blog_remote::create_blog(&state.api, &token, draft, &user_id)
        .await
        .map_err(|e| expire_on_auth_failure(state, e))?;

    tracing::info!("Blog created by user: {}", user_id);
    Ok(created)
}

/// Replaces the editable fields of `blog`, which must belong to the
/// logged-in user.
///
/// # Arguments
///
/// * `state` - The application's state.
/// * `blog` - The post as last fetched.
/// * `draft` - The new field values.
///
/// # Returns
///
/// A `Result` containing the updated post, when the remote echoes it.
pub async fn update_blog(
    state: &AppState,
    blog: &BlogSummary,
    draft: &BlogDraft,
) -> Result<Option<BlogSummary>> {
    let token = require_token(state)?;
    ensure_can_mutate(&state.session.get_session(), blog)?;
    draft.validate()?;

    let updated = blog_remote::update_blog(&state.api, &token, &blog.id, draft)
        .await
        .map_err(|e| expire_on_auth_failure(state, e))?;

    tracing::info!("Blog updated: {}", blog.id);
    Ok(updated)
}

/// Deletes `blog`, which must belong to the logged-in user.
pub async fn delete_blog(state: &AppState, blog: &BlogSummary) -> Result<()> {
    let token = require_token(state)?;
    ensure_can_mutate(&state.session.get_session(), blog)?;

    blog_remote::delete_blog(&state.api, &token, &blog.id)
        .await
        .map_err(|e| expire_on_auth_failure(state, e))?;

    tracing::info!("Blog deleted: {}", blog.id);
    Ok(())
}

/// Fetches every post owned by the logged-in user.
pub async fn my_blogs(state: &AppState) -> Result<Vec<BlogSummary>> {
    require_token(state)?;
    let user_id = state.session.user_id().ok_or(ClientError::AuthRequired)?;

    blog_remote::fetch_blogs_by_owner(&state.api, &user_id)
        .await
        .map_err(|e| expire_on_auth_failure(state, e))
}

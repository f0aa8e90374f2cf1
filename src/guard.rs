use crate::{
    error::{ClientError, Result},
    models::blog::BlogSummary,
    models::session::Session,
};

/// A resource that belongs to one user.
pub trait Owned {
    fn resource_id(&self) -> &str;
    fn owner_user_id(&self) -> &str;
}

impl Owned for BlogSummary {
    fn resource_id(&self) -> &str {
        &self.id
    }

    fn owner_user_id(&self) -> &str {
        &self.owner_user_id
    }
}

/// Whether the session's user may edit or delete `resource`.
///
/// Advisory only: it decides which controls to show. The remote re-checks
/// ownership on every mutating call.
pub fn can_mutate<R: Owned + ?Sized>(session: &Session, resource: &R) -> bool {
    match session.current_user() {
        Some(user) => !resource.owner_user_id().is_empty() && user.id == resource.owner_user_id(),
        None => false,
    }
}

/// Like `can_mutate`, but says why not.
///
/// # Returns
///
/// `AuthRequired` when logged out, `NotOwner` when someone else owns it.
pub fn ensure_can_mutate<R: Owned + ?Sized>(session: &Session, resource: &R) -> Result<()> {
    if !session.is_authenticated() {
        return Err(ClientError::AuthRequired);
    }

    if !can_mutate(session, resource) {
        tracing::warn!("Refusing to modify {} owned by another user", resource.resource_id());
        return Err(ClientError::NotOwner {
            resource_id: resource.resource_id().to_string(),
        });
    }

    Ok(())
}

/// Ownership checks for tricks
///
/// Only the user who created a trick may edit it, delete it or remove its
/// archive. The API's owner guard calls [`ensure_owner`] after resolving the
/// trick from the URL.

use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::trick::Trick;

#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("User {user_id} does not own trick {trick_id}")]
    NotOwner { user_id: Uuid, trick_id: Uuid },
}

/// Succeeds when the caller created `trick`
pub fn ensure_owner(trick: &Trick, auth: &AuthContext) -> Result<(), AuthzError> {
    if trick.user_id != auth.user_id {
        return Err(AuthzError::NotOwner {
            user_id: auth.user_id,
            trick_id: trick.id,
        });
    }

    Ok(())
}

use crate::database::models::PROFILES;
use crate::error::ApiError;
use crate::middleware::AuthUser;

/// Collections that only dedicated operations may write to
const PROTECTED_COLLECTIONS: &[&str] = &[PROFILES];

pub fn ensure_writable(collection: &str) -> Result<(), ApiError> {
    if PROTECTED_COLLECTIONS.contains(&collection) {
        return Err(ApiError::permission_denied(format!(
            "Collection '{}' cannot be modified through the entity API",
            collection
        )));
    }
    Ok(())
}

pub fn caller_id(caller: &Option<axum::Extension<AuthUser>>) -> Option<&str> {
    caller.as_ref().map(|axum::Extension(user)| user.id.as_str())
}

use std::sync::Arc;

use crate::database::models::{Profile, PROFILES};
use crate::database::{DocumentStore, EntityRepository};
use crate::error::ApiError;

/// Role checks against the caller's stored profile.
///
/// The check and the mutation that follows it are two separate reads/writes;
/// a role revoked in between does not stop the in-flight operation.
#[derive(Clone)]
pub struct AuthorizationGuard {
    profiles: EntityRepository,
}

impl AuthorizationGuard {
    pub fn new(store: Arc<dyn DocumentStore>) -> Result<Self, ApiError> {
        Ok(Self {
            profiles: EntityRepository::new(PROFILES, store)?,
        })
    }

    pub async fn profile(&self, account_id: &str) -> Result<Option<Profile>, ApiError> {
        let Some(doc) = self.profiles.get(account_id).await? else {
            return Ok(None);
        };
        let profile = Profile::from_document(&doc).map_err(|e| {
            tracing::error!("Malformed profile {}: {}", account_id, e);
            ApiError::internal("Stored profile is malformed")
        })?;
        Ok(Some(profile))
    }

    pub async fn is_admin(&self, caller_id: &str) -> Result<bool, ApiError> {
        Ok(self.profile(caller_id).await?.is_some_and(|p| p.is_admin()))
    }

    /// `PermissionDenied` unless the caller has a profile with the admin role
    pub async fn assert_admin(&self, caller_id: &str) -> Result<Profile, ApiError> {
        match self.profile(caller_id).await? {
            Some(profile) if profile.is_admin() => Ok(profile),
            Some(_) => {
                tracing::warn!("Denied privileged call by non-admin {}", caller_id);
                Err(ApiError::permission_denied("Admin privileges required"))
            }
            None => {
                tracing::warn!("Denied privileged call by {} (no profile)", caller_id);
                Err(ApiError::permission_denied("Admin privileges required"))
            }
        }
    }
}

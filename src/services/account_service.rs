use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::database::models::profile::subscription_patch;
use crate::database::models::{Profile, Role, SubscriptionStatus, PROFILES};
use crate::database::{DatabaseError, Document, DocumentStore, EntityRepository};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::providers::{IdentityError, IdentityProvider, PushProvider};
use crate::services::authorization::AuthorizationGuard;

/// Literal a user must type to delete their own account
pub const DELETE_CONFIRMATION: &str = "DELETE";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeUserRoleRequest {
    pub user_id: Option<String>,
    pub new_role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeUserSubscriptionRequest {
    pub user_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetRequest {
    pub user_email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDeleteUserRequest {
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteUserAccountRequest {
    pub confirmation: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumTagRequest {
    pub is_premium: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardNotificationsRequest {
    pub subscription_id: Option<String>,
    pub device_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncProfileRequest {
    pub full_name: Option<String>,
}

/// Outcome of a best-effort sync; failures are reported here, never raised
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    pub success: bool,
    pub message: Option<String>,
}

impl SyncResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ApiError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::invalid_argument(format!("{} is required", name)))
}

/// Privileged and self-service operations on accounts and their profiles
pub struct AccountService {
    profiles: EntityRepository,
    guard: AuthorizationGuard,
    identity: Arc<dyn IdentityProvider>,
    push: Arc<dyn PushProvider>,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        push: Arc<dyn PushProvider>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            profiles: EntityRepository::new(PROFILES, store.clone())?,
            guard: AuthorizationGuard::new(store)?,
            identity,
            push,
        })
    }

    pub async fn change_user_role(&self, caller: &AuthUser, req: ChangeUserRoleRequest) -> Result<Value, ApiError> {
        self.guard.assert_admin(&caller.id).await?;

        let user_id = required(&req.user_id, "userId")?;
        let role: Role = required(&req.new_role, "newRole")?
            .parse()
            .map_err(ApiError::invalid_argument)?;

        self.update_profile(user_id, Document::new().set("role", role.as_str())).await?;
        tracing::info!("{} changed role of {} to {}", caller.id, user_id, role);
        Ok(json!({ "success": true, "userId": user_id, "role": role }))
    }

    pub async fn change_user_subscription(
        &self,
        caller: &AuthUser,
        req: ChangeUserSubscriptionRequest,
    ) -> Result<Value, ApiError> {
        self.guard.assert_admin(&caller.id).await?;

        let user_id = required(&req.user_id, "userId")?;
        let status: SubscriptionStatus = required(&req.status, "status")?
            .parse()
            .map_err(ApiError::invalid_argument)?;

        self.update_profile(user_id, subscription_patch(status)).await?;
        tracing::info!("{} changed subscription of {} to {}", caller.id, user_id, status.as_str());
        Ok(json!({
            "success": true,
            "userId": user_id,
            "subscription_status": status,
            "isPremium": status.is_premium(),
            "pet_limit": status.pet_limit(),
        }))
    }

    /// Returns a reset link for the admin to hand over out of band
    pub async fn reset_user_password(&self, caller: &AuthUser, req: PasswordResetRequest) -> Result<Value, ApiError> {
        self.guard.assert_admin(&caller.id).await?;

        let email = required(&req.user_email, "userEmail")?;
        let link = self.identity.password_reset_link(email).await?;
        tracing::info!("{} issued a password reset link for {}", caller.id, email);
        Ok(json!({ "success": true, "resetLink": link }))
    }

    /// The identity provider emails the link to the user directly
    pub async fn send_password_reset_email(
        &self,
        caller: &AuthUser,
        req: PasswordResetRequest,
    ) -> Result<Value, ApiError> {
        self.guard.assert_admin(&caller.id).await?;

        let email = required(&req.user_email, "userEmail")?;
        self.identity.send_password_reset_email(email).await?;
        tracing::info!("{} sent a password reset email to {}", caller.id, email);
        Ok(json!({ "success": true, "email": email }))
    }

    /// Identity account first, then the profile
    pub async fn admin_delete_user(&self, caller: &AuthUser, req: AdminDeleteUserRequest) -> Result<Value, ApiError> {
        self.guard.assert_admin(&caller.id).await?;

        let user_id = required(&req.user_id, "userId")?;
        if user_id == caller.id {
            return Err(ApiError::failed_precondition("Administrators cannot delete their own account"));
        }

        self.delete_identity(user_id).await?;
        self.profiles.delete(user_id).await?;
        tracing::info!("{} deleted user {}", caller.id, user_id);
        Ok(json!({ "success": true, "userId": user_id }))
    }

    /// Profile first, then the identity account
    pub async fn delete_user_account(
        &self,
        caller: &AuthUser,
        req: DeleteUserAccountRequest,
    ) -> Result<Value, ApiError> {
        if req.confirmation.as_deref() != Some(DELETE_CONFIRMATION) {
            return Err(ApiError::invalid_argument(format!(
                "confirmation must be \"{}\"",
                DELETE_CONFIRMATION
            )));
        }

        self.profiles.delete(&caller.id).await?;
        self.delete_identity(&caller.id).await?;
        tracing::info!("User {} deleted their account", caller.id);
        Ok(json!({ "success": true }))
    }

    /// Push the caller's stored premium flag to the push provider as the
    /// `is_premium` tag. A client-supplied `isPremium` is only compared
    /// against the profile, never trusted.
    pub async fn update_user_premium_tag(&self, caller: &AuthUser, req: PremiumTagRequest) -> SyncResult {
        match self.sync_premium_tag(caller, req.is_premium).await {
            Ok(()) => SyncResult::ok(),
            Err(message) => {
                tracing::warn!("Premium tag sync for {} failed: {}", caller.id, message);
                SyncResult::failed(message)
            }
        }
    }

    async fn sync_premium_tag(&self, caller: &AuthUser, claimed: Option<bool>) -> Result<(), String> {
        let profile = self
            .guard
            .profile(&caller.id)
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "Profile not found".to_string())?;

        if let Some(claimed) = claimed.filter(|claimed| *claimed != profile.is_premium) {
            tracing::warn!(
                "User {} claimed isPremium={} but profile says {}; using profile",
                caller.id,
                claimed,
                profile.is_premium
            );
        }

        let mut tags = Map::new();
        tags.insert("is_premium".to_string(), Value::String(profile.is_premium.to_string()));
        self.push
            .set_tags(&caller.id, tags)
            .await
            .map_err(|e| e.to_string())?;

        self.profiles
            .update(&caller.id, Document::new().set("premium_tag_synced", true))
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    /// Link a device subscription to the caller. The subscription is recorded
    /// even when linking fails, flagged with `push_sync_pending`.
    pub async fn onboard_user_notifications(
        &self,
        caller: &AuthUser,
        req: OnboardNotificationsRequest,
    ) -> SyncResult {
        let Some(subscription_id) = req.subscription_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            return SyncResult::failed("subscriptionId is required");
        };

        let link_error = match self.push.link_subscription(subscription_id, &caller.id).await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!("Linking subscription {} to {} failed: {}", subscription_id, caller.id, e);
                Some(e.to_string())
            }
        };

        let mut patch = Document::new()
            .set("onesignal_subscription_id", subscription_id)
            .set("notifications_enabled", true)
            .set("push_sync_pending", link_error.is_some());
        if let Some(device_name) = &req.device_name {
            patch = patch.set("device_name", device_name.as_str());
        }

        if let Err(e) = self.profiles.update(&caller.id, patch).await {
            tracing::warn!("Recording subscription for {} failed: {}", caller.id, e);
            return SyncResult::failed(e.to_string());
        }

        match link_error {
            None => SyncResult::ok(),
            Some(message) => SyncResult::failed(message),
        }
    }

    /// Caller's profile, created with free-tier defaults on first call
    pub async fn sync_user_profile(&self, caller: &AuthUser, req: SyncProfileRequest) -> Result<Document, ApiError> {
        if let Some(existing) = self.profiles.get(&caller.id).await? {
            return Ok(existing);
        }

        let fields = Profile::new_fields(caller.email.as_deref(), req.full_name.as_deref());
        match self.profiles.create_with_id(&caller.id, fields, Some(&caller.id)).await {
            Ok(created) => {
                tracing::info!("Created profile for {}", caller.id);
                Ok(created)
            }
            // Lost a race with a concurrent first sync
            Err(DatabaseError::Conflict(_)) => self
                .profiles
                .get(&caller.id)
                .await?
                .ok_or_else(|| ApiError::internal("Profile vanished during sync")),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_profile(&self, user_id: &str, patch: Document) -> Result<Document, ApiError> {
        self.profiles.update(user_id, patch).await.map_err(|e| match e {
            DatabaseError::NotFound(_) => ApiError::not_found(format!("No profile for user {}", user_id)),
            other => other.into(),
        })
    }

    /// Tolerates an identity account that is already gone
    async fn delete_identity(&self, uid: &str) -> Result<(), ApiError> {
        match self.identity.delete_user(uid).await {
            Ok(()) => Ok(()),
            Err(IdentityError::UserNotFound(_)) => {
                tracing::info!("Identity account {} already absent", uid);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{caller, load_profile, memory_store, seed_profile, FakeIdentity, FakePush};

    struct Fixture {
        store: Arc<dyn DocumentStore>,
        identity: Arc<FakeIdentity>,
        push: Arc<FakePush>,
        service: AccountService,
    }

    async fn fixture_with(push: FakePush) -> Fixture {
        let store = memory_store();
        seed_profile(&store, "admin-1", "admin").await;
        seed_profile(&store, "user-1", "user").await;
        seed_profile(&store, "user-2", "user").await;

        let identity = Arc::new(FakeIdentity::with_accounts(&["admin-1", "user-1", "user-1@petcare.test"]));
        let push = Arc::new(push);
        let service = AccountService::new(store.clone(), identity.clone(), push.clone()).unwrap();
        Fixture { store, identity, push, service }
    }

    async fn fixture() -> Fixture {
        fixture_with(FakePush::default()).await
    }

    fn role_request(user_id: &str, role: &str) -> ChangeUserRoleRequest {
        ChangeUserRoleRequest {
            user_id: Some(user_id.into()),
            new_role: Some(role.into()),
        }
    }

    #[tokio::test]
    async fn non_admin_cannot_change_roles() {
        let f = fixture().await;
        for role in ["user", "admin"] {
            let before = load_profile(&f.store, "user-2").await;
            let err = f
                .service
                .change_user_role(&caller("user-1"), role_request("user-2", role))
                .await
                .unwrap_err();
            assert_eq!(err.error_code(), "PERMISSION_DENIED");
            assert_eq!(load_profile(&f.store, "user-2").await, before);
        }
    }

    #[tokio::test]
    async fn admin_changes_roles() {
        let f = fixture().await;
        f.service
            .change_user_role(&caller("admin-1"), role_request("user-1", "admin"))
            .await
            .unwrap();
        let profile = load_profile(&f.store, "user-1").await.unwrap();
        assert_eq!(profile.get_str("role"), Some("admin"));
        assert!(profile.get_str("updated_at").is_some());
    }

    #[tokio::test]
    async fn role_change_validates_input() {
        let f = fixture().await;
        let admin = caller("admin-1");
        let bad_role = f.service.change_user_role(&admin, role_request("user-1", "owner")).await;
        assert_eq!(bad_role.unwrap_err().error_code(), "INVALID_ARGUMENT");

        let missing = f.service.change_user_role(&admin, ChangeUserRoleRequest::default()).await;
        assert_eq!(missing.unwrap_err().error_code(), "INVALID_ARGUMENT");

        let ghost = f.service.change_user_role(&admin, role_request("ghost", "user")).await;
        assert_eq!(ghost.unwrap_err().error_code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn subscription_change_keeps_entitlements_consistent() {
        let f = fixture().await;
        for (status, premium, limit) in [("premium", true, 999), ("free", false, 2)] {
            f.service
                .change_user_subscription(
                    &caller("admin-1"),
                    ChangeUserSubscriptionRequest {
                        user_id: Some("user-1".into()),
                        status: Some(status.into()),
                    },
                )
                .await
                .unwrap();
            let profile = Profile::from_document(&load_profile(&f.store, "user-1").await.unwrap()).unwrap();
            assert_eq!(profile.subscription_status.as_str(), status);
            assert_eq!(profile.is_premium, premium);
            assert_eq!(profile.pet_limit, Some(limit));
            assert!(!profile.premium_tag_synced);
        }
    }

    #[tokio::test]
    async fn admin_cannot_delete_self() {
        let f = fixture().await;
        let err = f
            .service
            .admin_delete_user(
                &caller("admin-1"),
                AdminDeleteUserRequest {
                    user_id: Some("admin-1".into()),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "FAILED_PRECONDITION");
        assert!(f.identity.calls().is_empty());
        assert!(load_profile(&f.store, "admin-1").await.is_some());
    }

    #[tokio::test]
    async fn admin_delete_removes_identity_then_profile() {
        let f = fixture().await;
        let admin = caller("admin-1");
        let req = |id: &str| AdminDeleteUserRequest { user_id: Some(id.into()) };

        f.service.admin_delete_user(&admin, req("user-1")).await.unwrap();
        assert_eq!(f.identity.calls(), vec!["delete:user-1"]);
        assert!(load_profile(&f.store, "user-1").await.is_none());

        // user-2 has a profile but no identity account
        f.service.admin_delete_user(&admin, req("user-2")).await.unwrap();
        assert!(load_profile(&f.store, "user-2").await.is_none());
    }

    #[tokio::test]
    async fn admin_delete_stops_on_genuine_provider_error() {
        let f = fixture().await;
        *f.identity.fail_with.lock().unwrap() = Some("INTERNAL_ERROR".into());
        let err = f
            .service
            .admin_delete_user(&caller("admin-1"), AdminDeleteUserRequest { user_id: Some("user-1".into()) })
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INTERNAL");
        assert!(load_profile(&f.store, "user-1").await.is_some());
    }

    #[tokio::test]
    async fn self_delete_requires_exact_confirmation() {
        let f = fixture().await;
        let user = caller("user-1");
        for confirmation in [None, Some("delete"), Some("DELETE ")] {
            let err = f
                .service
                .delete_user_account(&user, DeleteUserAccountRequest { confirmation: confirmation.map(Into::into) })
                .await
                .unwrap_err();
            assert_eq!(err.error_code(), "INVALID_ARGUMENT");
        }
        assert!(load_profile(&f.store, "user-1").await.is_some());

        f.service
            .delete_user_account(&user, DeleteUserAccountRequest { confirmation: Some("DELETE".into()) })
            .await
            .unwrap();
        assert!(load_profile(&f.store, "user-1").await.is_none());
        assert_eq!(f.identity.calls(), vec!["delete:user-1"]);

        // Second attempt: profile and identity already gone
        f.service
            .delete_user_account(&user, DeleteUserAccountRequest { confirmation: Some("DELETE".into()) })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn password_reset_for_unknown_email_is_not_found() {
        let f = fixture().await;
        let admin = caller("admin-1");
        let req = |email: &str| PasswordResetRequest { user_email: Some(email.into()) };

        let link = f.service.reset_user_password(&admin, req("user-1@petcare.test")).await.unwrap();
        assert!(link["resetLink"].as_str().unwrap().starts_with("https://"));

        let err = f.service.send_password_reset_email(&admin, req("nobody@petcare.test")).await.unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");

        let denied = f.service.reset_user_password(&caller("user-1"), req("user-1@petcare.test")).await;
        assert_eq!(denied.unwrap_err().error_code(), "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn premium_tag_sync_marks_profile() {
        let f = fixture().await;
        let req = PremiumTagRequest { is_premium: Some(false) };
        let result = f.service.update_user_premium_tag(&caller("user-1"), req).await;
        assert_eq!(result, SyncResult::ok());

        let tags = f.push.tags.lock().unwrap().clone();
        assert_eq!(tags[0].0, "user-1");
        assert_eq!(tags[0].1.get("is_premium"), Some(&Value::String("false".into())));
        let profile = load_profile(&f.store, "user-1").await.unwrap();
        assert_eq!(profile.get("premium_tag_synced"), Some(&Value::Bool(true)));
    }

    #[tokio::test]
    async fn premium_tag_follows_profile_not_request() {
        let f = fixture().await;
        let req = PremiumTagRequest { is_premium: Some(true) };
        f.service.update_user_premium_tag(&caller("user-1"), req).await;
        let tags = f.push.tags.lock().unwrap().clone();
        assert_eq!(tags[0].1.get("is_premium"), Some(&Value::String("false".into())));

        f.service
            .change_user_subscription(
                &caller("admin-1"),
                ChangeUserSubscriptionRequest { user_id: Some("user-1".into()), status: Some("premium".into()) },
            )
            .await
            .unwrap();
        let req = PremiumTagRequest { is_premium: Some(false) };
        f.service.update_user_premium_tag(&caller("user-1"), req).await;
        let tags = f.push.tags.lock().unwrap().clone();
        assert_eq!(tags[1].1.get("is_premium"), Some(&Value::String("true".into())));
    }

    #[tokio::test]
    async fn premium_tag_sync_failure_is_soft() {
        let f = fixture_with(FakePush::failing()).await;
        let result = f.service.update_user_premium_tag(&caller("user-1"), PremiumTagRequest::default()).await;
        assert!(!result.success);
        assert!(result.message.is_some());

        let missing = f.service.update_user_premium_tag(&caller("ghost"), PremiumTagRequest::default()).await;
        assert_eq!(missing, SyncResult::failed("Profile not found"));
    }

    #[tokio::test]
    async fn onboarding_records_subscription_even_when_link_fails() {
        let f = fixture_with(FakePush::failing()).await;
        let result = f
            .service
            .onboard_user_notifications(
                &caller("user-1"),
                OnboardNotificationsRequest {
                    subscription_id: Some("sub-9".into()),
                    device_name: Some("Pixel".into()),
                },
            )
            .await;
        assert!(!result.success);

        let profile = Profile::from_document(&load_profile(&f.store, "user-1").await.unwrap()).unwrap();
        assert_eq!(profile.onesignal_subscription_id.as_deref(), Some("sub-9"));
        assert_eq!(profile.device_name.as_deref(), Some("Pixel"));
        assert!(profile.notifications_enabled);
        assert!(profile.push_sync_pending);
    }

    #[tokio::test]
    async fn onboarding_links_subscription() {
        let f = fixture().await;
        let result = f
            .service
            .onboard_user_notifications(
                &caller("user-1"),
                OnboardNotificationsRequest {
                    subscription_id: Some("sub-1".into()),
                    device_name: None,
                },
            )
            .await;
        assert_eq!(result, SyncResult::ok());
        assert_eq!(f.push.links.lock().unwrap().clone(), vec![("sub-1".to_string(), "user-1".to_string())]);

        let profile = Profile::from_document(&load_profile(&f.store, "user-1").await.unwrap()).unwrap();
        assert!(!profile.push_sync_pending);

        let blank = f
            .service
            .onboard_user_notifications(&caller("user-1"), OnboardNotificationsRequest::default())
            .await;
        assert!(!blank.success);
    }

    #[tokio::test]
    async fn sync_profile_creates_once() {
        let f = fixture().await;
        let newcomer = caller("new-1");
        let created = f
            .service
            .sync_user_profile(&newcomer, SyncProfileRequest { full_name: Some("Nova".into()) })
            .await
            .unwrap();
        assert_eq!(created.id(), Some("new-1"));
        assert_eq!(created.get_str("role"), Some("user"));
        assert_eq!(created.get_str("full_name"), Some("Nova"));

        let again = f.service.sync_user_profile(&newcomer, SyncProfileRequest::default()).await.unwrap();
        assert_eq!(again, created);
    }
}

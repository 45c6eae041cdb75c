use std::str::FromStr;

use axum::{
    body::Bytes,
    extract::{Path, State},
    Extension,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::account_service::{OnboardNotificationsRequest, PremiumTagRequest};
use crate::services::{AccountService, AuthorizationGuard, NotificationService};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcOperation {
    ChangeUserRole,
    ChangeUserSubscription,
    ResetUserPassword,
    SendPasswordResetEmail,
    AdminDeleteUser,
    DeleteUserAccount,
    UpdateUserPremiumTag,
    OnboardUserNotifications,
    SyncUserProfile,
    SendNotification,
}

impl RpcOperation {
    pub const ALL: [RpcOperation; 10] = [
        RpcOperation::ChangeUserRole,
        RpcOperation::ChangeUserSubscription,
        RpcOperation::ResetUserPassword,
        RpcOperation::SendPasswordResetEmail,
        RpcOperation::AdminDeleteUser,
        RpcOperation::DeleteUserAccount,
        RpcOperation::UpdateUserPremiumTag,
        RpcOperation::OnboardUserNotifications,
        RpcOperation::SyncUserProfile,
        RpcOperation::SendNotification,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RpcOperation::ChangeUserRole => "changeUserRole",
            RpcOperation::ChangeUserSubscription => "changeUserSubscription",
            RpcOperation::ResetUserPassword => "resetUserPassword",
            RpcOperation::SendPasswordResetEmail => "sendPasswordResetEmail",
            RpcOperation::AdminDeleteUser => "adminDeleteUser",
            RpcOperation::DeleteUserAccount => "deleteUserAccount",
            RpcOperation::UpdateUserPremiumTag => "updateUserPremiumTag",
            RpcOperation::OnboardUserNotifications => "onboardUserNotifications",
            RpcOperation::SyncUserProfile => "syncUserProfile",
            RpcOperation::SendNotification => "sendNotification",
        }
    }
}

impl FromStr for RpcOperation {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| ApiError::not_found(format!("Unknown operation: {}", s)))
    }
}

/// Empty body reads as `{}`; anything else must be a JSON object
fn parse_args<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    let value: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(body).map_err(|e| ApiError::invalid_argument(format!("Invalid JSON body: {}", e)))?
    };
    if !value.is_object() {
        return Err(ApiError::invalid_argument("Argument must be a JSON object"));
    }
    serde_json::from_value(value).map_err(|e| ApiError::invalid_argument(format!("Invalid argument: {}", e)))
}

fn to_value<T: serde::Serialize>(result: T) -> Result<Value, ApiError> {
    serde_json::to_value(result).map_err(|e| ApiError::internal(e.to_string()))
}

/// POST /api/rpc/:operation - Invoke a named operation as the authenticated caller
pub async fn rpc_post(
    State(state): State<AppState>,
    Path(operation): Path<String>,
    caller: Option<Extension<AuthUser>>,
    body: Bytes,
) -> ApiResult<Value> {
    let Some(Extension(caller)) = caller else {
        return Err(ApiError::unauthenticated("Authentication required"));
    };
    let operation: RpcOperation = operation.parse()?;
    tracing::debug!("rpc {} by {}", operation.name(), caller.id);

    let accounts = AccountService::new(state.store.clone(), state.identity.clone(), state.push.clone())?;
    let result = match operation {
        RpcOperation::ChangeUserRole => accounts.change_user_role(&caller, parse_args(&body)?).await?,
        RpcOperation::ChangeUserSubscription => {
            accounts.change_user_subscription(&caller, parse_args(&body)?).await?
        }
        RpcOperation::ResetUserPassword => accounts.reset_user_password(&caller, parse_args(&body)?).await?,
        RpcOperation::SendPasswordResetEmail => {
            accounts.send_password_reset_email(&caller, parse_args(&body)?).await?
        }
        RpcOperation::AdminDeleteUser => accounts.admin_delete_user(&caller, parse_args(&body)?).await?,
        RpcOperation::DeleteUserAccount => accounts.delete_user_account(&caller, parse_args(&body)?).await?,
        // Best-effort sync: even a malformed argument is a soft failure
        RpcOperation::UpdateUserPremiumTag => {
            let args: PremiumTagRequest = parse_args(&body).unwrap_or_default();
            to_value(accounts.update_user_premium_tag(&caller, args).await)?
        }
        RpcOperation::OnboardUserNotifications => {
            let args: OnboardNotificationsRequest = parse_args(&body).unwrap_or_default();
            to_value(accounts.onboard_user_notifications(&caller, args).await)?
        }
        RpcOperation::SyncUserProfile => {
            to_value(accounts.sync_user_profile(&caller, parse_args(&body)?).await?)?
        }
        RpcOperation::SendNotification => {
            let guard = AuthorizationGuard::new(state.store.clone())?;
            let notifications =
                NotificationService::new(guard, state.push.clone(), state.config.push.broadcast_segment.clone());
            to_value(notifications.send(&caller, parse_args(&body)?).await?)?
        }
    };
    Ok(ApiResponse::success(result))
}

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::providers::{PushMessage, PushProvider, PushReceipt, PushTarget};
use crate::services::authorization::AuthorizationGuard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    Reminder,
    CareAlert,
    Broadcast,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Reminder => "reminder",
            NotificationType::CareAlert => "care_alert",
            NotificationType::Broadcast => "broadcast",
        }
    }

    /// Direct types address a single user and need a `userId`
    pub fn is_direct(&self) -> bool {
        !matches!(self, NotificationType::Broadcast)
    }
}

impl FromStr for NotificationType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reminder" => Ok(NotificationType::Reminder),
            "care_alert" => Ok(NotificationType::CareAlert),
            "broadcast" => Ok(NotificationType::Broadcast),
            other => Err(ApiError::invalid_argument(format!("Unknown notification type: {}", other))),
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NotificationContent {
    pub title: Option<String>,
    pub body: Option<String>,
    pub url: Option<String>,
    pub data: Option<Value>,
}

/// Transient request; never persisted
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub user_id: Option<String>,
    #[serde(default)]
    pub notification: NotificationContent,
}

fn non_empty(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::invalid_argument(format!("notification.{} is required", name)))
}

/// Routes a notification to one user or to every subscriber
pub struct NotificationService {
    guard: AuthorizationGuard,
    push: Arc<dyn PushProvider>,
    broadcast_segment: String,
}

impl NotificationService {
    pub fn new(guard: AuthorizationGuard, push: Arc<dyn PushProvider>, broadcast_segment: impl Into<String>) -> Self {
        Self {
            guard,
            push,
            broadcast_segment: broadcast_segment.into(),
        }
    }

    /// Validate, authorize, then make exactly one provider call
    pub async fn send(&self, caller: &AuthUser, request: NotificationRequest) -> Result<PushReceipt, ApiError> {
        let (kind, message) = self.build(request)?;

        match &message.target {
            PushTarget::Segment(_) => {
                self.guard.assert_admin(&caller.id).await?;
            }
            PushTarget::ExternalId(user_id) => {
                if *user_id != caller.id && !self.guard.is_admin(&caller.id).await? {
                    tracing::warn!("{} tried to notify {}", caller.id, user_id);
                    return Err(ApiError::permission_denied("Cannot send notifications to other users"));
                }
            }
        }

        let receipt = self.push.send(&message).await?;
        tracing::info!("Sent {} notification {} for {}", kind, receipt.id, caller.id);
        Ok(receipt)
    }

    /// Pure validation and routing; no I/O
    pub fn build(&self, request: NotificationRequest) -> Result<(NotificationType, PushMessage), ApiError> {
        let kind: NotificationType = request
            .kind
            .as_deref()
            .ok_or_else(|| ApiError::invalid_argument("type is required"))?
            .parse()?;

        let title = non_empty(request.notification.title, "title")?;
        let body = non_empty(request.notification.body, "body")?;

        let target = if kind.is_direct() {
            let user_id = request
                .user_id
                .filter(|id| !id.trim().is_empty())
                .ok_or_else(|| ApiError::invalid_argument(format!("userId is required for {} notifications", kind)))?;
            PushTarget::ExternalId(user_id)
        } else {
            PushTarget::Segment(self.broadcast_segment.clone())
        };

        Ok((
            kind,
            PushMessage {
                target,
                title,
                body,
                url: request.notification.url,
                data: request.notification.data,
            },
        ))
    }
}

pub mod account_service;
pub mod authorization;
pub mod notification_service;

pub use account_service::{AccountService, SyncResult};
pub use authorization::AuthorizationGuard;
pub use notification_service::{NotificationRequest, NotificationService, NotificationType};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::database::record::Document;

/// Collection holding one profile per account, keyed by account id
pub const PROFILES: &str = "profiles";

pub const FREE_PET_LIMIT: i64 = 2;
pub const PREMIUM_PET_LIMIT: i64 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Invalid role: {}", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Stored profiles written by older clients may carry roles we no longer know;
// those read as plain users so they never pass an admin check.
impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|r| r.parse().ok()).unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    #[default]
    Free,
    Premium,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Free => "free",
            SubscriptionStatus::Premium => "premium",
        }
    }

    pub fn is_premium(&self) -> bool {
        matches!(self, SubscriptionStatus::Premium)
    }

    pub fn pet_limit(&self) -> i64 {
        if self.is_premium() {
            PREMIUM_PET_LIMIT
        } else {
            FREE_PET_LIMIT
        }
    }

    /// Fields that must change together whenever the status changes
    pub fn entitlements(&self) -> Document {
        Document::new()
            .set("subscription_status", self.as_str())
            .set("isPremium", self.is_premium())
            .set("pet_limit", self.pet_limit())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(SubscriptionStatus::Free),
            "premium" => Ok(SubscriptionStatus::Premium),
            other => Err(format!("Invalid subscription status: {}", other)),
        }
    }
}

/// Typed view over a stored profile document. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub subscription_status: SubscriptionStatus,
    #[serde(default, rename = "isPremium")]
    pub is_premium: bool,
    #[serde(default)]
    pub pet_limit: Option<i64>,
    #[serde(default)]
    pub onesignal_subscription_id: Option<String>,
    #[serde(default)]
    pub notifications_enabled: bool,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub push_sync_pending: bool,
    #[serde(default)]
    pub premium_tag_synced: bool,
}

impl Profile {
    pub fn from_document(doc: &Document) -> Result<Self, serde_json::Error> {
        serde_json::from_value(doc.clone().into_value())
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fields of a brand-new free-tier profile (system fields excluded)
    pub fn new_fields(email: Option<&str>, full_name: Option<&str>) -> Document {
        let mut fields = SubscriptionStatus::Free
            .entitlements()
            .set("role", Role::User.as_str())
            .set("notifications_enabled", false)
            .set("push_sync_pending", false)
            .set("premium_tag_synced", false);
        if let Some(email) = email {
            fields = fields.set("email", email);
        }
        if let Some(full_name) = full_name {
            fields = fields.set("full_name", full_name);
        }
        fields
    }
}

/// Patch applied by a subscription change; the push tag must be re-synced afterwards
pub fn subscription_patch(status: SubscriptionStatus) -> Document {
    status.entitlements().set("premium_tag_synced", false)
}

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::database::models::{Profile, PROFILES};
use crate::database::{Document, DocumentStore, EntityRepository, MemoryStore};
use crate::middleware::AuthUser;
use crate::providers::{IdentityError, IdentityProvider, PushError, PushMessage, PushProvider, PushReceipt};

/// Identity provider double: knows a fixed set of accounts and records calls
#[derive(Default)]
pub struct FakeIdentity {
    pub accounts: Mutex<HashSet<String>>,
    pub calls: Mutex<Vec<String>>,
    pub fail_with: Mutex<Option<String>>,
}

impl FakeIdentity {
    pub fn with_accounts(accounts: &[&str]) -> Self {
        let fake = Self::default();
        fake.accounts.lock().unwrap().extend(accounts.iter().map(|a| a.to_string()));
        fake
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), IdentityError> {
        self.calls.lock().unwrap().push(call);
        match self.fail_with.lock().unwrap().clone() {
            Some(message) => Err(IdentityError::Upstream {
                endpoint: "fake",
                status: 500,
                message,
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn password_reset_link(&self, email: &str) -> Result<String, IdentityError> {
        self.record(format!("reset_link:{email}"))?;
        if !self.accounts.lock().unwrap().contains(email) {
            return Err(IdentityError::UserNotFound(email.to_string()));
        }
        Ok(format!("https://auth.test/reset?email={email}"))
    }

    async fn send_password_reset_email(&self, email: &str) -> Result<(), IdentityError> {
        self.record(format!("reset_email:{email}"))?;
        if !self.accounts.lock().unwrap().contains(email) {
            return Err(IdentityError::UserNotFound(email.to_string()));
        }
        Ok(())
    }

    async fn delete_user(&self, uid: &str) -> Result<(), IdentityError> {
        self.record(format!("delete:{uid}"))?;
        if !self.accounts.lock().unwrap().remove(uid) {
            return Err(IdentityError::UserNotFound(uid.to_string()));
        }
        Ok(())
    }
}

/// Push provider double: records every request; can be told to fail
#[derive(Default)]
pub struct FakePush {
    pub sent: Mutex<Vec<PushMessage>>,
    pub tags: Mutex<Vec<(String, Map<String, Value>)>>,
    pub links: Mutex<Vec<(String, String)>>,
    pub fail: Mutex<bool>,
}

impl FakePush {
    pub fn failing() -> Self {
        let fake = Self::default();
        *fake.fail.lock().unwrap() = true;
        fake
    }

    pub fn request_count(&self) -> usize {
        self.sent.lock().unwrap().len() + self.tags.lock().unwrap().len() + self.links.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), PushError> {
        if *self.fail.lock().unwrap() {
            return Err(PushError::Upstream {
                endpoint: "fake",
                status: 503,
                body: "push provider unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PushProvider for FakePush {
    async fn send(&self, message: &PushMessage) -> Result<PushReceipt, PushError> {
        self.sent.lock().unwrap().push(message.clone());
        self.check()?;
        Ok(PushReceipt {
            id: format!("notification-{}", self.sent.lock().unwrap().len()),
        })
    }

    async fn set_tags(&self, external_id: &str, tags: Map<String, Value>) -> Result<(), PushError> {
        self.tags.lock().unwrap().push((external_id.to_string(), tags));
        self.check()
    }

    async fn link_subscription(&self, subscription_id: &str, external_id: &str) -> Result<(), PushError> {
        self.links
            .lock()
            .unwrap()
            .push((subscription_id.to_string(), external_id.to_string()));
        self.check()
    }
}

pub fn caller(id: &str) -> AuthUser {
    AuthUser {
        id: id.to_string(),
        email: Some(format!("{id}@petcare.test")),
    }
}

pub fn memory_store() -> Arc<dyn DocumentStore> {
    Arc::new(MemoryStore::new())
}

/// Store a free-tier profile with the given role
pub async fn seed_profile(store: &Arc<dyn DocumentStore>, id: &str, role: &str) -> Document {
    EntityRepository::new(PROFILES, store.clone())
        .unwrap()
        .create_with_id(id, Profile::new_fields(Some(&format!("{id}@petcare.test")), None).set("role", role), None)
        .await
        .unwrap()
}

pub async fn load_profile(store: &Arc<dyn DocumentStore>, id: &str) -> Option<Document> {
    store.fetch(PROFILES, id).await.unwrap()
}

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Map, Value};
use tower::ServiceExt;

use petcare_api::auth::{generate_jwt, Claims};
use petcare_api::config::AppConfig;
use petcare_api::database::{Document, DocumentStore, MemoryStore};
use petcare_api::providers::{
    IdentityError, IdentityProvider, PlacesClient, PushError, PushMessage, PushProvider, PushReceipt,
};
use petcare_api::state::AppState;

/// Identity provider that knows a fixed set of account ids/emails
#[derive(Default)]
pub struct StubIdentity {
    pub accounts: Mutex<HashSet<String>>,
    pub calls: Mutex<Vec<String>>,
}

impl StubIdentity {
    pub fn with_accounts(accounts: &[&str]) -> Self {
        let stub = Self::default();
        stub.accounts.lock().unwrap().extend(accounts.iter().map(|a| a.to_string()));
        stub
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn known(&self, key: &str) -> Result<(), IdentityError> {
        if self.accounts.lock().unwrap().contains(key) {
            Ok(())
        } else {
            Err(IdentityError::UserNotFound(key.to_string()))
        }
    }
}

#[async_trait]
impl IdentityProvider for StubIdentity {
    async fn password_reset_link(&self, email: &str) -> Result<String, IdentityError> {
        self.calls.lock().unwrap().push(format!("reset_link:{email}"));
        self.known(email)?;
        Ok(format!("https://auth.test/reset?oob={email}"))
    }

    async fn send_password_reset_email(&self, email: &str) -> Result<(), IdentityError> {
        self.calls.lock().unwrap().push(format!("reset_email:{email}"));
        self.known(email)
    }

    async fn delete_user(&self, uid: &str) -> Result<(), IdentityError> {
        self.calls.lock().unwrap().push(format!("delete:{uid}"));
        self.known(uid)?;
        self.accounts.lock().unwrap().remove(uid);
        Ok(())
    }
}

/// Push provider that records every request
#[derive(Default)]
pub struct StubPush {
    pub sent: Mutex<Vec<PushMessage>>,
    pub tags: Mutex<Vec<(String, Map<String, Value>)>>,
    pub links: Mutex<Vec<(String, String)>>,
}

impl StubPush {
    pub fn request_count(&self) -> usize {
        self.sent.lock().unwrap().len() + self.tags.lock().unwrap().len() + self.links.lock().unwrap().len()
    }
}

#[async_trait]
impl PushProvider for StubPush {
    async fn send(&self, message: &PushMessage) -> Result<PushReceipt, PushError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(message.clone());
        Ok(PushReceipt {
            id: format!("stub-{}", sent.len()),
        })
    }

    async fn set_tags(&self, external_id: &str, tags: Map<String, Value>) -> Result<(), PushError> {
        self.tags.lock().unwrap().push((external_id.to_string(), tags));
        Ok(())
    }

    async fn link_subscription(&self, subscription_id: &str, external_id: &str) -> Result<(), PushError> {
        self.links
            .lock()
            .unwrap()
            .push((subscription_id.to_string(), external_id.to_string()));
        Ok(())
    }
}

/// Router over an in-memory store with stubbed identity and push providers
pub struct TestApp {
    pub router: Router,
    pub config: AppConfig,
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<StubIdentity>,
    pub push: Arc<StubPush>,
}

impl TestApp {
    pub fn new() -> Self {
        // Nothing listens on the discard port; places tests use `with_places`
        Self::with_places("http://127.0.0.1:9")
    }

    pub fn with_places(places_base_url: &str) -> Self {
        Self::build(places_base_url, StubIdentity::default())
    }

    pub fn with_identity(identity: StubIdentity) -> Self {
        Self::build("http://127.0.0.1:9", identity)
    }

    fn build(places_base_url: &str, identity: StubIdentity) -> Self {
        let mut config = AppConfig::development();
        config.places.base_url = places_base_url.to_string();
        config.places.api_key = "maps-test-key".to_string();
        config.api.upstream_timeout_secs = 5;

        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let identity = Arc::new(identity);
        let push = Arc::new(StubPush::default());
        let places = Arc::new(PlacesClient::new(&config.places, 5).expect("places client"));

        let state = AppState::new(config.clone(), store.clone(), identity.clone(), push.clone(), places);
        Self {
            router: petcare_api::app(state),
            config,
            store,
            identity,
            push,
        }
    }

    pub fn token(&self, user_id: &str) -> String {
        let claims = Claims::new(user_id, Some(format!("{user_id}@petcare.test")), 1);
        generate_jwt(&claims, &self.config.security).expect("token")
    }

    /// Send one request through the router; returns status and parsed JSON body
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let raw = body.map(|body| serde_json::to_string(&body)).transpose()?;
        self.call_raw(method, uri, token, raw.as_deref()).await
    }

    /// Send `body` verbatim as `application/json`, well-formed or not
    pub async fn call_raw(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<&str>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, json))
    }

    pub async fn rpc(&self, user_id: &str, operation: &str, args: Value) -> Result<(StatusCode, Value)> {
        let token = self.token(user_id);
        self.call(Method::POST, &format!("/api/rpc/{operation}"), Some(&token), Some(args))
            .await
    }

    /// Create a profile through the profile-sync operation, then set its role directly
    pub async fn seed_profile(&self, user_id: &str, role: &str) -> Result<()> {
        let (status, body) = self.rpc(user_id, "syncUserProfile", json!({})).await?;
        assert_eq!(status, StatusCode::OK, "seeding {user_id}: {body}");
        if role != "user" {
            let patch = Document::new().set("role", role);
            self.store
                .merge("profiles", user_id, patch)
                .await?
                .expect("profile just synced");
        }
        Ok(())
    }

    pub async fn profile(&self, user_id: &str) -> Result<Option<Value>> {
        Ok(self
            .store
            .fetch("profiles", user_id)
            .await?
            .map(|doc| doc.into_value()))
    }
}

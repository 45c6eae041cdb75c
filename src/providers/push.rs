use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use url::Url;

use crate::config::PushConfig;

#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: &'static str,
        source: reqwest::Error,
    },

    #[error("Push provider {endpoint} returned {status}: {body}")]
    Upstream {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    /// Id that cannot be used as a single URL path segment
    #[error("Invalid push identifier: {0:?}")]
    InvalidIdentifier(String),

    /// 2xx response that still reports the send as failed
    #[error("Push provider rejected notification: {0}")]
    Rejected(String),

    #[error("Push provider not configured: {0}")]
    NotConfigured(String),
}

/// Who receives a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushTarget {
    /// Every subscriber in a named segment
    Segment(String),
    /// The devices linked to one account id
    ExternalId(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PushMessage {
    pub target: PushTarget,
    pub title: String,
    pub body: String,
    pub url: Option<String>,
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushReceipt {
    pub id: String,
}

#[async_trait]
pub trait PushProvider: Send + Sync {
    async fn send(&self, message: &PushMessage) -> Result<PushReceipt, PushError>;

    /// Replace the given tags on the user identified by `external_id`
    async fn set_tags(&self, external_id: &str, tags: Map<String, Value>) -> Result<(), PushError>;

    /// Attach a device subscription to the user identified by `external_id`
    async fn link_subscription(&self, subscription_id: &str, external_id: &str) -> Result<(), PushError>;
}

/// OneSignal REST client
#[derive(Debug)]
pub struct HttpPushProvider {
    client: reqwest::Client,
    base_url: Url,
    app_id: String,
}

impl HttpPushProvider {
    pub fn new(config: &PushConfig, timeout_secs: u64) -> Result<Self, PushError> {
        let key = format!("Key {}", config.api_key);
        let client = super::build_client(Some(&key), timeout_secs).map_err(PushError::NotConfigured)?;
        let base_url = super::base_url(&config.base_url)
            .and_then(|raw| Url::parse(&raw).map_err(|e| e.to_string()))
            .map_err(PushError::NotConfigured)?;
        if base_url.cannot_be_a_base() {
            return Err(PushError::NotConfigured(format!("{} cannot be a base URL", base_url)));
        }

        Ok(Self {
            client,
            base_url,
            app_id: config.app_id.clone(),
        })
    }

    /// Base URL extended by `segments`, each percent-encoded as one path segment
    fn endpoint_url(&self, segments: &[&str]) -> Result<Url, PushError> {
        if let Some(bad) = segments.iter().copied().find(|s| matches!(*s, "" | "." | "..")) {
            return Err(PushError::InvalidIdentifier(bad.to_string()));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| PushError::NotConfigured(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn notification_body(&self, message: &PushMessage) -> Value {
        let mut body = json!({
            "app_id": self.app_id,
            "headings": { "en": message.title },
            "contents": { "en": message.body },
        });

        match &message.target {
            PushTarget::Segment(segment) => {
                body["included_segments"] = json!([segment]);
            }
            PushTarget::ExternalId(user_id) => {
                body["include_aliases"] = json!({ "external_id": [user_id] });
                body["target_channel"] = json!("push");
            }
        }
        if let Some(url) = &message.url {
            body["url"] = json!(url);
        }
        if let Some(data) = &message.data {
            body["data"] = data.clone();
        }
        body
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        endpoint: &'static str,
    ) -> Result<Value, PushError> {
        let resp = request
            .send()
            .await
            .map_err(|source| PushError::Http { endpoint, source })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|source| PushError::Http { endpoint, source })?;
        if !status.is_success() {
            return Err(PushError::Upstream {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body).unwrap_or(Value::Null))
    }
}

#[async_trait]
impl PushProvider for HttpPushProvider {
    async fn send(&self, message: &PushMessage) -> Result<PushReceipt, PushError> {
        let url = self.endpoint_url(&["notifications"])?;
        let request = self.client.post(url).json(&self.notification_body(message));
        let body = self.execute(request, "notifications").await?;

        match body.get("id").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => Ok(PushReceipt { id: id.to_string() }),
            _ => {
                let detail = body
                    .get("errors")
                    .map(Value::to_string)
                    .unwrap_or_else(|| "response carried no notification id".to_string());
                Err(PushError::Rejected(detail))
            }
        }
    }

    async fn set_tags(&self, external_id: &str, tags: Map<String, Value>) -> Result<(), PushError> {
        let url = self.endpoint_url(&["apps", self.app_id.as_str(), "users", "by", "external_id", external_id])?;
        let body = json!({ "properties": { "tags": tags } });
        self.execute(self.client.patch(url).json(&body), "users").await?;
        Ok(())
    }

    async fn link_subscription(&self, subscription_id: &str, external_id: &str) -> Result<(), PushError> {
        let url = self.endpoint_url(&["apps", self.app_id.as_str(), "subscriptions", subscription_id, "owner"])?;
        let body = json!({ "identity": { "external_id": external_id } });
        self.execute(self.client.patch(url).json(&body), "subscriptions").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn provider() -> HttpPushProvider {
        let mut config = AppConfig::development().push;
        config.app_id = "app-1".into();
        config.api_key = "secret".into();
        HttpPushProvider::new(&config, 5).unwrap()
    }

    #[test]
    fn broadcast_targets_segment() {
        let body = provider().notification_body(&PushMessage {
            target: PushTarget::Segment("Subscribed Users".into()),
            title: "Hello".into(),
            body: "World".into(),
            url: None,
            data: None,
        });
        assert_eq!(body["included_segments"], json!(["Subscribed Users"]));
        assert_eq!(body["headings"]["en"], "Hello");
        assert!(body.get("include_aliases").is_none());
        assert!(body.get("url").is_none());
    }

    #[test]
    fn direct_send_targets_external_id_on_push_channel() {
        let body = provider().notification_body(&PushMessage {
            target: PushTarget::ExternalId("user-9".into()),
            title: "Walk".into(),
            body: "Time for a walk".into(),
            url: Some("/reminders".into()),
            data: Some(json!({ "pet_id": "p1" })),
        });
        assert_eq!(body["include_aliases"], json!({ "external_id": ["user-9"] }));
        assert_eq!(body["target_channel"], "push");
        assert_eq!(body["url"], "/reminders");
        assert_eq!(body["data"]["pet_id"], "p1");
        assert!(body.get("included_segments").is_none());
    }

    #[test]
    fn ids_are_encoded_as_single_segments() {
        let url = provider()
            .endpoint_url(&["apps", "app-1", "subscriptions", "../x?y=#z", "owner"])
            .unwrap();
        assert_eq!(url.path(), "/apps/app-1/subscriptions/..%2Fx%3Fy=%23z/owner");
        assert!(url.query().is_none());
    }

    #[test]
    fn dot_segments_are_refused() {
        for bad in ["", ".", ".."] {
            let err = provider().endpoint_url(&["apps", "app-1", "subscriptions", bad]).unwrap_err();
            assert!(matches!(err, PushError::InvalidIdentifier(_)));
        }
    }
}

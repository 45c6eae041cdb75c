use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::IdentityConfig;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The provider has no account for this email or id
    #[error("No identity account for {0}")]
    UserNotFound(String),

    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: &'static str,
        source: reqwest::Error,
    },

    #[error("Identity provider {endpoint} returned {status}: {message}")]
    Upstream {
        endpoint: &'static str,
        status: u16,
        message: String,
    },

    #[error("Unexpected identity provider response: {0}")]
    InvalidResponse(String),

    #[error("Identity provider not configured: {0}")]
    NotConfigured(String),
}

/// Account operations delegated to the identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Issue a password-reset link for the account with this email
    async fn password_reset_link(&self, email: &str) -> Result<String, IdentityError>;

    /// Ask the provider to email the password-reset link itself
    async fn send_password_reset_email(&self, email: &str) -> Result<(), IdentityError>;

    /// `UserNotFound` when the account is already gone
    async fn delete_user(&self, uid: &str) -> Result<(), IdentityError>;
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OobCodeResponse {
    oob_link: Option<String>,
}

/// Identity Toolkit REST client (`accounts:sendOobCode`, `accounts:delete`)
#[derive(Debug)]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    accounts_url: String,
}

impl HttpIdentityProvider {
    pub fn new(config: &IdentityConfig, timeout_secs: u64) -> Result<Self, IdentityError> {
        let bearer = format!("Bearer {}", config.access_token);
        let client = super::build_client(Some(&bearer), timeout_secs).map_err(IdentityError::NotConfigured)?;
        let base = super::base_url(&config.base_url).map_err(IdentityError::NotConfigured)?;

        Ok(Self {
            client,
            accounts_url: format!("{}/v1/projects/{}/accounts", base, config.project_id),
        })
    }

    async fn post(
        &self,
        endpoint: &'static str,
        subject: &str,
        body: serde_json::Value,
    ) -> Result<reqwest::Response, IdentityError> {
        let url = format!("{}:{}", self.accounts_url, endpoint);
        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|source| IdentityError::Http { endpoint, source })?;

        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status().as_u16();
        let text = resp
            .text()
            .await
            .map_err(|source| IdentityError::Http { endpoint, source })?;
        let message = serde_json::from_str::<ErrorEnvelope>(&text)
            .map(|e| e.error.message)
            .unwrap_or(text);

        // Messages look like "EMAIL_NOT_FOUND" or "USER_NOT_FOUND : <detail>"
        if message.starts_with("EMAIL_NOT_FOUND") || message.starts_with("USER_NOT_FOUND") {
            return Err(IdentityError::UserNotFound(subject.to_string()));
        }
        Err(IdentityError::Upstream { endpoint, status, message })
    }

    async fn send_oob_code(&self, email: &str, return_link: bool) -> Result<OobCodeResponse, IdentityError> {
        let body = json!({
            "requestType": "PASSWORD_RESET",
            "email": email,
            "returnOobLink": return_link,
        });
        self.post("sendOobCode", email, body)
            .await?
            .json()
            .await
            .map_err(|e| IdentityError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn password_reset_link(&self, email: &str) -> Result<String, IdentityError> {
        self.send_oob_code(email, true)
            .await?
            .oob_link
            .ok_or_else(|| IdentityError::InvalidResponse("missing oobLink".to_string()))
    }

    async fn send_password_reset_email(&self, email: &str) -> Result<(), IdentityError> {
        self.send_oob_code(email, false).await.map(|_| ())
    }

    async fn delete_user(&self, uid: &str) -> Result<(), IdentityError> {
        self.post("delete", uid, json!({ "localId": uid })).await?;
        tracing::info!("Deleted identity account {}", uid);
        Ok(())
    }
}

//! Clients for the third-party services the API fronts. Credentials stay on
//! the server; browsers only ever talk to this service.

pub mod identity;
pub mod places;
pub mod push;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

pub use identity::{HttpIdentityProvider, IdentityError, IdentityProvider};
pub use places::{PlacesClient, PlacesError, Shelter, ShelterKind};
pub use push::{HttpPushProvider, PushError, PushMessage, PushProvider, PushReceipt, PushTarget};

/// Shared builder: JSON content type, optional `Authorization` value, request timeout
pub(crate) fn build_client(authorization: Option<&str>, timeout_secs: u64) -> Result<reqwest::Client, String> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(value) = authorization {
        let mut value = HeaderValue::from_str(value).map_err(|_| "invalid credential characters".to_string())?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .default_headers(headers)
        .build()
        .map_err(|e| format!("failed to build HTTP client: {e}"))
}

/// Normalized base URL without a trailing slash
pub(crate) fn base_url(raw: &str) -> Result<String, String> {
    url::Url::parse(raw).map_err(|e| format!("invalid base URL '{raw}': {e}"))?;
    Ok(raw.trim_end_matches('/').to_string())
}

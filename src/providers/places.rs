use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::PlacesConfig;

#[derive(Debug, thiserror::Error)]
pub enum PlacesError {
    #[error("{0}")]
    InvalidInput(String),

    /// Geocoding matched nothing
    #[error("No results found for '{0}'")]
    NoResults(String),

    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: &'static str,
        source: reqwest::Error,
    },

    #[error("Places provider {endpoint} returned HTTP {status}")]
    HttpStatus { endpoint: &'static str, status: u16 },

    /// Provider answered with a status other than OK / ZERO_RESULTS
    #[error("Places provider error ({status}): {message}")]
    Upstream { status: String, message: String },

    #[error("Places provider not configured: {0}")]
    NotConfigured(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Result<Self, PlacesError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(PlacesError::InvalidInput(format!(
                "Coordinates out of range: lat={}, lng={}",
                lat, lng
            )));
        }
        Ok(Self { lat, lng })
    }

    fn as_param(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShelterKind {
    Rescue,
    AdoptionCenter,
    WildlifeRehab,
    Shelter,
}

impl ShelterKind {
    /// First matching keyword in the lower-cased name wins
    pub fn classify(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("rescue") {
            ShelterKind::Rescue
        } else if name.contains("adoption") || name.contains("adopt") {
            ShelterKind::AdoptionCenter
        } else if name.contains("wildlife") || name.contains("rehab") {
            ShelterKind::WildlifeRehab
        } else {
            ShelterKind::Shelter
        }
    }
}

/// Normalized rescue/shelter search result. Every field is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shelter {
    pub id: String,
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub rating: f64,
    pub user_ratings_total: i64,
    pub open_now: bool,
    pub business_status: String,
    #[serde(rename = "type")]
    pub kind: ShelterKind,
}

impl Shelter {
    fn from_place(place: &Value) -> Self {
        let str_at = |pointer: &str| {
            place
                .pointer(pointer)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let f64_at = |pointer: &str| place.pointer(pointer).and_then(Value::as_f64).unwrap_or(0.0);

        let name = str_at("/name");
        Self {
            id: str_at("/place_id"),
            kind: ShelterKind::classify(&name),
            name,
            address: str_at("/formatted_address"),
            lat: f64_at("/geometry/location/lat"),
            lng: f64_at("/geometry/location/lng"),
            rating: f64_at("/rating"),
            user_ratings_total: place
                .pointer("/user_ratings_total")
                .and_then(Value::as_i64)
                .unwrap_or(0),
            open_now: place
                .pointer("/opening_hours/open_now")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            business_status: str_at("/business_status"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    status: String,
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    error_message: Option<String>,
}

/// Google Maps Web Services client for geocoding and place search
#[derive(Debug)]
pub struct PlacesClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    nearby_type: String,
    nearby_radius_m: u32,
    rescue_query: String,
    rescue_radius_m: u32,
}

impl PlacesClient {
    pub fn new(config: &PlacesConfig, timeout_secs: u64) -> Result<Self, PlacesError> {
        let client = super::build_client(None, timeout_secs).map_err(PlacesError::NotConfigured)?;
        let base_url = super::base_url(&config.base_url).map_err(PlacesError::NotConfigured)?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            nearby_type: config.nearby_type.clone(),
            nearby_radius_m: config.nearby_radius_m,
            rescue_query: config.rescue_query.clone(),
            rescue_radius_m: config.rescue_radius_m,
        })
    }

    /// Coordinates of the best match for a free-form address
    pub async fn geocode(&self, address: &str) -> Result<LatLng, PlacesError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(PlacesError::InvalidInput("address is required".to_string()));
        }

        let results = self.get("geocode/json", &[("address", address.to_string())]).await?;
        let location = results
            .first()
            .and_then(|r| r.pointer("/geometry/location"))
            .ok_or_else(|| PlacesError::NoResults(address.to_string()))?;

        let lat = location.get("lat").and_then(Value::as_f64);
        let lng = location.get("lng").and_then(Value::as_f64);
        match (lat, lng) {
            (Some(lat), Some(lng)) => Ok(LatLng { lat, lng }),
            _ => Err(PlacesError::Upstream {
                status: "OK".to_string(),
                message: "geocode result carried no location".to_string(),
            }),
        }
    }

    /// Veterinary clinics near a point; provider results are passed through as-is
    pub async fn nearby(&self, at: LatLng, keyword: Option<&str>) -> Result<Vec<Value>, PlacesError> {
        let mut params = vec![
            ("location", at.as_param()),
            ("radius", self.nearby_radius_m.to_string()),
            ("type", self.nearby_type.clone()),
        ];
        if let Some(keyword) = keyword.map(str::trim).filter(|k| !k.is_empty()) {
            params.push(("keyword", keyword.to_string()));
        }
        self.get("place/nearbysearch/json", &params).await
    }

    /// Rescues, shelters and adoption centers near a point
    pub async fn rescues(&self, at: LatLng) -> Result<Vec<Shelter>, PlacesError> {
        let params = [
            ("query", self.rescue_query.clone()),
            ("location", at.as_param()),
            ("radius", self.rescue_radius_m.to_string()),
        ];
        let results = self.get("place/textsearch/json", &params).await?;
        Ok(results.iter().map(Shelter::from_place).collect())
    }

    /// `ZERO_RESULTS` comes back as an empty list
    async fn get(&self, endpoint: &'static str, params: &[(&str, String)]) -> Result<Vec<Value>, PlacesError> {
        let url = format!("{}/maps/api/{}", self.base_url, endpoint);
        let resp = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|source| PlacesError::Http { endpoint, source })?;

        if !resp.status().is_success() {
            return Err(PlacesError::HttpStatus {
                endpoint,
                status: resp.status().as_u16(),
            });
        }

        let body: PlacesResponse = resp
            .json()
            .await
            .map_err(|source| PlacesError::Http { endpoint, source })?;

        match body.status.as_str() {
            "OK" => return Ok(body.results),
            "ZERO_RESULTS" => return Ok(vec![]),
            _ => {}
        }
        tracing::warn!("Places {} returned {}", endpoint, body.status);
        Err(PlacesError::Upstream {
            message: body.error_message.unwrap_or_else(|| body.status.clone()),
            status: body.status,
        })
    }
}

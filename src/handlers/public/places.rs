use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::middleware::{extract_json, ApiResponse, ApiResult};
use crate::providers::places::LatLng;
use crate::providers::Shelter;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GeocodeRequest {
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub query: Option<String>,
}

impl SearchRequest {
    fn location(&self) -> Result<LatLng, ApiError> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Ok(LatLng::new(lat, lng)?),
            _ => Err(ApiError::invalid_argument("lat and lng are required")),
        }
    }
}

/// POST /api/places/geocode - Address to coordinates of the best match
pub async fn geocode_post(
    State(state): State<AppState>,
    body: Result<Json<GeocodeRequest>, JsonRejection>,
) -> ApiResult<LatLng> {
    let req = extract_json(body)?;
    let address = req.address.unwrap_or_default();
    Ok(ApiResponse::success(state.places.geocode(&address).await?))
}

/// POST /api/places/nearby - Veterinary clinics around a point, provider fields untouched
pub async fn nearby_post(
    State(state): State<AppState>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<Vec<Value>> {
    let req = extract_json(body)?;
    let at = req.location()?;
    Ok(ApiResponse::success(state.places.nearby(at, req.query.as_deref()).await?))
}

/// POST /api/places/rescues - Shelters and rescues around a point, classified
pub async fn rescues_post(
    State(state): State<AppState>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<Vec<Shelter>> {
    let req = extract_json(body)?;
    let at = req.location()?;
    Ok(ApiResponse::success(state.places.rescues(at).await?))
}

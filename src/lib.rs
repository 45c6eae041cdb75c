pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod providers;
pub mod services;
pub mod state;

#[cfg(test)]
pub mod testing;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{Environment, SecurityConfig};
use crate::middleware::{jwt_auth_middleware, optional_auth_middleware};
use crate::state::AppState;

pub use crate::error::ApiError;

/// Full HTTP surface with global middleware applied
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(state.config.environment, &state.config.security);
    let body_limit = DefaultBodyLimit::max(state.config.api.max_request_size_bytes);

    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(places_routes())
        // Identity recorded when present
        .merge(entity_routes(state.clone()))
        // JWT required
        .merge(rpc_routes(state.clone()))
        // Global middleware
        .layer(body_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn places_routes() -> Router<AppState> {
    use handlers::public::places;

    Router::new()
        .route("/api/places/geocode", post(places::geocode_post))
        .route("/api/places/nearby", post(places::nearby_post))
        .route("/api/places/rescues", post(places::rescues_post))
}

fn entity_routes(state: AppState) -> Router<AppState> {
    use handlers::protected::{data, find};

    Router::new()
        // Collection-level operations
        .route(
            "/api/entities/:collection",
            get(data::collection_get).post(data::collection_post),
        )
        // Record-level operations
        .route(
            "/api/entities/:collection/:id",
            get(data::record_get)
                .patch(data::record_patch)
                .delete(data::record_delete),
        )
        // Equality-filtered find
        .route("/api/find/:collection", post(find::find_post))
        .route_layer(from_fn_with_state(state, optional_auth_middleware))
}

fn rpc_routes(state: AppState) -> Router<AppState> {
    use handlers::protected::rpc;

    Router::new()
        .route("/api/rpc/:operation", post(rpc::rpc_post))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(environment: Environment, security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if environment == Environment::Development {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "PetCare API",
            "version": version,
            "description": "Data-access and dispatch service for the PetCare app",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "places": "/api/places/geocode|nearby|rescues (public)",
                "entities": "/api/entities/:collection[/:id] (optional auth)",
                "find": "/api/find/:collection (optional auth)",
                "rpc": "/api/rpc/:operation (protected)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub filter: FilterConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub push: PushConfig,
    pub places: PlacesConfig,
    pub identity: IdentityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub max_limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
    pub upstream_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

/// Push notification provider (OneSignal REST API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    pub base_url: String,
    pub app_id: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub broadcast_segment: String,
}

/// Maps/places provider (Google Maps Web Services)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacesConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub nearby_type: String,
    pub nearby_radius_m: u32,
    pub rescue_query: String,
    pub rescue_radius_m: u32,
}

/// Identity provider (Identity Toolkit REST API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub base_url: String,
    pub project_id: String,
    #[serde(skip_serializing)]
    pub access_token: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("Invalid configuration for {0}: {1}")]
    Invalid(&'static str, String),
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Filter overrides
        if let Ok(v) = env::var("FILTER_MAX_LIMIT") {
            self.filter.max_limit = v.parse().ok();
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_BACKEND") {
            match v.to_ascii_lowercase().as_str() {
                "memory" => self.database.backend = StoreBackend::Memory,
                "postgres" | "postgresql" => self.database.backend = StoreBackend::Postgres,
                other => tracing::warn!("Ignoring unknown DATABASE_BACKEND '{}'", other),
            }
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Ok(v) = env::var("PORT") {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }
        if let Ok(v) = env::var("API_UPSTREAM_TIMEOUT_SECS") {
            self.api.upstream_timeout_secs = v.parse().unwrap_or(self.api.upstream_timeout_secs);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        // Push provider overrides
        if let Ok(v) = env::var("ONESIGNAL_API_URL") {
            self.push.base_url = v;
        }
        if let Ok(v) = env::var("ONESIGNAL_APP_ID") {
            self.push.app_id = v;
        }
        if let Ok(v) = env::var("ONESIGNAL_REST_API_KEY") {
            self.push.api_key = v;
        }
        if let Ok(v) = env::var("ONESIGNAL_BROADCAST_SEGMENT") {
            self.push.broadcast_segment = v;
        }

        // Places provider overrides
        if let Ok(v) = env::var("GOOGLE_MAPS_API_URL") {
            self.places.base_url = v;
        }
        if let Ok(v) = env::var("GOOGLE_MAPS_API_KEY") {
            self.places.api_key = v;
        }
        if let Ok(v) = env::var("PLACES_NEARBY_RADIUS_M") {
            self.places.nearby_radius_m = v.parse().unwrap_or(self.places.nearby_radius_m);
        }
        if let Ok(v) = env::var("PLACES_RESCUE_RADIUS_M") {
            self.places.rescue_radius_m = v.parse().unwrap_or(self.places.rescue_radius_m);
        }

        // Identity provider overrides
        if let Ok(v) = env::var("IDENTITY_API_URL") {
            self.identity.base_url = v;
        }
        if let Ok(v) = env::var("IDENTITY_PROJECT_ID") {
            self.identity.project_id = v;
        }
        if let Ok(v) = env::var("IDENTITY_ACCESS_TOKEN") {
            self.identity.access_token = v;
        }

        self
    }

    /// Fails when a credential or endpoint the service cannot run without is missing
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("JWT_SECRET", &self.security.jwt_secret),
            ("ONESIGNAL_APP_ID", &self.push.app_id),
            ("ONESIGNAL_REST_API_KEY", &self.push.api_key),
            ("GOOGLE_MAPS_API_KEY", &self.places.api_key),
            ("IDENTITY_PROJECT_ID", &self.identity.project_id),
            ("IDENTITY_ACCESS_TOKEN", &self.identity.access_token),
        ];
        let mut missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if self.database.backend == StoreBackend::Postgres && self.database.url.is_none() {
            missing.push("DATABASE_URL");
        }
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        for (name, raw) in [
            ("ONESIGNAL_API_URL", &self.push.base_url),
            ("GOOGLE_MAPS_API_URL", &self.places.base_url),
            ("IDENTITY_API_URL", &self.identity.base_url),
        ] {
            url::Url::parse(raw).map_err(|e| ConfigError::Invalid(name, e.to_string()))?;
        }
        Ok(())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            filter: FilterConfig {
                max_limit: Some(1000),
            },
            database: DatabaseConfig {
                backend: StoreBackend::Memory,
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
                upstream_timeout_secs: 30,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_secret: "petcare-development-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
            },
            push: PushConfig::defaults(),
            places: PlacesConfig::defaults(),
            identity: IdentityConfig::defaults(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            filter: FilterConfig {
                max_limit: Some(500),
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
                upstream_timeout_secs: 15,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.petcare.app".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
            },
            push: PushConfig::defaults(),
            places: PlacesConfig::defaults(),
            identity: IdentityConfig::defaults(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            filter: FilterConfig {
                max_limit: Some(100),
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            api: ApiConfig {
                port: 8080,
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
                upstream_timeout_secs: 10,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://petcare.app".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
            },
            push: PushConfig::defaults(),
            places: PlacesConfig::defaults(),
            identity: IdentityConfig::defaults(),
        }
    }
}

impl PushConfig {
    fn defaults() -> Self {
        Self {
            base_url: "https://api.onesignal.com".to_string(),
            app_id: String::new(),
            api_key: String::new(),
            broadcast_segment: "Subscribed Users".to_string(),
        }
    }
}

impl PlacesConfig {
    fn defaults() -> Self {
        Self {
            base_url: "https://maps.googleapis.com".to_string(),
            api_key: String::new(),
            nearby_type: "veterinary_care".to_string(),
            nearby_radius_m: 5000,
            rescue_query: "animal shelter OR animal rescue OR pet adoption".to_string(),
            rescue_radius_m: 50000,
        }
    }
}

impl IdentityConfig {
    fn defaults() -> Self {
        Self {
            base_url: "https://identitytoolkit.googleapis.com".to_string(),
            project_id: String::new(),
            access_token: String::new(),
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{validate_jwt, Claims};
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller extracted from the bearer token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
        }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match extract_jwt_from_headers(&headers) {
        Ok(Some(token)) => token,
        Ok(None) => return ApiError::unauthenticated("Missing Authorization header").into_response(),
        Err(msg) => return ApiError::unauthenticated(msg).into_response(),
    };

    match validate_jwt(&token, &state.config.security) {
        Ok(claims) => {
            request.extensions_mut().insert(AuthUser::from(claims));
            next.run(request).await
        }
        Err(e) => ApiError::unauthenticated(e.to_string()).into_response(),
    }
}

/// Like [`jwt_auth_middleware`], but lets requests without an Authorization
/// header through anonymously. A header that is present must still be valid.
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    match extract_jwt_from_headers(&headers) {
        Ok(None) => next.run(request).await,
        Ok(Some(token)) => match validate_jwt(&token, &state.config.security) {
            Ok(claims) => {
                request.extensions_mut().insert(AuthUser::from(claims));
                next.run(request).await
            }
            Err(e) => ApiError::unauthenticated(e.to_string()).into_response(),
        },
        Err(msg) => ApiError::unauthenticated(msg).into_response(),
    }
}

/// Extract JWT token from Authorization header; `Ok(None)` when the header is absent
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<Option<String>, String> {
    let Some(auth_header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(Some(token.trim().to_string()))
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

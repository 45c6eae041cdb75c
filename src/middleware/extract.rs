use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::Query;
use axum::Json;

use crate::error::ApiError;

/// Unwrap a JSON body, turning axum's plain-text rejection into `InvalidArgument`.
///
/// Handlers take `body: Result<Json<T>, JsonRejection>` and call this first.
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    result
        .map(|Json(value)| value)
        .map_err(|err| ApiError::invalid_argument(err.body_text()))
}

/// Same as [`extract_json`] for query strings
pub fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    result
        .map(|Query(value)| value)
        .map_err(|err| ApiError::invalid_argument(err.body_text()))
}

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use crate::database::Document;
use crate::filter::FilterData;
use crate::middleware::{extract_json, ApiResponse, ApiResult};
use crate::state::AppState;

/// POST /api/find/:collection - Equality-filtered find
///
/// Body: `{ "where": { "field": value, ... }, "order": "-created_at", "limit": 20 }`.
/// Every condition must hold; `$eq` is the only operator accepted.
pub async fn find_post(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    body: Result<Json<FilterData>, JsonRejection>,
) -> ApiResult<Vec<Document>> {
    let filter_data = extract_json(body)?;
    let repo = state.repository(&collection)?;
    let records = repo.find(filter_data).await?;
    Ok(ApiResponse::success(records))
}

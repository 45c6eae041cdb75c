use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::database::Document;
use crate::middleware::{extract_json, ApiResponse, ApiResult};
use crate::state::AppState;

use super::utils::ensure_writable;

/// GET /api/entities/:collection/:id - The record, or `null` when absent
pub async fn record_get(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> ApiResult<Option<Document>> {
    let repo = state.repository(&collection)?;
    Ok(ApiResponse::success(repo.get(&id).await?))
}

/// PATCH /api/entities/:collection/:id - Merge fields into an existing record
pub async fn record_patch(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Document> {
    ensure_writable(&collection)?;
    let body = extract_json(body)?;
    let repo = state.repository(&collection)?;

    let fields = Document::from_api_input(body)?;
    Ok(ApiResponse::success(repo.update(&id, fields).await?))
}

/// DELETE /api/entities/:collection/:id - Idempotent delete
pub async fn record_delete(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> ApiResult<Value> {
    ensure_writable(&collection)?;
    let repo = state.repository(&collection)?;

    repo.delete(&id).await?;
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}

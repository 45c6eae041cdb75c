use axum::{
    extract::{rejection::{JsonRejection, QueryRejection}, Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::database::Document;
use crate::middleware::{extract_json, extract_query, ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

use super::utils::{caller_id, ensure_writable};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// `field`, `-field` or `field desc`; legacy aliases accepted
    #[serde(alias = "sort")]
    pub order: Option<String>,
    pub limit: Option<i64>,
}

/// GET /api/entities/:collection - List records, most recent first by default
pub async fn collection_get(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Vec<Document>> {
    let query = extract_query(query)?;
    let repo = state.repository(&collection)?;
    let records = repo.list(query.order.as_deref(), query.limit).await?;
    Ok(ApiResponse::success(records))
}

/// POST /api/entities/:collection - Create a record; the server assigns id and audit fields
pub async fn collection_post(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    caller: Option<Extension<AuthUser>>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Document> {
    ensure_writable(&collection)?;
    let body = extract_json(body)?;
    let repo = state.repository(&collection)?;

    let fields = Document::from_api_input(body)?;
    let record = repo.create(fields, caller_id(&caller)).await?;
    Ok(ApiResponse::created(record))
}

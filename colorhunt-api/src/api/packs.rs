//! Pack endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use colorhunt_common::db::Pack;

use super::auth::AuthUser;
use super::extract::{ApiJson, ApiQuery};
use crate::error::ApiResult;
use crate::services::packs::{self, CreatePackRequest, UploadRequest};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPacksQuery {
    pub user_id: String,
}

/// POST /api/packs
pub async fn create_pack(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<CreatePackRequest>,
) -> ApiResult<(StatusCode, Json<Pack>)> {
    let pack = packs::create_pack(&state.db, &auth.user_id, &request).await?;
    Ok((StatusCode::CREATED, Json(pack)))
}

/// GET /api/packs?userId=
pub async fn list_user_packs(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UserPacksQuery>,
) -> ApiResult<Json<Vec<Pack>>> {
    Ok(Json(packs::list_user_packs(&state.db, &query.user_id).await?))
}

/// GET /api/packs/:pack_id
pub async fn get_pack(
    State(state): State<AppState>,
    Path(pack_id): Path<String>,
) -> ApiResult<Json<Pack>> {
    Ok(Json(packs::get_pack(&state.db, &pack_id).await?))
}

/// POST /api/upload
pub async fn record_upload(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<UploadRequest>,
) -> ApiResult<Json<Pack>> {
    let pack = packs::record_upload(
        &state.db,
        &auth.user_id,
        &request,
        state.transaction_max_wait_ms,
    )
    .await?;
    Ok(Json(pack))
}

pub fn pack_routes() -> Router<AppState> {
    Router::new()
        .route("/api/packs", post(create_pack).get(list_user_packs))
        .route("/api/packs/:pack_id", get(get_pack))
        .route("/api/upload", post(record_upload))
}

//! Profile endpoints

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};

use colorhunt_common::db::User;

use super::auth::{AuthUser, MaybeAuthUser};
use super::extract::ApiJson;
use crate::error::ApiResult;
use crate::services::profiles::{self, SyncProfileRequest, UserProfile};
use crate::AppState;

/// POST /api/auth/sync
pub async fn sync_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<SyncProfileRequest>,
) -> ApiResult<Json<User>> {
    let user = profiles::sync_profile(
        &state.db,
        &auth.user_id,
        &request,
        state.transaction_max_wait_ms,
    )
    .await?;
    Ok(Json(user))
}

/// GET /api/users/:user_id
pub async fn get_user(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserProfile>> {
    let viewer_id = viewer.as_ref().map(|auth| auth.user_id.as_str());
    Ok(Json(profiles::get_profile(&state.db, &user_id, viewer_id).await?))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/sync", post(sync_profile))
        .route("/api/users/:user_id", get(get_user))
}

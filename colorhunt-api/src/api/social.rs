//! Vote, like and follow endpoints

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;

use colorhunt_common::db::VoteState;

use super::auth::AuthUser;
use super::extract::ApiJson;
use crate::error::ApiResult;
use crate::services::counters::{self, FollowOutcome, VoteOutcome};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub pack_id: String,
    /// -1 down, 0 remove, 1 up
    pub vote: VoteState,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    pub pack_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowRequest {
    pub target_user_id: String,
}

/// POST /api/social/vote
pub async fn vote(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<VoteRequest>,
) -> ApiResult<Json<VoteOutcome>> {
    let outcome = counters::toggle_vote(
        &state.db,
        &auth.user_id,
        &request.pack_id,
        request.vote,
        state.transaction_max_wait_ms,
    )
    .await?;
    Ok(Json(outcome))
}

/// POST /api/social/like
pub async fn like(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<LikeRequest>,
) -> ApiResult<Json<VoteOutcome>> {
    let outcome = counters::toggle_like(
        &state.db,
        &auth.user_id,
        &request.pack_id,
        state.transaction_max_wait_ms,
    )
    .await?;
    Ok(Json(outcome))
}

/// POST /api/social/follow
pub async fn follow(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<FollowRequest>,
) -> ApiResult<Json<FollowOutcome>> {
    let outcome = counters::toggle_follow(
        &state.db,
        &auth.user_id,
        &request.target_user_id,
        state.transaction_max_wait_ms,
    )
    .await?;
    Ok(Json(outcome))
}

pub fn social_routes() -> Router<AppState> {
    Router::new()
        .route("/api/social/vote", post(vote))
        .route("/api/social/like", post(like))
        .route("/api/social/follow", post(follow))
}

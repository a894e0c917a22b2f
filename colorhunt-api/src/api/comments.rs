//! Comment endpoints

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Deserialize;

use colorhunt_common::db::Comment;

use super::auth::AuthUser;
use super::extract::{ApiJson, ApiQuery};
use crate::error::ApiResult;
use crate::services::counters::{self, CommentDeleted};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentListQuery {
    pub pack_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub pack_id: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteCommentQuery {
    pub id: String,
}

/// GET /api/social/comment?packId=
pub async fn list_comments(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CommentListQuery>,
) -> ApiResult<Json<Vec<Comment>>> {
    Ok(Json(counters::list_comments(&state.db, &query.pack_id).await?))
}

/// POST /api/social/comment
pub async fn add_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<NewComment>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let comment = counters::add_comment(
        &state.db,
        &auth.user_id,
        &request.pack_id,
        &request.text,
        state.transaction_max_wait_ms,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// DELETE /api/social/comment?id=
pub async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<DeleteCommentQuery>,
) -> ApiResult<Json<CommentDeleted>> {
    let deleted = counters::delete_comment(
        &state.db,
        &auth.user_id,
        &query.id,
        state.transaction_max_wait_ms,
    )
    .await?;
    Ok(Json(deleted))
}

pub fn comment_routes() -> Router<AppState> {
    Router::new().route(
        "/api/social/comment",
        get(list_comments).post(add_comment).delete(delete_comment),
    )
}

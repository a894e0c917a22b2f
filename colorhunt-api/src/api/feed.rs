//! Feed endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Deserialize;

use super::auth::MaybeAuthUser;
use super::extract::ApiQuery;
use crate::error::ApiResult;
use crate::services::feed::{self, FeedFilter, FeedItem};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    #[serde(default)]
    pub filter: FeedFilter,
}

/// GET /api/feed?filter=all|following
pub async fn get_feed(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    ApiQuery(query): ApiQuery<FeedQuery>,
) -> ApiResult<Json<Vec<FeedItem>>> {
    let viewer_id = viewer.as_ref().map(|auth| auth.user_id.as_str());
    Ok(Json(feed::load_feed(&state.db, viewer_id, query.filter).await?))
}

pub fn feed_routes() -> Router<AppState> {
    Router::new().route("/api/feed", get(get_feed))
}

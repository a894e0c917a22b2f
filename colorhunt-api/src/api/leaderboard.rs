//! Leaderboard endpoint

use axum::{extract::State, routing::get, Json, Router};

use crate::db::packs::{self, LeaderboardEntry};
use crate::error::ApiResult;
use crate::AppState;

const LEADERBOARD_SIZE: i64 = 50;

/// GET /api/leaderboard
pub async fn leaderboard(State(state): State<AppState>) -> ApiResult<Json<Vec<LeaderboardEntry>>> {
    let mut conn = state.db.acquire().await.map_err(colorhunt_common::Error::from)?;
    Ok(Json(packs::leaderboard(&mut conn, LEADERBOARD_SIZE).await?))
}

pub fn leaderboard_routes() -> Router<AppState> {
    Router::new().route("/api/leaderboard", get(leaderboard))
}

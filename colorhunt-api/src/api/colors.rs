//! Color catalog endpoint

use axum::{extract::State, routing::get, Json, Router};

use colorhunt_common::db::ColorOption;

use crate::db::colors;
use crate::error::ApiResult;
use crate::AppState;

/// GET /api/colors
pub async fn list_colors(State(state): State<AppState>) -> ApiResult<Json<Vec<ColorOption>>> {
    let mut conn = state.db.acquire().await.map_err(colorhunt_common::Error::from)?;
    Ok(Json(colors::list_colors(&mut conn).await?))
}

pub fn color_routes() -> Router<AppState> {
    Router::new().route("/api/colors", get(list_colors))
}

//! Verification endpoint

use axum::{extract::State, routing::post, Json, Router};

use super::extract::ApiJson;
use crate::error::ApiResult;
use crate::services::cell_verification::{self, VerificationOutcome, VerifyRequest};
use crate::AppState;

/// POST /api/verify
///
/// Fetches the image, scores it against the pack's target color and records
/// the verdict. Unreadable images answer 422 and leave the slot untouched.
pub async fn verify(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VerifyRequest>,
) -> ApiResult<Json<VerificationOutcome>> {
    let outcome = cell_verification::verify_cell(
        &state.db,
        state.images.as_ref(),
        &request,
        state.transaction_max_wait_ms,
    )
    .await?;
    Ok(Json(outcome))
}

pub fn verify_routes() -> Router<AppState> {
    Router::new().route("/api/verify", post(verify))
}

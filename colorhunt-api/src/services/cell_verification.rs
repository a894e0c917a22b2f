//! Cell verification
//!
//! Drives a slot from Pending to Verified or Failed. The image is fetched
//! and scored outside any transaction; the verdict, the verified recount and
//! the completion flip are then committed together, so two last-slot
//! verifications racing each other produce exactly one completion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use colorhunt_common::db::{PackStatus, SlotIndex, TargetColor, GRID_SIZE};
use colorhunt_common::{time, Error, Result};

use super::color_scorer::{self, ColorMatch};
use super::hue_classifier::HueRange;
use super::image_source::{validate_image_url, ImageSource};
use crate::db::{cells, packs};
use crate::utils::{begin_monitored, retry_on_conflict};

/// Request to verify one slot
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub pack_id: String,
    #[serde(alias = "cellPosition")]
    pub slot_index: SlotIndex,
    pub image_url: String,
    pub target_color: TargetColor,
}

/// Outcome of a verification call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationOutcome {
    pub pack_id: String,
    pub slot_index: SlotIndex,
    pub matched: bool,
    pub match_score: f64,
    pub dominant_color_hex: String,
    /// False when the verdict was not written (slot re-uploaded meanwhile, or pack already complete)
    pub recorded: bool,
    pub pack_status: PackStatus,
    pub verified_count: i64,
    /// True only for the call that flipped the pack to complete
    pub completed_now: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Verify an image for a slot and record the verdict
///
/// The slot must hold an upload. Fetch and decode failures are returned
/// before anything is written, so the slot keeps its previous state.
pub async fn verify_cell(
    db: &SqlitePool,
    images: &dyn ImageSource,
    request: &VerifyRequest,
    max_wait_ms: u64,
) -> Result<VerificationOutcome> {
    if request.pack_id.trim().is_empty() {
        return Err(Error::InvalidInput("packId is required".to_string()));
    }
    validate_image_url(&request.image_url)?;
    request.target_color.validate()?;

    let pack = {
        let mut conn = db.acquire().await?;
        let pack = packs::require_pack_header(&mut conn, &request.pack_id).await?;
        if cells::load_cell(&mut conn, &request.pack_id, request.slot_index)
            .await?
            .is_none()
        {
            return Err(no_upload(&request.pack_id, request.slot_index));
        }
        pack
    };

    if !pack.target_color.same_range(&request.target_color) {
        return Err(Error::InvalidInput(format!(
            "targetColor does not match pack {} ({} to {})",
            pack.id, pack.target_color.hue_min, pack.target_color.hue_max
        )));
    }

    tracing::info!(
        pack_id = %request.pack_id,
        slot = %request.slot_index,
        "Verifying image"
    );

    let image = images.fetch_image(&request.image_url).await?;

    let range = HueRange::from_target(&pack.target_color);
    let color_match = tokio::task::spawn_blocking(move || color_scorer::score_image(&image, &range))
        .await
        .map_err(|e| Error::Internal(format!("Scoring task failed: {}", e)))??;

    tracing::info!(
        pack_id = %request.pack_id,
        slot = %request.slot_index,
        match_score = color_match.match_score,
        matched = color_match.passes(),
        dominant_color_hex = %color_match.dominant_color_hex,
        "Image scored"
    );

    retry_on_conflict("record_verdict", max_wait_ms, || {
        record_verdict(
            db,
            &request.pack_id,
            request.slot_index,
            &request.image_url,
            &color_match,
        )
    })
    .await
}

/// Write a scored verdict, recount, and flip the pack if this was the ninth pass
///
/// One transaction; rerun as a whole on conflict.
pub async fn record_verdict(
    db: &SqlitePool,
    pack_id: &str,
    slot: SlotIndex,
    image_url: &str,
    color_match: &ColorMatch,
) -> Result<VerificationOutcome> {
    let mut tx = begin_monitored(db, "cell_verification::record_verdict").await?;

    let pack = packs::require_pack_header(tx.conn(), pack_id).await?;
    let current = cells::load_cell(tx.conn(), pack_id, slot).await?;

    let mut outcome = VerificationOutcome {
        pack_id: pack_id.to_string(),
        slot_index: slot,
        matched: color_match.passes(),
        match_score: color_match.match_score,
        dominant_color_hex: color_match.dominant_color_hex.clone(),
        recorded: false,
        pack_status: pack.status,
        verified_count: 0,
        completed_now: false,
        completed_at: pack.completed_at,
    };

    // Only an owner upload creates a cell; verification never does
    let Some(current) = current else {
        tx.rollback().await?;
        return Err(no_upload(pack_id, slot));
    };
    let stale = current.image_url != image_url;

    if pack.status == PackStatus::Complete || stale {
        if stale {
            tracing::warn!(
                pack_id = %pack_id,
                slot = %slot,
                "Slot was re-uploaded during verification, verdict discarded"
            );
        } else {
            tracing::debug!(pack_id = %pack_id, slot = %slot, "Pack already complete, verdict not recorded");
        }
        outcome.verified_count = cells::count_verified(tx.conn(), pack_id).await?;
        tx.rollback().await?;
        return Ok(outcome);
    }

    let now = time::now();
    outcome.recorded = cells::write_verdict(
        tx.conn(),
        pack_id,
        slot,
        image_url,
        outcome.matched,
        &outcome.dominant_color_hex,
        &now,
    )
    .await?;

    outcome.verified_count = cells::count_verified(tx.conn(), pack_id).await?;

    if outcome.verified_count >= GRID_SIZE as i64 && packs::mark_complete(tx.conn(), pack_id, &now).await? {
        outcome.pack_status = PackStatus::Complete;
        outcome.completed_at = Some(now);
        outcome.completed_now = true;
    }

    tx.commit().await?;

    if outcome.completed_now {
        tracing::info!(
            pack_id = %pack_id,
            verified_count = outcome.verified_count,
            "Pack complete"
        );
    }

    Ok(outcome)
}

fn no_upload(pack_id: &str, slot: SlotIndex) -> Error {
    Error::InvalidInput(format!("Slot {} of pack {} has no upload", slot, pack_id))
}

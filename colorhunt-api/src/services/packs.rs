//! Pack creation and uploads

use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use colorhunt_common::db::{Pack, PackStatus, SlotIndex, TargetColor};
use colorhunt_common::{time, Error, Result};

use super::image_source::validate_image_url;
use crate::db::{cells, colors, packs};
use crate::utils::{begin_monitored, retry_on_conflict};

/// New pack request; the target comes from the catalog or is given inline
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePackRequest {
    #[serde(alias = "targetColorId")]
    pub color_id: Option<String>,
    pub target_color: Option<TargetColor>,
}

/// Upload record request: the image is already in blob storage
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub pack_id: String,
    #[serde(alias = "cellPosition")]
    pub slot_index: SlotIndex,
    pub image_url: String,
}

pub async fn create_pack(db: &SqlitePool, owner_user_id: &str, request: &CreatePackRequest) -> Result<Pack> {
    let mut conn = db.acquire().await?;

    let (color_id, target) = match (&request.color_id, &request.target_color) {
        (Some(color_id), _) => {
            let color = colors::load_color(&mut conn, color_id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Color {} not found", color_id)))?;
            (Some(color.id.clone()), color.target())
        }
        (None, Some(target)) => {
            target.validate()?;
            (None, target.clone())
        }
        (None, None) => {
            return Err(Error::InvalidInput(
                "colorId or targetColor is required".to_string(),
            ))
        }
    };

    let pack = Pack::new(
        Uuid::new_v4().to_string(),
        owner_user_id,
        color_id,
        target,
        time::now(),
    );
    packs::insert_pack(&mut conn, &pack).await?;

    tracing::info!(
        pack_id = %pack.id,
        user_id = %owner_user_id,
        color = %pack.target_color.name,
        "Pack created"
    );

    Ok(pack)
}

/// Pack with all recorded cells
pub async fn get_pack(db: &SqlitePool, pack_id: &str) -> Result<Pack> {
    let mut conn = db.acquire().await?;
    packs::load_pack(&mut conn, pack_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Pack {} not found", pack_id)))
}

pub async fn list_user_packs(db: &SqlitePool, owner_user_id: &str) -> Result<Vec<Pack>> {
    if owner_user_id.trim().is_empty() {
        return Err(Error::InvalidInput("userId is required".to_string()));
    }
    let mut conn = db.acquire().await?;
    packs::list_packs_by_owner(&mut conn, owner_user_id).await
}

/// Point a slot at a newly stored image and return it to Pending
///
/// Only the owner may upload, and only while the pack is active.
pub async fn record_upload(
    db: &SqlitePool,
    actor_id: &str,
    request: &UploadRequest,
    max_wait_ms: u64,
) -> Result<Pack> {
    if request.pack_id.trim().is_empty() {
        return Err(Error::InvalidInput("packId is required".to_string()));
    }
    validate_image_url(&request.image_url)?;

    retry_on_conflict("record_upload", max_wait_ms, || {
        record_upload_once(db, actor_id, request)
    })
    .await
}

async fn record_upload_once(db: &SqlitePool, actor_id: &str, request: &UploadRequest) -> Result<Pack> {
    let mut tx = begin_monitored(db, "packs::record_upload").await?;

    let pack = packs::require_pack_header(tx.conn(), &request.pack_id).await?;
    if pack.owner_user_id != actor_id {
        return Err(Error::Forbidden(format!(
            "Pack {} belongs to another user",
            pack.id
        )));
    }
    if pack.status == PackStatus::Complete {
        return Err(Error::Conflict(format!(
            "Pack {} is already complete",
            pack.id
        )));
    }

    cells::upsert_pending(
        tx.conn(),
        &request.pack_id,
        request.slot_index,
        &request.image_url,
        &time::now(),
    )
    .await?;

    let pack = packs::load_pack(tx.conn(), &request.pack_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Pack {} not found", request.pack_id)))?;

    tx.commit().await?;

    tracing::info!(
        pack_id = %request.pack_id,
        slot = %request.slot_index,
        user_id = %actor_id,
        "Upload recorded"
    );

    Ok(pack)
}

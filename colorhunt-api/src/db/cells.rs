//! Pack cell persistence

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use std::collections::BTreeMap;

use colorhunt_common::db::{CellRecord, SlotIndex};
use colorhunt_common::time::{from_db_optional, from_db_string, to_db_string};
use colorhunt_common::Result;

fn cell_from_row(row: &SqliteRow) -> Result<(SlotIndex, CellRecord)> {
    let slot: i64 = row.get("slot_index");
    let verified: i64 = row.get("verified");
    let uploaded_at: String = row.get("uploaded_at");

    Ok((
        SlotIndex::new(slot)?,
        CellRecord {
            image_url: row.get("image_url"),
            verified: verified != 0,
            dominant_color_hex: row.get("dominant_color_hex"),
            uploaded_at: from_db_string(&uploaded_at)?,
            analyzed_at: from_db_optional(row.get("analyzed_at"))?,
        },
    ))
}

/// All recorded cells of a pack keyed by slot
pub async fn load_cells(
    conn: &mut SqliteConnection,
    pack_id: &str,
) -> Result<BTreeMap<SlotIndex, CellRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT slot_index, image_url, verified, dominant_color_hex, uploaded_at, analyzed_at
        FROM pack_cells
        WHERE pack_id = ?
        ORDER BY slot_index
        "#,
    )
    .bind(pack_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(cell_from_row).collect()
}

/// One cell, if recorded
pub async fn load_cell(
    conn: &mut SqliteConnection,
    pack_id: &str,
    slot: SlotIndex,
) -> Result<Option<CellRecord>> {
    let row = sqlx::query(
        r#"
        SELECT slot_index, image_url, verified, dominant_color_hex, uploaded_at, analyzed_at
        FROM pack_cells
        WHERE pack_id = ? AND slot_index = ?
        "#,
    )
    .bind(pack_id)
    .bind(i64::from(slot))
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row
        .as_ref()
        .map(cell_from_row)
        .transpose()?
        .map(|(_, cell)| cell))
}

/// Record a new upload, resetting the slot to pending
pub async fn upsert_pending(
    conn: &mut SqliteConnection,
    pack_id: &str,
    slot: SlotIndex,
    image_url: &str,
    uploaded_at: &DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO pack_cells (pack_id, slot_index, image_url, verified, dominant_color_hex, uploaded_at, analyzed_at)
        VALUES (?, ?, ?, 0, NULL, ?, NULL)
        ON CONFLICT(pack_id, slot_index) DO UPDATE SET
            image_url = excluded.image_url,
            verified = 0,
            dominant_color_hex = NULL,
            uploaded_at = excluded.uploaded_at,
            analyzed_at = NULL
        "#,
    )
    .bind(pack_id)
    .bind(i64::from(slot))
    .bind(image_url)
    .bind(to_db_string(uploaded_at))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Write a verification verdict onto the uploaded image it was computed for
///
/// Returns false when the slot holds no upload of `image_url`; nothing is
/// written in that case.
pub async fn write_verdict(
    conn: &mut SqliteConnection,
    pack_id: &str,
    slot: SlotIndex,
    image_url: &str,
    verified: bool,
    dominant_color_hex: &str,
    analyzed_at: &DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE pack_cells
        SET verified = ?, dominant_color_hex = ?, analyzed_at = ?
        WHERE pack_id = ? AND slot_index = ? AND image_url = ?
        "#,
    )
    .bind(verified as i64)
    .bind(dominant_color_hex)
    .bind(to_db_string(analyzed_at))
    .bind(pack_id)
    .bind(i64::from(slot))
    .bind(image_url)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Number of verified cells in a pack
pub async fn count_verified(conn: &mut SqliteConnection, pack_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM pack_cells WHERE pack_id = ? AND verified = 1",
    )
    .bind(pack_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(count)
}

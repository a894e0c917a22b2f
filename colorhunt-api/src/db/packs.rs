//! Pack persistence

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use colorhunt_common::db::{Pack, PackStatus, TargetColor};
use colorhunt_common::time::{from_db_optional, from_db_string, to_db_string};
use colorhunt_common::{Error, Result};

use super::cells;

const PACK_COLUMNS: &str = "id, owner_user_id, color_id, target_name, target_hex, hue_min, hue_max, \
     status, likes_count, comments_count, created_at, completed_at";

fn pack_from_row(row: &SqliteRow) -> Result<Pack> {
    let status: String = row.get("status");
    let created_at: String = row.get("created_at");

    Ok(Pack {
        id: row.get("id"),
        owner_user_id: row.get("owner_user_id"),
        color_id: row.get("color_id"),
        target_color: TargetColor {
            name: row.get("target_name"),
            hex: row.get("target_hex"),
            hue_min: row.get("hue_min"),
            hue_max: row.get("hue_max"),
        },
        status: status.parse()?,
        likes_count: row.get("likes_count"),
        comments_count: row.get("comments_count"),
        created_at: from_db_string(&created_at)?,
        completed_at: from_db_optional(row.get("completed_at"))?,
        cells: Default::default(),
    })
}

/// Insert a new pack (cells are written separately)
pub async fn insert_pack(conn: &mut SqliteConnection, pack: &Pack) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO packs (
            id, owner_user_id, color_id, target_name, target_hex, hue_min, hue_max,
            status, likes_count, comments_count, created_at, completed_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&pack.id)
    .bind(&pack.owner_user_id)
    .bind(&pack.color_id)
    .bind(&pack.target_color.name)
    .bind(&pack.target_color.hex)
    .bind(pack.target_color.hue_min)
    .bind(pack.target_color.hue_max)
    .bind(pack.status.as_str())
    .bind(pack.likes_count)
    .bind(pack.comments_count)
    .bind(to_db_string(&pack.created_at))
    .bind(pack.completed_at.as_ref().map(to_db_string))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Load a pack without its cells
pub async fn load_pack_header(conn: &mut SqliteConnection, pack_id: &str) -> Result<Option<Pack>> {
    let row = sqlx::query(&format!("SELECT {} FROM packs WHERE id = ?", PACK_COLUMNS))
        .bind(pack_id)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(pack_from_row).transpose()
}

/// Load a pack with all recorded cells
pub async fn load_pack(conn: &mut SqliteConnection, pack_id: &str) -> Result<Option<Pack>> {
    let Some(mut pack) = load_pack_header(&mut *conn, pack_id).await? else {
        return Ok(None);
    };
    pack.cells = cells::load_cells(&mut *conn, pack_id).await?;
    Ok(Some(pack))
}

/// Load a pack or fail with `NotFound`
pub async fn require_pack_header(conn: &mut SqliteConnection, pack_id: &str) -> Result<Pack> {
    load_pack_header(conn, pack_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Pack {} not found", pack_id)))
}

/// A user's packs, newest first, with cells
pub async fn list_packs_by_owner(conn: &mut SqliteConnection, owner_user_id: &str) -> Result<Vec<Pack>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM packs WHERE owner_user_id = ? ORDER BY created_at DESC, id",
        PACK_COLUMNS
    ))
    .bind(owner_user_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut packs = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut pack = pack_from_row(row)?;
        pack.cells = cells::load_cells(&mut *conn, &pack.id).await?;
        packs.push(pack);
    }
    Ok(packs)
}

/// Most recently completed packs, with cells
///
/// With `followed_by`, only packs owned by users that account follows.
pub async fn list_completed(
    conn: &mut SqliteConnection,
    followed_by: Option<&str>,
    limit: i64,
) -> Result<Vec<Pack>> {
    let following_clause = if followed_by.is_some() {
        "AND owner_user_id IN (SELECT following_id FROM follows WHERE follower_id = ?)"
    } else {
        ""
    };
    let sql = format!(
        "SELECT {} FROM packs WHERE status = ? {} ORDER BY completed_at DESC, id LIMIT ?",
        PACK_COLUMNS, following_clause
    );

    let mut query = sqlx::query(&sql).bind(PackStatus::Complete.as_str());
    if let Some(follower) = followed_by {
        query = query.bind(follower);
    }
    let rows = query.bind(limit).fetch_all(&mut *conn).await?;

    let mut packs = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut pack = pack_from_row(row)?;
        pack.cells = cells::load_cells(&mut *conn, &pack.id).await?;
        packs.push(pack);
    }
    Ok(packs)
}

/// Flip a pack to complete
///
/// Returns false when the pack was already complete; `completed_at` is
/// only ever written by the first flip.
pub async fn mark_complete(
    conn: &mut SqliteConnection,
    pack_id: &str,
    completed_at: &DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE packs SET status = ?, completed_at = ? WHERE id = ? AND status <> ?",
    )
    .bind(PackStatus::Complete.as_str())
    .bind(to_db_string(completed_at))
    .bind(pack_id)
    .bind(PackStatus::Complete.as_str())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Apply a delta to `likes_count` and return the new value
pub async fn adjust_likes(conn: &mut SqliteConnection, pack_id: &str, delta: i64) -> Result<i64> {
    sqlx::query_scalar::<_, i64>("UPDATE packs SET likes_count = likes_count + ? WHERE id = ? RETURNING likes_count")
        .bind(delta)
        .bind(pack_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Pack {} not found", pack_id)))
}

/// Apply a delta to `comments_count` and return the new value
pub async fn adjust_comments(conn: &mut SqliteConnection, pack_id: &str, delta: i64) -> Result<i64> {
    sqlx::query_scalar::<_, i64>(
        "UPDATE packs SET comments_count = comments_count + ? WHERE id = ? RETURNING comments_count",
    )
    .bind(delta)
    .bind(pack_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Pack {} not found", pack_id)))
}

// ============================================================================
// Leaderboard
// ============================================================================

/// Completed-pack tally for one user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub completed_packs: i64,
}

/// Users ranked by number of complete packs (ties broken by user id)
pub async fn leaderboard(conn: &mut SqliteConnection, limit: i64) -> Result<Vec<LeaderboardEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT p.owner_user_id AS user_id,
               u.display_name AS display_name,
               u.photo_url AS photo_url,
               COUNT(*) AS completed_packs
        FROM packs p
        LEFT JOIN users u ON u.id = p.owner_user_id
        WHERE p.status = 'complete'
        GROUP BY p.owner_user_id
        ORDER BY completed_packs DESC, p.owner_user_id
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .iter()
        .map(|row| LeaderboardEntry {
            user_id: row.get("user_id"),
            display_name: row.get("display_name"),
            photo_url: row.get("photo_url"),
            completed_packs: row.get("completed_packs"),
        })
        .collect())
}

//! Vote edge persistence

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use colorhunt_common::db::VoteValue;
use colorhunt_common::time::to_db_string;
use colorhunt_common::Result;

/// Current edge of `user_id` on `pack_id`
///
/// Stored values go through `VoteValue::from_stored`, so legacy rows without
/// a value read as up-votes.
pub async fn load_vote(
    conn: &mut SqliteConnection,
    pack_id: &str,
    user_id: &str,
) -> Result<Option<VoteValue>> {
    let stored = sqlx::query_scalar::<_, Option<i64>>(
        "SELECT vote FROM votes WHERE pack_id = ? AND user_id = ?",
    )
    .bind(pack_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(stored.map(VoteValue::from_stored))
}

pub async fn insert_vote(
    conn: &mut SqliteConnection,
    pack_id: &str,
    user_id: &str,
    vote: VoteValue,
    at: &DateTime<Utc>,
) -> Result<()> {
    let at = to_db_string(at);
    sqlx::query(
        "INSERT INTO votes (pack_id, user_id, vote, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(pack_id)
    .bind(user_id)
    .bind(vote.as_i64())
    .bind(&at)
    .bind(&at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn update_vote(
    conn: &mut SqliteConnection,
    pack_id: &str,
    user_id: &str,
    vote: VoteValue,
    at: &DateTime<Utc>,
) -> Result<()> {
    sqlx::query("UPDATE votes SET vote = ?, updated_at = ? WHERE pack_id = ? AND user_id = ?")
        .bind(vote.as_i64())
        .bind(to_db_string(at))
        .bind(pack_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

pub async fn delete_vote(conn: &mut SqliteConnection, pack_id: &str, user_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM votes WHERE pack_id = ? AND user_id = ?")
        .bind(pack_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Sum of edge values for a pack, legacy rows counting +1
///
/// Always equals the pack's `likes_count`.
pub async fn sum_votes(conn: &mut SqliteConnection, pack_id: &str) -> Result<i64> {
    let sum = sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(SUM(CASE WHEN vote < 0 THEN -1 ELSE 1 END), 0) FROM votes WHERE pack_id = ?",
    )
    .bind(pack_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(sum)
}

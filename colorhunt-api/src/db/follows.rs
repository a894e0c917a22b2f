//! Follow edge persistence

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use colorhunt_common::time::to_db_string;
use colorhunt_common::Result;

pub async fn follow_exists(
    conn: &mut SqliteConnection,
    follower_id: &str,
    following_id: &str,
) -> Result<bool> {
    let found = sqlx::query_scalar::<_, i64>(
        "SELECT 1 FROM follows WHERE follower_id = ? AND following_id = ?",
    )
    .bind(follower_id)
    .bind(following_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(found.is_some())
}

pub async fn insert_follow(
    conn: &mut SqliteConnection,
    follower_id: &str,
    following_id: &str,
    at: &DateTime<Utc>,
) -> Result<()> {
    sqlx::query("INSERT INTO follows (follower_id, following_id, created_at) VALUES (?, ?, ?)")
        .bind(follower_id)
        .bind(following_id)
        .bind(to_db_string(at))
        .execute(&mut *conn)
        .await?;

    Ok(())
}

pub async fn delete_follow(
    conn: &mut SqliteConnection,
    follower_id: &str,
    following_id: &str,
) -> Result<()> {
    sqlx::query("DELETE FROM follows WHERE follower_id = ? AND following_id = ?")
        .bind(follower_id)
        .bind(following_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// (followers, following) edge counts for a user, straight from the edges
pub async fn count_edges(conn: &mut SqliteConnection, user_id: &str) -> Result<(i64, i64)> {
    let followers = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE following_id = ?")
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;
    let following = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE follower_id = ?")
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

    Ok((followers, following))
}

//! User profile persistence

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use colorhunt_common::db::User;
use colorhunt_common::time::{from_db_optional, from_db_string, to_db_string};
use colorhunt_common::{Error, Result};

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let created_at: String = row.get("created_at");
    Ok(User {
        id: row.get("id"),
        display_name: row.get("display_name"),
        photo_url: row.get("photo_url"),
        followers_count: row.get("followers_count"),
        following_count: row.get("following_count"),
        created_at: from_db_string(&created_at)?,
        last_login_at: from_db_optional(row.get("last_login_at"))?,
    })
}

pub async fn load_user(conn: &mut SqliteConnection, user_id: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT id, display_name, photo_url, followers_count, following_count, created_at, last_login_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.as_ref().map(user_from_row).transpose()
}

pub async fn user_exists(conn: &mut SqliteConnection, user_id: &str) -> Result<bool> {
    let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(found.is_some())
}

/// Id of the user holding `display_name`, if any
pub async fn find_by_display_name(
    conn: &mut SqliteConnection,
    display_name: &str,
) -> Result<Option<String>> {
    let id = sqlx::query_scalar::<_, String>("SELECT id FROM users WHERE display_name = ?")
        .bind(display_name)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(id)
}

/// Create or refresh a profile; `created_at` is kept on existing rows
pub async fn upsert_profile(
    conn: &mut SqliteConnection,
    user_id: &str,
    display_name: Option<&str>,
    photo_url: Option<&str>,
    at: &DateTime<Utc>,
) -> Result<()> {
    let at = to_db_string(at);
    sqlx::query(
        r#"
        INSERT INTO users (id, display_name, photo_url, followers_count, following_count, created_at, last_login_at)
        VALUES (?, ?, ?, 0, 0, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            display_name = excluded.display_name,
            photo_url = excluded.photo_url,
            last_login_at = excluded.last_login_at
        "#,
    )
    .bind(user_id)
    .bind(display_name)
    .bind(photo_url)
    .bind(&at)
    .bind(&at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Move `followers_count` of the followed user and `following_count` of the
/// follower by the same delta
pub async fn adjust_follow_counts(
    conn: &mut SqliteConnection,
    follower_id: &str,
    following_id: &str,
    delta: i64,
) -> Result<(i64, i64)> {
    let following_count = sqlx::query_scalar::<_, i64>(
        "UPDATE users SET following_count = following_count + ? WHERE id = ? RETURNING following_count",
    )
    .bind(delta)
    .bind(follower_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| Error::NotFound(format!("User {} not found", follower_id)))?;

    let followers_count = sqlx::query_scalar::<_, i64>(
        "UPDATE users SET followers_count = followers_count + ? WHERE id = ? RETURNING followers_count",
    )
    .bind(delta)
    .bind(following_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| Error::NotFound(format!("User {} not found", following_id)))?;

    Ok((following_count, followers_count))
}

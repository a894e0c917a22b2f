//! Comment persistence

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use colorhunt_common::db::Comment;
use colorhunt_common::time::{from_db_string, to_db_string};
use colorhunt_common::Result;

fn comment_from_row(row: &SqliteRow) -> Result<Comment> {
    let created_at: String = row.get("created_at");
    Ok(Comment {
        id: row.get("id"),
        pack_id: row.get("pack_id"),
        user_id: row.get("user_id"),
        text: row.get("text"),
        user_display_name: row.get("user_display_name"),
        user_photo_url: row.get("user_photo_url"),
        created_at: from_db_string(&created_at)?,
    })
}

pub async fn insert_comment(conn: &mut SqliteConnection, comment: &Comment) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO comments (id, pack_id, user_id, text, user_display_name, user_photo_url, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&comment.id)
    .bind(&comment.pack_id)
    .bind(&comment.user_id)
    .bind(&comment.text)
    .bind(&comment.user_display_name)
    .bind(&comment.user_photo_url)
    .bind(to_db_string(&comment.created_at))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn load_comment(conn: &mut SqliteConnection, comment_id: &str) -> Result<Option<Comment>> {
    let row = sqlx::query(
        r#"
        SELECT id, pack_id, user_id, text, user_display_name, user_photo_url, created_at
        FROM comments
        WHERE id = ?
        "#,
    )
    .bind(comment_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.as_ref().map(comment_from_row).transpose()
}

/// Returns true when a row was removed
pub async fn delete_comment(conn: &mut SqliteConnection, comment_id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(comment_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Newest comments on a pack
pub async fn list_comments(
    conn: &mut SqliteConnection,
    pack_id: &str,
    limit: i64,
) -> Result<Vec<Comment>> {
    let rows = sqlx::query(
        r#"
        SELECT id, pack_id, user_id, text, user_display_name, user_photo_url, created_at
        FROM comments
        WHERE pack_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(pack_id)
    .bind(limit)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(comment_from_row).collect()
}

pub async fn count_comments(conn: &mut SqliteConnection, pack_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE pack_id = ?")
        .bind(pack_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

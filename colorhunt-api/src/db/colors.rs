//! Color catalog queries

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use colorhunt_common::db::ColorOption;
use colorhunt_common::Result;

fn color_from_row(row: &SqliteRow) -> ColorOption {
    ColorOption {
        id: row.get("id"),
        name: row.get("name"),
        hex: row.get("hex"),
        hue_min: row.get("hue_min"),
        hue_max: row.get("hue_max"),
    }
}

/// Whole catalog, ordered by name
pub async fn list_colors(conn: &mut SqliteConnection) -> Result<Vec<ColorOption>> {
    let rows = sqlx::query("SELECT id, name, hex, hue_min, hue_max FROM colors ORDER BY name")
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows.iter().map(color_from_row).collect())
}

pub async fn load_color(conn: &mut SqliteConnection, color_id: &str) -> Result<Option<ColorOption>> {
    let row = sqlx::query("SELECT id, name, hex, hue_min, hue_max FROM colors WHERE id = ?")
        .bind(color_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.as_ref().map(color_from_row))
}

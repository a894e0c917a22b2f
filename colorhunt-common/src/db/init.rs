//! Database initialization
//!
//! Opens (creating if needed) the SQLite database, applies connection
//! pragmas on every pooled connection, creates the schema idempotently and
//! seeds the color catalog on first run.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// How long a connection waits on a held write lock before reporting busy
const BUSY_TIMEOUT: Duration = Duration::from_millis(250);

/// Colors available out of the box
///
/// Crimson straddles 0° and is stored as the wrapping range 340 → 10.
pub const DEFAULT_COLORS: &[(&str, &str, f64, f64)] = &[
    ("Crimson", "#DC143C", 340.0, 10.0),
    ("Emerald", "#50C878", 130.0, 160.0),
    ("Azure", "#007FFF", 195.0, 225.0),
    ("Goldenrod", "#DAA520", 35.0, 55.0),
    ("Amethyst", "#9966CC", 260.0, 280.0),
    ("Coral", "#FF7F50", 10.0, 25.0),
    ("Teal", "#008080", 170.0, 190.0),
    ("Indigo", "#4B0082", 265.0, 285.0),
    ("Chartreuse", "#7FFF00", 75.0, 95.0),
    ("Magenta", "#FF00FF", 290.0, 310.0),
];

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // WAL lets readers proceed while one writer commits; the per-connection
    // options are applied to every connection the pool opens.
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    init_schema(&pool).await?;
    seed_default_colors(&pool).await?;

    Ok(pool)
}

/// Create all tables (idempotent - safe to call multiple times)
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    create_users_table(pool).await?;
    create_colors_table(pool).await?;
    create_packs_table(pool).await?;
    create_pack_cells_table(pool).await?;
    create_votes_table(pool).await?;
    create_follows_table(pool).await?;
    create_comments_table(pool).await?;

    debug!("Database schema ready");
    Ok(())
}

pub async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            display_name TEXT UNIQUE,
            photo_url TEXT,
            followers_count INTEGER NOT NULL DEFAULT 0,
            following_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            last_login_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_colors_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS colors (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            hex TEXT NOT NULL,
            hue_min REAL NOT NULL CHECK (hue_min >= 0 AND hue_min <= 360),
            hue_max REAL NOT NULL CHECK (hue_max >= 0 AND hue_max <= 360)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Packs carry a copy of their target so later catalog edits never change
/// what an existing hunt is judged against.
pub async fn create_packs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS packs (
            id TEXT PRIMARY KEY,
            owner_user_id TEXT NOT NULL,
            color_id TEXT,
            target_name TEXT NOT NULL,
            target_hex TEXT NOT NULL,
            hue_min REAL NOT NULL,
            hue_max REAL NOT NULL,
            status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'complete')),
            likes_count INTEGER NOT NULL DEFAULT 0,
            comments_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            completed_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_packs_owner ON packs(owner_user_id, created_at)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_packs_status ON packs(status)")
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn create_pack_cells_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pack_cells (
            pack_id TEXT NOT NULL REFERENCES packs(id),
            slot_index INTEGER NOT NULL CHECK (slot_index >= 0 AND slot_index <= 8),
            image_url TEXT NOT NULL,
            verified INTEGER NOT NULL DEFAULT 0,
            dominant_color_hex TEXT,
            uploaded_at TEXT NOT NULL,
            analyzed_at TEXT,
            PRIMARY KEY (pack_id, slot_index)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// `vote` is nullable: rows from the like-only era have no value
pub async fn create_votes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS votes (
            pack_id TEXT NOT NULL REFERENCES packs(id),
            user_id TEXT NOT NULL,
            vote INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (pack_id, user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_follows_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS follows (
            follower_id TEXT NOT NULL REFERENCES users(id),
            following_id TEXT NOT NULL REFERENCES users(id),
            created_at TEXT NOT NULL,
            PRIMARY KEY (follower_id, following_id),
            CHECK (follower_id <> following_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn create_comments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS comments (
            id TEXT PRIMARY KEY,
            pack_id TEXT NOT NULL REFERENCES packs(id),
            user_id TEXT NOT NULL,
            text TEXT NOT NULL,
            user_display_name TEXT NOT NULL,
            user_photo_url TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_comments_pack ON comments(pack_id, created_at)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Insert the default catalog; existing rows (possibly edited) are kept
pub async fn seed_default_colors(pool: &SqlitePool) -> Result<()> {
    let mut inserted = 0u64;

    for (name, hex, hue_min, hue_max) in DEFAULT_COLORS {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO colors (id, name, hex, hue_min, hue_max) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(name.to_lowercase())
        .bind(*name)
        .bind(*hex)
        .bind(*hue_min)
        .bind(*hue_max)
        .execute(pool)
        .await?;

        inserted += result.rows_affected();
    }

    if inserted > 0 {
        info!("Seeded {} default colors", inserted);
    }

    Ok(())
}

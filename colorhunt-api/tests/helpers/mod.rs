//! Shared fixtures for colorhunt-api integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use colorhunt_api::services::packs::{self, CreatePackRequest};
use colorhunt_api::services::{ImageSource, SharedSecretTokens};
use colorhunt_api::{build_router, AppState};
use colorhunt_common::db::Pack;
use colorhunt_common::{Error, Result};

pub const CRIMSON: Rgb<u8> = Rgb([220, 20, 60]);
pub const GRAY: Rgb<u8> = Rgb([128, 128, 128]);

/// Generous retry budget so heavily contended tests never give up
pub const TEST_MAX_WAIT_MS: u64 = 30_000;

/// Solid-color test photo at the analysis size, so the mean color is exact
pub fn solid(color: Rgb<u8>) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 100, color))
}

#[derive(Clone)]
enum Canned {
    Image(DynamicImage),
    Undecodable,
    TimedOut,
}

/// In-memory image source keyed by URL
#[derive(Default)]
pub struct StubImageSource {
    images: Mutex<HashMap<String, Canned>>,
    fetched: Mutex<Vec<String>>,
}

impl StubImageSource {
    pub fn serve(&self, url: &str, image: DynamicImage) {
        self.images.lock().unwrap().insert(url.to_string(), Canned::Image(image));
    }

    pub fn serve_undecodable(&self, url: &str) {
        self.images.lock().unwrap().insert(url.to_string(), Canned::Undecodable);
    }

    pub fn serve_timeout(&self, url: &str) {
        self.images.lock().unwrap().insert(url.to_string(), Canned::TimedOut);
    }

    /// URLs requested so far, in order
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageSource for StubImageSource {
    async fn fetch_image(&self, url: &str) -> Result<DynamicImage> {
        self.fetched.lock().unwrap().push(url.to_string());
        let canned = self.images.lock().unwrap().get(url).cloned();
        match canned {
            Some(Canned::Image(image)) => Ok(image),
            Some(Canned::Undecodable) => Err(Error::ImageDecode(format!("{} is not an image", url))),
            Some(Canned::TimedOut) => Err(Error::FetchTimeout(10)),
            None => Err(Error::ImageDecode(format!("{} returned HTTP 404", url))),
        }
    }
}

/// Database, token issuer and stub image source wired into an `AppState`
pub struct TestContext {
    _dir: TempDir,
    pub db: SqlitePool,
    pub tokens: Arc<SharedSecretTokens>,
    pub images: Arc<StubImageSource>,
    pub state: AppState,
}

impl TestContext {
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db = colorhunt_common::db::init_database(&dir.path().join("colorhunt.db"))
            .await
            .unwrap();

        let tokens = Arc::new(SharedSecretTokens::new("integration-secret").unwrap());
        let images = Arc::new(StubImageSource::default());

        let state = AppState::new(db.clone(), tokens.clone(), images.clone())
            .with_transaction_max_wait_ms(TEST_MAX_WAIT_MS);

        Self {
            _dir: dir,
            db,
            tokens,
            images,
            state,
        }
    }

    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    pub fn token_for(&self, user_id: &str) -> String {
        self.tokens.issue(user_id, Duration::from_secs(3600)).unwrap()
    }

    /// Active Crimson pack owned by `owner`
    pub async fn crimson_pack(&self, owner: &str) -> Pack {
        let request = CreatePackRequest {
            color_id: Some("crimson".to_string()),
            target_color: None,
        };
        packs::create_pack(&self.db, owner, &request).await.unwrap()
    }

    /// Profile row so the user can follow and be followed
    pub async fn user(&self, user_id: &str, display_name: &str) {
        sqlx::query(
            "INSERT INTO users (id, display_name, followers_count, following_count, created_at) \
             VALUES (?, ?, 0, 0, '2026-01-01T00:00:00.000Z')",
        )
        .bind(user_id)
        .bind(display_name)
        .execute(&self.db)
        .await
        .unwrap();
    }

    pub async fn likes_count(&self, pack_id: &str) -> i64 {
        sqlx::query_scalar("SELECT likes_count FROM packs WHERE id = ?")
            .bind(pack_id)
            .fetch_one(&self.db)
            .await
            .unwrap()
    }

    pub async fn follow_counts(&self, user_id: &str) -> (i64, i64) {
        sqlx::query_as("SELECT followers_count, following_count FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_one(&self.db)
            .await
            .unwrap()
    }
}

pub fn cell_url(pack_id: &str, slot: u8) -> String {
    format!("https://images.test/{}/{}.jpg", pack_id, slot)
}

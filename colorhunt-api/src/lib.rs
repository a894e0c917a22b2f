//! colorhunt-api library interface
//!
//! Exposes the router, state and services for the binary and for
//! integration tests.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod services;
pub mod utils;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::DEFAULT_TRANSACTION_MAX_WAIT_MS;
use crate::services::{IdentityProvider, ImageSource};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Bearer token verification
    pub identity: Arc<dyn IdentityProvider>,
    /// Image fetch and decode for verification
    pub images: Arc<dyn ImageSource>,
    /// Retry budget for conflicting transactions
    pub transaction_max_wait_ms: u64,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        identity: Arc<dyn IdentityProvider>,
        images: Arc<dyn ImageSource>,
    ) -> Self {
        Self {
            db,
            identity,
            images,
            transaction_max_wait_ms: DEFAULT_TRANSACTION_MAX_WAIT_MS,
            startup_time: Utc::now(),
        }
    }

    pub fn with_transaction_max_wait_ms(mut self, max_wait_ms: u64) -> Self {
        self.transaction_max_wait_ms = max_wait_ms;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::color_routes())
        .merge(api::pack_routes())
        .merge(api::verify_routes())
        .merge(api::social_routes())
        .merge(api::comment_routes())
        .merge(api::feed_routes())
        .merge(api::leaderboard_routes())
        .merge(api::user_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! HTTP API handlers for colorhunt-api

pub mod auth;
pub mod colors;
pub mod comments;
pub mod extract;
pub mod feed;
pub mod health;
pub mod leaderboard;
pub mod packs;
pub mod social;
pub mod users;
pub mod verify;

pub use colors::color_routes;
pub use comments::comment_routes;
pub use feed::feed_routes;
pub use health::health_routes;
pub use leaderboard::leaderboard_routes;
pub use packs::pack_routes;
pub use social::social_routes;
pub use users::user_routes;
pub use verify::verify_routes;

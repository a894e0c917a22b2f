//! # Color Hunt Common Library
//!
//! Shared code for the Color Hunt services including:
//! - Domain models (packs, cells, vote/follow edges, users, comments)
//! - Database initialization and schema
//! - Bootstrap configuration loading
//! - Common error types
//! - Timestamp helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};

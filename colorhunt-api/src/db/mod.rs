//! Query modules for colorhunt-api
//!
//! Every function takes a `&mut SqliteConnection` so the same query can run
//! on a pooled connection or inside a transaction.

pub mod cells;
pub mod colors;
pub mod comments;
pub mod follows;
pub mod packs;
pub mod users;
pub mod votes;

//! Core services: color scoring, cell verification, counter toggles

pub mod cell_verification;
pub mod color_scorer;
pub mod counters;
pub mod feed;
pub mod hue_classifier;
pub mod identity;
pub mod image_source;
pub mod packs;
pub mod profiles;

pub use identity::{IdentityProvider, SharedSecretTokens};
pub use image_source::{HttpImageSource, ImageSource};

//! Database models
//!
//! Packs own a fixed 3×3 grid of cells. Social edges (votes, follows) are the
//! source of truth for the denormalized counters stored on packs and users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Number of slots in a pack grid; a pack completes when all of them verify
pub const GRID_SIZE: usize = 9;

// ============================================================================
// Colors
// ============================================================================

/// Target color a pack is hunting for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetColor {
    pub name: String,
    pub hex: String,
    /// Lower hue bound in degrees
    #[serde(alias = "h_min")]
    pub hue_min: f64,
    /// Upper hue bound in degrees; smaller than `hue_min` when the range wraps through 0°
    #[serde(alias = "h_max")]
    pub hue_max: f64,
}

impl TargetColor {
    /// Reject hue bounds outside the color wheel
    pub fn validate(&self) -> Result<()> {
        for (label, value) in [("hueMin", self.hue_min), ("hueMax", self.hue_max)] {
            if !value.is_finite() || !(0.0..=360.0).contains(&value) {
                return Err(Error::InvalidInput(format!(
                    "{} must be between 0 and 360, got {}",
                    label, value
                )));
            }
        }
        Ok(())
    }

    /// Same hue range (names and display hex are cosmetic)
    pub fn same_range(&self, other: &TargetColor) -> bool {
        (self.hue_min - other.hue_min).abs() < f64::EPSILON
            && (self.hue_max - other.hue_max).abs() < f64::EPSILON
    }
}

/// Entry of the color catalog packs are created from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorOption {
    pub id: String,
    pub name: String,
    pub hex: String,
    pub hue_min: f64,
    pub hue_max: f64,
}

impl ColorOption {
    pub fn target(&self) -> TargetColor {
        TargetColor {
            name: self.name.clone(),
            hex: self.hex.clone(),
            hue_min: self.hue_min,
            hue_max: self.hue_max,
        }
    }
}

// ============================================================================
// Packs and cells
// ============================================================================

/// Pack lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackStatus {
    Active,
    Complete,
}

impl PackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackStatus::Active => "active",
            PackStatus::Complete => "complete",
        }
    }
}

impl fmt::Display for PackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(PackStatus::Active),
            "complete" => Ok(PackStatus::Complete),
            other => Err(Error::Internal(format!("Unknown pack status: {}", other))),
        }
    }
}

/// Grid position of a cell (0..=8, row-major)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct SlotIndex(u8);

impl SlotIndex {
    pub fn new(index: i64) -> Result<Self> {
        if (0..GRID_SIZE as i64).contains(&index) {
            Ok(SlotIndex(index as u8))
        } else {
            Err(Error::InvalidInput(format!(
                "slotIndex must be between 0 and {}, got {}",
                GRID_SIZE - 1,
                index
            )))
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// All slots of a grid in order
    pub fn all() -> impl Iterator<Item = SlotIndex> {
        (0..GRID_SIZE as u8).map(SlotIndex)
    }
}

impl TryFrom<i64> for SlotIndex {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        SlotIndex::new(value)
    }
}

impl From<SlotIndex> for i64 {
    fn from(slot: SlotIndex) -> i64 {
        slot.0 as i64
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Verification state of a recorded cell (an absent cell is Empty)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellState {
    /// Upload stored, not yet analyzed
    Pending,
    Verified,
    /// Analyzed and rejected; a new upload returns the cell to Pending
    Failed,
}

/// One uploaded image within a pack grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRecord {
    pub image_url: String,
    pub verified: bool,
    pub dominant_color_hex: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub analyzed_at: Option<DateTime<Utc>>,
}

impl CellRecord {
    /// Fresh upload: pending until verification writes its verdict
    pub fn pending(image_url: impl Into<String>, uploaded_at: DateTime<Utc>) -> Self {
        Self {
            image_url: image_url.into(),
            verified: false,
            dominant_color_hex: None,
            uploaded_at,
            analyzed_at: None,
        }
    }

    pub fn state(&self) -> CellState {
        match (self.verified, self.analyzed_at) {
            (true, _) => CellState::Verified,
            (false, Some(_)) => CellState::Failed,
            (false, None) => CellState::Pending,
        }
    }
}

/// A nine-photo color hunt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pack {
    pub id: String,
    pub owner_user_id: String,
    pub color_id: Option<String>,
    pub target_color: TargetColor,
    pub status: PackStatus,
    pub likes_count: i64,
    pub comments_count: i64,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Recorded cells keyed by slot; missing slots are empty
    pub cells: BTreeMap<SlotIndex, CellRecord>,
}

impl Pack {
    /// New empty, active pack
    pub fn new(
        id: impl Into<String>,
        owner_user_id: impl Into<String>,
        color_id: Option<String>,
        target_color: TargetColor,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            owner_user_id: owner_user_id.into(),
            color_id,
            target_color,
            status: PackStatus::Active,
            likes_count: 0,
            comments_count: 0,
            created_at,
            completed_at: None,
            cells: BTreeMap::new(),
        }
    }

    pub fn verified_count(&self) -> usize {
        self.cells.values().filter(|cell| cell.verified).count()
    }
}

// ============================================================================
// Social edges
// ============================================================================

/// Stored sign of a vote edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteValue {
    Down,
    Up,
}

impl VoteValue {
    /// Read-time migration of the stored column
    ///
    /// Edges written before signed votes existed carry no value (or 0) and
    /// count as an up-vote.
    pub fn from_stored(stored: Option<i64>) -> Self {
        match stored {
            Some(v) if v < 0 => VoteValue::Down,
            _ => VoteValue::Up,
        }
    }

    pub fn as_i64(&self) -> i64 {
        match self {
            VoteValue::Down => -1,
            VoteValue::Up => 1,
        }
    }
}

/// Vote a user asks for: down, none (remove), or up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum VoteState {
    Down,
    None,
    Up,
}

impl VoteState {
    /// Signed contribution to a pack's likes counter
    pub fn contribution(&self) -> i64 {
        match self {
            VoteState::Down => -1,
            VoteState::None => 0,
            VoteState::Up => 1,
        }
    }

    pub fn as_edge(&self) -> Option<VoteValue> {
        match self {
            VoteState::Down => Some(VoteValue::Down),
            VoteState::None => None,
            VoteState::Up => Some(VoteValue::Up),
        }
    }

    pub fn from_edge(edge: Option<VoteValue>) -> Self {
        match edge {
            Some(VoteValue::Down) => VoteState::Down,
            Some(VoteValue::Up) => VoteState::Up,
            None => VoteState::None,
        }
    }
}

impl TryFrom<i64> for VoteState {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            -1 => Ok(VoteState::Down),
            0 => Ok(VoteState::None),
            1 => Ok(VoteState::Up),
            other => Err(Error::InvalidInput(format!(
                "vote must be -1, 0 or 1, got {}",
                other
            ))),
        }
    }
}

impl From<VoteState> for i64 {
    fn from(state: VoteState) -> i64 {
        state.contribution()
    }
}

// ============================================================================
// Users and comments
// ============================================================================

/// User profile with denormalized follow counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub followers_count: i64,
    pub following_count: i64,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Comment on a pack, carrying the author's display name at creation time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub pack_id: String,
    pub user_id: String,
    pub text: String,
    pub user_display_name: String,
    pub user_photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Display name used when a profile has none
pub const ANONYMOUS_DISPLAY_NAME: &str = "Anonymous";

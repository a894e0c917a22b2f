//! Pixel hue classification
//!
//! Converts RGB pixels to HSV and decides whether a pixel falls inside a
//! target hue range. Ranges are widened by a small buffer and may wrap
//! through 0° (reds). Near-neutral pixels (gray, black, white) never match.

use colorhunt_common::db::TargetColor;

/// Leniency added to both ends of a target range, in degrees
pub const HUE_BUFFER_DEGREES: f64 = 5.0;

/// Pixels at or below this saturation (0-100) are treated as neutral
pub const MIN_SATURATION: f64 = 10.0;

/// Pixels at or below this value (0-100) are treated as neutral
pub const MIN_VALUE: f64 = 10.0;

/// Hue in degrees [0, 360), saturation and value in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub hue: f64,
    pub saturation: f64,
    pub value: f64,
}

impl Hsv {
    /// Standard max/min-channel HSV conversion
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let r = r as f64 / 255.0;
        let g = g as f64 / 255.0;
        let b = b as f64 / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let saturation = if max == 0.0 { 0.0 } else { delta / max };

        let hue = if delta == 0.0 {
            0.0
        } else if max == r {
            (g - b) / delta + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };

        Self {
            hue: hue * 60.0,
            saturation: saturation * 100.0,
            value: max * 100.0,
        }
    }

    /// Too desaturated or too dark to carry a reliable hue
    pub fn is_neutral(&self) -> bool {
        self.saturation <= MIN_SATURATION || self.value <= MIN_VALUE
    }
}

/// Target hue interval in degrees
///
/// `hue_min > hue_max` means the interval wraps through 0°, e.g. 340 → 10.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HueRange {
    pub hue_min: f64,
    pub hue_max: f64,
}

impl HueRange {
    pub fn new(hue_min: f64, hue_max: f64) -> Self {
        Self { hue_min, hue_max }
    }

    pub fn from_target(target: &TargetColor) -> Self {
        Self::new(target.hue_min, target.hue_max)
    }

    pub fn wraps(&self) -> bool {
        self.hue_min > self.hue_max
    }

    /// Membership of a hue in the buffered range
    pub fn contains_hue(&self, hue: f64) -> bool {
        let low = self.hue_min - HUE_BUFFER_DEGREES;
        let high = self.hue_max + HUE_BUFFER_DEGREES;

        if self.wraps() {
            // Buffered ends overlap: the whole wheel is covered
            if low <= high {
                return true;
            }
            return hue >= low || hue <= high;
        }

        if high - low >= 360.0 {
            return true;
        }

        // A buffered end pushed past 0°/360° turns the interval into a wrapping one
        let low = low.rem_euclid(360.0);
        let high = high.rem_euclid(360.0);
        if low <= high {
            hue >= low && hue <= high
        } else {
            hue >= low || hue <= high
        }
    }

    pub fn matches(&self, hsv: &Hsv) -> bool {
        !hsv.is_neutral() && self.contains_hue(hsv.hue)
    }

    pub fn matches_rgb(&self, r: u8, g: u8, b: u8) -> bool {
        self.matches(&Hsv::from_rgb(r, g, b))
    }
}

//! Center-weighted color match scoring
//!
//! The image is downsampled to a fixed 100×100 grid, every pixel is
//! classified against the target hue range, and pixels in the central
//! 50%×50% of the frame count double. The score is the weighted share of
//! matching pixels, 0-100.
//!
//! The mean color is reported alongside for display only; it plays no part
//! in the pass/fail decision.

use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use serde::Serialize;

use super::hue_classifier::HueRange;
use colorhunt_common::{Error, Result};

/// Side length of the analysis grid
pub const ANALYSIS_SIZE: u32 = 100;

/// Minimum score for a cell to verify
///
/// Deliberately low: a small correctly colored subject against a neutral
/// background should still pass.
pub const MATCH_THRESHOLD: f64 = 10.0;

const CENTER_WEIGHT: u64 = 2;
const EDGE_WEIGHT: u64 = 1;

/// Result of scoring one image
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorMatch {
    /// Weighted percentage of matching pixels (0-100)
    pub match_score: f64,
    /// Unweighted mean color, `#rrggbb`
    pub dominant_color_hex: String,
}

impl ColorMatch {
    pub fn passes(&self) -> bool {
        self.match_score >= MATCH_THRESHOLD
    }
}

/// Resize to the analysis grid (aspect ratio is not preserved)
pub fn downsample(image: &DynamicImage) -> RgbImage {
    if image.width() == ANALYSIS_SIZE && image.height() == ANALYSIS_SIZE {
        return image.to_rgb8();
    }
    image
        .resize_exact(ANALYSIS_SIZE, ANALYSIS_SIZE, FilterType::Triangle)
        .to_rgb8()
}

/// Downsample and score a decoded image
pub fn score_image(image: &DynamicImage, range: &HueRange) -> Result<ColorMatch> {
    if image.width() == 0 || image.height() == 0 {
        return Err(Error::ImageDecode("image has no pixels".to_string()));
    }
    Ok(score_pixels(&downsample(image), range))
}

/// Score an already-downsampled raster
pub fn score_pixels(pixels: &RgbImage, range: &HueRange) -> ColorMatch {
    let (width, height) = pixels.dimensions();

    let mut matched_weight = 0u64;
    let mut total_weight = 0u64;
    let mut channel_totals = [0u64; 3];

    for (x, y, pixel) in pixels.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        channel_totals[0] += r as u64;
        channel_totals[1] += g as u64;
        channel_totals[2] += b as u64;

        let weight = if is_center(x, y, width, height) {
            CENTER_WEIGHT
        } else {
            EDGE_WEIGHT
        };
        total_weight += weight;

        if range.matches_rgb(r, g, b) {
            matched_weight += weight;
        }
    }

    let pixel_count = width as u64 * height as u64;
    if pixel_count == 0 {
        return ColorMatch {
            match_score: 0.0,
            dominant_color_hex: to_hex(0, 0, 0),
        };
    }

    let mean = |total: u64| (total as f64 / pixel_count as f64).round() as u8;

    ColorMatch {
        match_score: 100.0 * matched_weight as f64 / total_weight as f64,
        dominant_color_hex: to_hex(
            mean(channel_totals[0]),
            mean(channel_totals[1]),
            mean(channel_totals[2]),
        ),
    }
}

/// Inside the middle half of the frame on both axes (bounds inclusive)
fn is_center(x: u32, y: u32, width: u32, height: u32) -> bool {
    let (x, y) = (x as f64, y as f64);
    let (w, h) = (width as f64, height as f64);
    x >= w * 0.25 && x <= w * 0.75 && y >= h * 0.25 && y <= h * 0.75
}

/// Lowercase `#rrggbb`
pub fn to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const GRAY: Rgb<u8> = Rgb([128, 128, 128]);
    const CRIMSON: Rgb<u8> = Rgb([220, 20, 60]);

    fn crimson_range() -> HueRange {
        HueRange::new(340.0, 10.0)
    }

    fn filled(color: Rgb<u8>) -> RgbImage {
        RgbImage::from_pixel(ANALYSIS_SIZE, ANALYSIS_SIZE, color)
    }

    /// Paint `count` pixels, walking the region row by row
    fn paint(
        image: &mut RgbImage,
        count: usize,
        color: Rgb<u8>,
        in_region: impl Fn(u32, u32) -> bool,
    ) {
        let mut painted = 0;
        for y in 0..image.height() {
            for x in 0..image.width() {
                if painted == count {
                    return;
                }
                if in_region(x, y) {
                    image.put_pixel(x, y, color);
                    painted += 1;
                }
            }
        }
        assert_eq!(painted, count, "region too small");
    }

    #[test]
    fn test_uniform_target_color_scores_100() {
        let result = score_pixels(&filled(CRIMSON), &crimson_range());
        assert!((result.match_score - 100.0).abs() < 1e-9);
        assert!(result.passes());
        assert_eq!(result.dominant_color_hex, "#dc143c");
    }

    #[test]
    fn test_gray_image_scores_zero_and_fails() {
        let result = score_pixels(&filled(GRAY), &crimson_range());
        assert_eq!(result.match_score, 0.0);
        assert!(!result.passes());
        assert_eq!(result.dominant_color_hex, "#808080");
    }

    #[test]
    fn test_center_weighting_is_directional() {
        let area = (ANALYSIS_SIZE * ANALYSIS_SIZE) as usize;
        let target_pixels = area / 5;

        let mut centered = filled(GRAY);
        paint(&mut centered, target_pixels, CRIMSON, |x, y| {
            is_center(x, y, ANALYSIS_SIZE, ANALYSIS_SIZE)
        });

        let mut edges = filled(GRAY);
        paint(&mut edges, target_pixels, CRIMSON, |x, y| {
            !is_center(x, y, ANALYSIS_SIZE, ANALYSIS_SIZE)
        });

        let centered_score = score_pixels(&centered, &crimson_range()).match_score;
        let edge_score = score_pixels(&edges, &crimson_range()).match_score;

        assert!(
            centered_score > edge_score,
            "center {} should beat edges {}",
            centered_score,
            edge_score
        );
        // Same pixel count, so the dominant color is identical
        assert_eq!(
            score_pixels(&centered, &crimson_range()).dominant_color_hex,
            score_pixels(&edges, &crimson_range()).dominant_color_hex
        );
    }

    #[test]
    fn test_score_is_monotonic_in_matching_pixels() {
        let mut image = filled(GRAY);
        let mut previous = score_pixels(&image, &crimson_range()).match_score;

        // Flip pixels one diagonal stripe at a time; the score never drops
        for step in 0..ANALYSIS_SIZE {
            for offset in 0..ANALYSIS_SIZE {
                let x = (step + offset) % ANALYSIS_SIZE;
                image.put_pixel(x, offset, CRIMSON);
            }
            let score = score_pixels(&image, &crimson_range()).match_score;
            assert!(score >= previous, "score dropped from {} to {}", previous, score);
            previous = score;
        }

        assert!((previous - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_small_centered_subject_passes_threshold() {
        // 30x30 subject in the middle of a neutral frame: 9% of the area,
        // doubled by center weighting
        let mut image = filled(GRAY);
        for y in 35..65 {
            for x in 35..65 {
                image.put_pixel(x, y, CRIMSON);
            }
        }

        let result = score_pixels(&image, &crimson_range());
        assert!(result.match_score >= MATCH_THRESHOLD, "score {}", result.match_score);
        assert!(result.passes());
    }

    #[test]
    fn test_dark_target_hue_does_not_match() {
        // Correct hue but value under the neutral threshold
        let image = filled(Rgb([20, 2, 6]));
        assert_eq!(score_pixels(&image, &crimson_range()).match_score, 0.0);
    }

    #[test]
    fn test_score_image_downsamples_large_input() {
        let large = DynamicImage::ImageRgb8(RgbImage::from_pixel(640, 480, CRIMSON));
        let result = score_image(&large, &crimson_range()).unwrap();
        assert!((result.match_score - 100.0).abs() < 1e-9);
        assert_eq!(downsample(&large).dimensions(), (ANALYSIS_SIZE, ANALYSIS_SIZE));
    }

    #[test]
    fn test_score_image_rejects_empty_raster() {
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert!(matches!(
            score_image(&empty, &crimson_range()),
            Err(Error::ImageDecode(_))
        ));
    }

    #[test]
    fn test_to_hex_pads_channels() {
        assert_eq!(to_hex(0, 15, 255), "#000fff");
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Photometric feature maps (illumination, saturation, local contrast)
// derived from a colour frame and robustly normalized to [0, 1].

use glint_core::config::GlareConfig;
use image::{GrayImage, ImageBuffer, Luma, RgbImage};
use tracing::{debug, instrument, warn};

/// Single-channel `f32` map with values in [0, 1].
pub type FeatureMap = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Percentile ranges narrower than this are treated as flat input.
const FLAT_RANGE_EPSILON: f32 = 1e-6;

/// Local variances below this are summed-area round-off, not texture. The
/// smallest real variance of 8-bit input over a 15×15 window is ~7e-8.
const VARIANCE_FLOOR: f64 = 1e-10;

/// The three normalized maps the glare scorer combines.
#[derive(Debug, Clone)]
pub struct PhotometricFeatures {
    /// Normalized HSV value (brightness).
    pub illumination: FeatureMap,
    /// Normalized HSV saturation.
    pub saturation: FeatureMap,
    /// Normalized local standard deviation of brightness.
    pub contrast: FeatureMap,
}

/// Derives [`PhotometricFeatures`] from a colour frame.
///
/// Local contrast is the standard deviation of the value channel over a
/// square `window`, with reflective border extension so that border pixels
/// see a full neighbourhood. Each raw map is then clipped to its own
/// `percentiles` range and rescaled to [0, 1].
#[derive(Debug, Clone, Copy)]
pub struct PhotometricFeatureExtractor {
    window: u32,
    percentiles: (f32, f32),
}

impl PhotometricFeatureExtractor {
    pub fn new(window: u32, percentiles: (f32, f32)) -> Self {
        Self {
            window,
            percentiles,
        }
    }

    pub fn from_config(config: &GlareConfig) -> Self {
        Self::new(config.window, config.percentiles)
    }

    pub fn window(&self) -> u32 {
        self.window
    }

    /// Compute the normalized feature maps.
    ///
    /// Returns `None` for a zero-area frame, which callers treat as "no
    /// features" rather than an error.
    #[instrument(skip_all, fields(width = frame.width(), height = frame.height()))]
    pub fn extract(&self, frame: &RgbImage) -> Option<PhotometricFeatures> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            warn!("Empty frame; no photometric features");
            return None;
        }

        let (value, saturation) = value_saturation_maps(frame);
        let contrast = local_std_dev(&value, self.window / 2);
        debug!(window = self.window, "Raw photometric maps computed");

        Some(PhotometricFeatures {
            illumination: robust_normalize(&value, self.percentiles),
            saturation: robust_normalize(&saturation, self.percentiles),
            contrast: robust_normalize(&contrast, self.percentiles),
        })
    }
}

/// BT.601 luma (`0.299 R + 0.587 G + 0.114 B`) in 14-bit fixed point with
/// rounding. Gray pixels map to themselves.
pub fn luma_bt601(frame: &RgbImage) -> GrayImage {
    ImageBuffer::from_fn(frame.width(), frame.height(), |x, y| {
        let [r, g, b] = frame.get_pixel(x, y).0;
        let weighted = r as u32 * 4899 + g as u32 * 9617 + b as u32 * 1868;
        Luma([((weighted + (1 << 13)) >> 14) as u8])
    })
}

/// Split a frame into HSV value and saturation maps, both in [0, 1].
///
/// `V = max(r, g, b)` and `S = (max - min) / max`. Both are independent of
/// channel order, so BGR and RGB frames give the same maps.
pub fn value_saturation_maps(frame: &RgbImage) -> (FeatureMap, FeatureMap) {
    let (width, height) = frame.dimensions();
    let mut value = FeatureMap::new(width, height);
    let mut saturation = FeatureMap::new(width, height);

    for (x, y, pixel) in frame.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let s = if max == 0 {
            0.0
        } else {
            (max - min) as f32 / max as f32
        };
        value.put_pixel(x, y, Luma([max as f32 / 255.0]));
        saturation.put_pixel(x, y, Luma([s]));
    }

    (value, saturation)
}

/// Local standard deviation over a `(2 * radius + 1)²` window.
///
/// `sqrt(max(E[v²] - E[v]², 0))`, with both means taken by a reflective box
/// filter. Accumulation stays in `f64` so flat regions come out exactly flat.
pub fn local_std_dev(map: &FeatureMap, radius: u32) -> FeatureMap {
    let (width, height) = map.dimensions();
    let values: Vec<f64> = map.as_raw().iter().map(|&v| v as f64).collect();
    let squares: Vec<f64> = values.iter().map(|v| v * v).collect();
    let mean = box_mean_reflect(&values, width, height, radius);
    let mean_sq = box_mean_reflect(&squares, width, height, radius);

    ImageBuffer::from_fn(width, height, |x, y| {
        let idx = (y * width + x) as usize;
        let variance = mean_sq[idx] - mean[idx] * mean[idx];
        if variance < VARIANCE_FLOOR {
            Luma([0.0])
        } else {
            Luma([variance.sqrt() as f32])
        }
    })
}

/// Clip `map` to its `[p_lo, p_hi]` percentile range and rescale to [0, 1].
///
/// A range narrower than [`FLAT_RANGE_EPSILON`] yields an all-zero map.
pub fn robust_normalize(map: &FeatureMap, (p_lo, p_hi): (f32, f32)) -> FeatureMap {
    let (width, height) = map.dimensions();
    let mut sorted = map.as_raw().clone();
    if sorted.is_empty() {
        return FeatureMap::new(width, height);
    }
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));

    let lo = percentile(&sorted, p_lo);
    let hi = percentile(&sorted, p_hi);
    let range = hi - lo;
    if range < FLAT_RANGE_EPSILON {
        debug!(lo, hi, "Flat feature map; normalizing to zeros");
        return FeatureMap::new(width, height);
    }

    ImageBuffer::from_fn(width, height, |x, y| {
        let v = map.get_pixel(x, y).0[0];
        Luma([((v - lo) / range).clamp(0.0, 1.0)])
    })
}

/// Percentile of an ascending slice, linearly interpolating between ranks.
fn percentile(sorted: &[f32], p: f32) -> f32 {
    let last = sorted.len() - 1;
    let rank = (p.clamp(0.0, 100.0) as f64 / 100.0) * last as f64;
    let below = rank.floor() as usize;
    let above = (rank.ceil() as usize).min(last);
    let frac = (rank - below as f64) as f32;
    sorted[below] + (sorted[above] - sorted[below]) * frac
}

// -- Box filter helpers -------------------------------------------------------

/// Mean over a `(2 * radius + 1)²` window with reflective borders
/// (`cba|abcdef|fed`), for a row-major `width x height` buffer.
///
/// Builds a summed-area table over the reflect-padded buffer so each output
/// sample costs four lookups. The table has dimensions
/// `(width + 2r + 1) x (height + 2r + 1)` with a zero top row and column.
fn box_mean_reflect(values: &[f64], width: u32, height: u32, radius: u32) -> Vec<f64> {
    let (w, h) = (width as i64, height as i64);
    let r = radius as i64;
    let padded_w = w + 2 * r;
    let padded_h = h + 2 * r;
    let stride = (padded_w + 1) as usize;
    let mut table = vec![0f64; stride * (padded_h + 1) as usize];

    for py in 0..padded_h {
        let sy = reflect_index(py - r, h) as usize;
        let mut row_sum = 0f64;
        for px in 0..padded_w {
            let sx = reflect_index(px - r, w) as usize;
            row_sum += values[sy * width as usize + sx];
            let idx = (py + 1) as usize * stride + (px + 1) as usize;
            let above = py as usize * stride + (px + 1) as usize;
            table[idx] = row_sum + table[above];
        }
    }

    let side = (2 * radius + 1) as usize;
    let area = (side * side) as f64;
    let mut means = Vec::with_capacity(values.len());
    for y in 0..height as usize {
        for x in 0..width as usize {
            // Output (x, y) covers padded [x, x + side) × [y, y + side).
            let (x2, y2) = (x + side, y + side);
            let sum = table[y2 * stride + x2] - table[y * stride + x2] - table[y2 * stride + x]
                + table[y * stride + x];
            means.push(sum / area);
        }
    }
    means
}

/// Map an out-of-range index back into `0..n` by mirroring, repeating the
/// edge sample.
fn reflect_index(mut i: i64, n: i64) -> u32 {
    loop {
        if i < 0 {
            i = -i - 1;
        } else if i >= n {
            i = 2 * n - i - 1;
        } else {
            return i as u32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn map_from(width: u32, height: u32, values: &[f32]) -> FeatureMap {
        FeatureMap::from_raw(width, height, values.to_vec()).expect("buffer size matches")
    }

    #[test]
    fn reflect_index_repeats_edge_sample() {
        assert_eq!(reflect_index(-1, 5), 0);
        assert_eq!(reflect_index(-2, 5), 1);
        assert_eq!(reflect_index(5, 5), 4);
        assert_eq!(reflect_index(6, 5), 3);
        assert_eq!(reflect_index(2, 5), 2);
        // Windows wider than the image bounce more than once.
        assert_eq!(reflect_index(-5, 2), 0);
        assert_eq!(reflect_index(3, 1), 0);
    }

    #[test]
    fn box_mean_of_constant_map_is_constant_at_borders() {
        let values = vec![0.25; 6 * 4];
        let mean = box_mean_reflect(&values, 6, 4, 7);
        assert_eq!(mean.len(), 24);
        for m in mean {
            assert!((m - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn box_mean_matches_hand_computed_reflection() {
        // Row [0, 1, 2] with radius 1 reflects to [0 | 0 1 2 | 2].
        let mean = box_mean_reflect(&[0.0, 1.0, 2.0], 3, 1, 1);
        let expected = [1.0 / 3.0, 1.0, 5.0 / 3.0];
        for (x, want) in expected.iter().enumerate() {
            assert!((mean[x] - want).abs() < 1e-9, "x={x}: {} != {want}", mean[x]);
        }
    }

    #[test]
    fn local_std_dev_is_zero_on_flat_input_and_positive_at_edges() {
        let mut map = FeatureMap::from_pixel(20, 20, Luma([0.2]));
        for y in 0..20 {
            for x in 10..20 {
                map.put_pixel(x, y, Luma([0.8]));
            }
        }
        let std = local_std_dev(&map, 2);
        assert!(std.get_pixel(2, 10).0[0].abs() < 1e-6);
        assert!(std.get_pixel(17, 10).0[0].abs() < 1e-6);
        assert!(std.get_pixel(10, 10).0[0] > 0.1);
    }

    #[test]
    fn percentile_interpolates_between_ranks() {
        let sorted = [0.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 0.0), 0.0);
        assert_eq!(percentile(&sorted, 100.0), 4.0);
        assert!((percentile(&sorted, 50.0) - 2.0).abs() < 1e-6);
        assert!((percentile(&sorted, 10.0) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn robust_normalize_flat_map_is_all_zero() {
        let map = FeatureMap::from_pixel(8, 8, Luma([0.6]));
        let norm = robust_normalize(&map, (2.0, 98.0));
        assert!(norm.pixels().all(|p| p.0[0] == 0.0));
    }

    #[test]
    fn robust_normalize_clips_outliers_and_spans_unit_range() {
        let mut values: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        values[0] = -50.0;
        values[99] = 50.0;
        let map = map_from(10, 10, &values);
        let norm = robust_normalize(&map, (2.0, 98.0));

        assert_eq!(norm.get_pixel(0, 0).0[0], 0.0);
        assert_eq!(norm.get_pixel(9, 9).0[0], 1.0);
        assert!(norm.pixels().all(|p| (0.0..=1.0).contains(&p.0[0])));
        let mid = norm.get_pixel(0, 5).0[0];
        assert!(mid > 0.3 && mid < 0.7, "mid = {mid}");
    }

    #[test]
    fn value_and_saturation_follow_hsv() {
        let mut frame = RgbImage::new(3, 1);
        frame.put_pixel(0, 0, Rgb([255, 255, 255]));
        frame.put_pixel(1, 0, Rgb([0, 0, 0]));
        frame.put_pixel(2, 0, Rgb([200, 100, 100]));
        let (value, saturation) = value_saturation_maps(&frame);

        assert_eq!(value.get_pixel(0, 0).0[0], 1.0);
        assert_eq!(saturation.get_pixel(0, 0).0[0], 0.0);
        assert_eq!(value.get_pixel(1, 0).0[0], 0.0);
        assert_eq!(saturation.get_pixel(1, 0).0[0], 0.0);
        assert!((value.get_pixel(2, 0).0[0] - 200.0 / 255.0).abs() < 1e-6);
        assert!((saturation.get_pixel(2, 0).0[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn luma_uses_bt601_weights() {
        let mut frame = RgbImage::from_pixel(3, 1, Rgb([200, 200, 200]));
        frame.put_pixel(1, 0, Rgb([255, 0, 0]));
        frame.put_pixel(2, 0, Rgb([0, 100, 0]));
        let luma = luma_bt601(&frame);
        assert_eq!(luma.get_pixel(0, 0).0[0], 200);
        assert_eq!(luma.get_pixel(1, 0).0[0], 76);
        assert_eq!(luma.get_pixel(2, 0).0[0], 59);
        let white = luma_bt601(&RgbImage::from_pixel(1, 1, Rgb([255, 255, 255])));
        assert_eq!(white.get_pixel(0, 0).0[0], 255);
    }

    #[test]
    fn extract_rejects_empty_frame() {
        let extractor = PhotometricFeatureExtractor::new(15, (2.0, 98.0));
        assert!(extractor.extract(&RgbImage::new(0, 0)).is_none());
        assert!(extractor.extract(&RgbImage::new(10, 0)).is_none());
    }

    #[test]
    fn extract_produces_same_sized_maps() {
        let frame = RgbImage::from_fn(31, 17, |x, y| Rgb([(x * 8) as u8, (y * 12) as u8, 90]));
        let extractor = PhotometricFeatureExtractor::new(15, (2.0, 98.0));
        let features = extractor.extract(&frame).expect("non-empty frame");
        for map in [
            &features.illumination,
            &features.saturation,
            &features.contrast,
        ] {
            assert_eq!(map.dimensions(), (31, 17));
            assert!(map.pixels().all(|p| (0.0..=1.0).contains(&p.0[0])));
        }
    }
}

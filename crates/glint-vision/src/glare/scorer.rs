// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Multi-cue glare scorer.
//
// Glare is modelled as bright, desaturated, texture-less pixels. The three
// normalized photometric maps are turned into "glare-like" cues, averaged
// with configurable weights, and thresholded into a mask.

use glint_core::config::GlareConfig;
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, RgbImage};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::photometric::{FeatureMap, PhotometricFeatureExtractor, luma_bt601};

/// Mask value for pixels classified as glare.
const MASK_ON: u8 = 255;

/// Outcome of one [`GlareScorer::score`] call.
#[derive(Debug, Clone)]
pub struct GlareResult {
    /// Fraction of pixels in the mask, in [0, 1].
    pub coverage: f32,
    /// `coverage >= coverage_thresh`.
    pub has_glare: bool,
    /// 255 where `score_map >= score_thresh`, 0 elsewhere.
    pub mask: GrayImage,
    /// Per-pixel glare score in [0, 1].
    pub score_map: FeatureMap,
    /// Brightest grayscale pixel `(x, y)`; `None` for an empty frame.
    pub peak_location: Option<(u32, u32)>,
}

/// Serializable projection of a [`GlareResult`] without the image buffers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GlareSummary {
    pub coverage: f32,
    pub has_glare: bool,
    pub peak_location: Option<(u32, u32)>,
}

impl GlareResult {
    /// Result for a zero-area frame: no coverage, 1×1 empty mask, no peak.
    fn degenerate() -> Self {
        Self {
            coverage: 0.0,
            has_glare: false,
            mask: GrayImage::new(1, 1),
            score_map: FeatureMap::new(1, 1),
            peak_location: None,
        }
    }

    pub fn summary(&self) -> GlareSummary {
        GlareSummary {
            coverage: self.coverage,
            has_glare: self.has_glare,
            peak_location: self.peak_location,
        }
    }

    /// Centroid of the glare mask, rounded to the nearest pixel.
    ///
    /// Returns `None` when no pixel is masked.
    pub fn mask_centroid(&self) -> Option<(u32, u32)> {
        let (mut sum_x, mut sum_y, mut count) = (0u64, 0u64, 0u64);
        for (x, y, pixel) in self.mask.enumerate_pixels() {
            if pixel.0[0] == MASK_ON {
                sum_x += x as u64;
                sum_y += y as u64;
                count += 1;
            }
        }
        if count == 0 {
            return None;
        }
        let cx = (sum_x as f64 / count as f64).round() as u32;
        let cy = (sum_y as f64 / count as f64).round() as u32;
        Some((cx, cy))
    }
}

/// Scores glare on a frame with a fixed [`GlareConfig`].
#[derive(Debug, Clone)]
pub struct GlareScorer {
    config: GlareConfig,
    extractor: PhotometricFeatureExtractor,
}

impl GlareScorer {
    pub fn new(config: GlareConfig) -> Self {
        Self {
            extractor: PhotometricFeatureExtractor::from_config(&config),
            config,
        }
    }

    pub fn config(&self) -> &GlareConfig {
        &self.config
    }

    /// Score any image. Single-channel input is replicated to three channels.
    pub fn score(&self, frame: &DynamicImage) -> GlareResult {
        self.score_rgb(&frame.to_rgb8())
    }

    /// Score a three-channel frame.
    ///
    /// 1. Extract illumination `I`, saturation `S`, local contrast `C`
    /// 2. `score = (wI·I + wS·(1 − S) + wC·(1 − C)) / (wI + wS + wC)`
    /// 3. Threshold at `score_thresh` into the mask; coverage is its fill ratio
    /// 4. Locate the brightest grayscale pixel as the glare hotspot
    #[instrument(skip_all, fields(width = frame.width(), height = frame.height()))]
    pub fn score_rgb(&self, frame: &RgbImage) -> GlareResult {
        let Some(features) = self.extractor.extract(frame) else {
            warn!("No photometric features; returning degenerate glare result");
            return GlareResult::degenerate();
        };
        let (width, height) = frame.dimensions();

        let weights = self.config.weights;
        let weight_sum = weights.sum();
        let score_map: FeatureMap = if weight_sum > 0.0 {
            ImageBuffer::from_fn(width, height, |x, y| {
                let bright = features.illumination.get_pixel(x, y).0[0];
                let low_sat = 1.0 - features.saturation.get_pixel(x, y).0[0];
                let low_contrast = 1.0 - features.contrast.get_pixel(x, y).0[0];
                let combined = weights.intensity * bright
                    + weights.low_saturation * low_sat
                    + weights.low_contrast * low_contrast;
                Luma([combined / weight_sum])
            })
        } else {
            warn!("Glare weights sum to zero; score map is empty");
            FeatureMap::new(width, height)
        };

        let threshold = self.config.score_thresh;
        let mask: GrayImage = ImageBuffer::from_fn(width, height, |x, y| {
            if score_map.get_pixel(x, y).0[0] >= threshold {
                Luma([MASK_ON])
            } else {
                Luma([0u8])
            }
        });

        let glare_pixels = mask.pixels().filter(|p| p.0[0] == MASK_ON).count();
        let coverage = (glare_pixels as f64 / (width as f64 * height as f64)) as f32;
        let has_glare = coverage >= self.config.coverage_thresh;
        let peak_location = brightest_pixel(frame);

        debug!(glare_pixels, threshold, "Glare mask computed");
        info!(coverage, has_glare, peak = ?peak_location, "Glare scored");

        GlareResult {
            coverage,
            has_glare,
            mask,
            score_map,
            peak_location,
        }
    }
}

/// First pixel (row-major) with the maximal BT.601 luma.
fn brightest_pixel(frame: &RgbImage) -> Option<(u32, u32)> {
    let gray = luma_bt601(frame);
    let mut best: Option<((u32, u32), u8)> = None;
    for (x, y, pixel) in gray.enumerate_pixels() {
        let value = pixel.0[0];
        if best.is_none_or(|(_, top)| value > top) {
            best = Some(((x, y), value));
        }
    }
    best.map(|(location, _)| location)
}

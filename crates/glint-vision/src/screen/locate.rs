// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Screen localization — finds the phone screen in a frame by isolating dark
// bezel regions, tracing their outlines, and ranking the resulting rotated
// rectangles by area, tilt, and aspect ratio.

use glint_core::config::{BilateralConfig, ScreenConfig};
use glint_core::{CandidateScore, Point, Quad};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, RgbImage};
use imageproc::contours::{BorderType, find_contours};
use imageproc::contrast::equalize_histogram;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::geometry::min_area_rect;
use imageproc::morphology::close;
use imageproc::point::Point as PixelPoint;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::photometric::luma_bt601;

/// Best-ranked screen quad and the measurements that ranked it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreenCandidate {
    /// Minimal-area rotated rectangle around the winning contour.
    pub quad: Quad,
    pub score: CandidateScore,
}

/// Locates the most screen-like rectangle in a frame.
///
/// The phone is assumed to be held upright, so candidates are measured in
/// portrait orientation and must lean no more than `max_tilt_deg` from
/// vertical.
#[derive(Debug, Clone)]
pub struct ScreenLocator {
    config: ScreenConfig,
}

impl ScreenLocator {
    pub fn new(config: ScreenConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScreenConfig {
        &self.config
    }

    /// Locate the screen in any image. `None` means no candidate qualified.
    pub fn locate(&self, frame: &DynamicImage) -> Option<ScreenCandidate> {
        self.locate_rgb(&frame.to_rgb8())
    }

    /// Locate the screen in a three-channel frame, converted with BT.601 luma.
    pub fn locate_rgb(&self, frame: &RgbImage) -> Option<ScreenCandidate> {
        self.locate_gray(&luma_bt601(frame))
    }

    /// Locate the screen in an already-grayscale frame.
    #[instrument(skip_all, fields(width = gray.width(), height = gray.height()))]
    pub fn locate_gray(&self, gray: &GrayImage) -> Option<ScreenCandidate> {
        if gray.width() == 0 || gray.height() == 0 {
            warn!("Empty frame; no screen to locate");
            return None;
        }

        let edges = self.edge_map(gray);
        let contours = external_contours(&edges);
        debug!(contour_count = contours.len(), "External contours extracted");

        let best = self.select_best(&contours);
        match &best {
            Some(candidate) => info!(
                area = candidate.score.area,
                aspect_ratio = candidate.score.aspect_ratio,
                tilt_deg = candidate.score.tilt_deg,
                "Screen located"
            ),
            None => info!("No screen detected"),
        }
        best
    }

    /// Closed edge map of the dark intensity band.
    ///
    /// 1. Histogram equalization
    /// 2. Bilateral filter (noise suppression that keeps bezel edges)
    /// 3. Dark band mask `0..=dark_threshold`
    /// 4. Canny edge detection on the mask
    /// 5. Morphological closing so bezel outlines become closed curves
    pub fn edge_map(&self, gray: &GrayImage) -> GrayImage {
        let equalized = equalize_histogram(gray);
        let smoothed = bilateral_filter(&equalized, &self.config.bilateral);
        let dark = dark_band_mask(&smoothed, self.config.dark_threshold);

        let (low, high) = self.config.canny_thresholds;
        let edges = canny(&dark, low, high);
        let closed = close(&edges, Norm::LInf, self.config.closing_radius);
        debug!(
            dark_threshold = self.config.dark_threshold,
            closing_radius = self.config.closing_radius,
            "Edge map built"
        );
        closed
    }

    /// Measure one contour.
    ///
    /// Returns `None` when the contour is below `min_area` (equality passes)
    /// or too degenerate to fit a rectangle; otherwise the measured candidate,
    /// whether or not it [`qualifies`](Self::qualifies).
    pub fn measure(&self, contour: &[PixelPoint<i32>]) -> Option<ScreenCandidate> {
        if contour.len() < 3 {
            return None;
        }
        let area = shoelace_area(contour);
        if area < self.config.min_area || area <= 0.0 {
            return None;
        }

        let rect = min_area_rect(contour);
        let quad = Quad::new(rect.map(|p| Point::new(p.x as f32, p.y as f32)));

        // Portrait orientation: the long side is the height.
        let (mut width, mut height, mut angle) = (quad.width(), quad.height(), quad.angle());
        if height < width {
            angle += 90.0;
            std::mem::swap(&mut width, &mut height);
        }
        if width <= 0.0 {
            return None;
        }

        let aspect_ratio = height / width;
        Some(ScreenCandidate {
            quad,
            score: CandidateScore {
                area,
                aspect_ratio,
                tilt_deg: normalize_tilt(angle),
                aspect_deviation: (aspect_ratio - self.config.target_aspect_ratio).abs(),
            },
        })
    }

    /// Phone-like proportions and close enough to upright.
    pub fn qualifies(&self, score: &CandidateScore) -> bool {
        let (lo, hi) = self.config.aspect_ratio_bounds;
        lo < score.aspect_ratio
            && score.aspect_ratio < hi
            && score.tilt_deg.abs() <= self.config.max_tilt_deg
    }

    /// Pick the qualifying contour whose aspect ratio is closest to the
    /// target. The first contour wins ties.
    pub fn select_best<C: AsRef<[PixelPoint<i32>]>>(
        &self,
        contours: &[C],
    ) -> Option<ScreenCandidate> {
        let mut best: Option<ScreenCandidate> = None;

        for contour in contours {
            let Some(candidate) = self.measure(contour.as_ref()) else {
                continue;
            };
            let score = candidate.score;
            let qualifies = self.qualifies(&score);
            debug!(
                area = score.area,
                aspect_ratio = score.aspect_ratio,
                tilt_deg = score.tilt_deg,
                qualifies,
                "Screen candidate"
            );
            if !qualifies {
                continue;
            }
            if best.is_none_or(|b| score.aspect_deviation < b.score.aspect_deviation) {
                best = Some(candidate);
            }
        }

        best
    }
}

/// Fold an angle in degrees into (-90, 90].
fn normalize_tilt(mut degrees: f32) -> f32 {
    while degrees > 90.0 {
        degrees -= 180.0;
    }
    while degrees <= -90.0 {
        degrees += 180.0;
    }
    degrees
}

// -- Contour helpers ----------------------------------------------------------

/// Outer borders that are not nested in any other border.
fn external_contours(edges: &GrayImage) -> Vec<Vec<PixelPoint<i32>>> {
    find_contours::<i32>(edges)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .map(|c| c.points)
        .collect()
}

/// Area of a closed polygon by the shoelace formula.
fn shoelace_area(points: &[PixelPoint<i32>]) -> f64 {
    let n = points.len();
    let mut twice_area = 0i64;
    for i in 0..n {
        let j = (i + 1) % n;
        twice_area += points[i].x as i64 * points[j].y as i64;
        twice_area -= points[j].x as i64 * points[i].y as i64;
    }
    twice_area.abs() as f64 / 2.0
}

// -- Filter helpers -----------------------------------------------------------

/// Binary mask of pixels at or below `threshold` (255 = dark).
fn dark_band_mask(gray: &GrayImage, threshold: u8) -> GrayImage {
    ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y).0[0] <= threshold {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Edge-preserving bilateral filter over a circular neighbourhood.
///
/// Each neighbour is weighted by a spatial Gaussian (`sigma_space`) times an
/// intensity Gaussian (`sigma_color`) on its difference from the centre.
/// Neighbours outside the image are skipped.
fn bilateral_filter(gray: &GrayImage, params: &BilateralConfig) -> GrayImage {
    let radius = (params.diameter / 2) as i64;
    let color_coeff = -0.5 / (params.sigma_color * params.sigma_color);
    let space_coeff = -0.5 / (params.sigma_space * params.sigma_space);

    let color_weights: Vec<f32> = (0..256)
        .map(|d| ((d * d) as f32 * color_coeff).exp())
        .collect();
    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let d2 = dx * dx + dy * dy;
            if d2 <= radius * radius {
                offsets.push((dx, dy, (d2 as f32 * space_coeff).exp()));
            }
        }
    }

    let (w, h) = (gray.width() as i64, gray.height() as i64);
    ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        let centre = gray.get_pixel(x, y).0[0];
        let (mut acc, mut norm) = (0f32, 0f32);
        for &(dx, dy, spatial) in &offsets {
            let (nx, ny) = (x as i64 + dx, y as i64 + dy);
            if nx < 0 || ny < 0 || nx >= w || ny >= h {
                continue;
            }
            let value = gray.get_pixel(nx as u32, ny as u32).0[0];
            let weight = spatial * color_weights[centre.abs_diff(value) as usize];
            acc += weight * value as f32;
            norm += weight;
        }
        // The centre always contributes weight 1, so `norm` is positive.
        Luma([(acc / norm).round().clamp(0.0, 255.0) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator() -> ScreenLocator {
        ScreenLocator::new(ScreenConfig::default())
    }

    /// Axis-aligned rectangle contour with its top-left corner at (x, y).
    fn rect(x: i32, y: i32, w: i32, h: i32) -> Vec<PixelPoint<i32>> {
        vec![
            PixelPoint::new(x, y),
            PixelPoint::new(x + w, y),
            PixelPoint::new(x + w, y + h),
            PixelPoint::new(x, y + h),
        ]
    }

    /// Rectangle of size w × h centred on (cx, cy), rotated by `degrees`.
    fn rotated_rect(cx: f32, cy: f32, w: f32, h: f32, degrees: f32) -> Vec<PixelPoint<i32>> {
        let (sin, cos) = degrees.to_radians().sin_cos();
        [(-w / 2.0, -h / 2.0), (w / 2.0, -h / 2.0), (w / 2.0, h / 2.0), (-w / 2.0, h / 2.0)]
            .iter()
            .map(|&(dx, dy)| {
                PixelPoint::new(
                    (cx + dx * cos - dy * sin).round() as i32,
                    (cy + dx * sin + dy * cos).round() as i32,
                )
            })
            .collect()
    }

    #[test]
    fn normalize_tilt_folds_into_half_open_range() {
        assert_eq!(normalize_tilt(0.0), 0.0);
        assert_eq!(normalize_tilt(90.0), 90.0);
        assert_eq!(normalize_tilt(-90.0), 90.0);
        assert_eq!(normalize_tilt(180.0), 0.0);
        assert_eq!(normalize_tilt(100.0), -80.0);
        assert_eq!(normalize_tilt(-100.0), 80.0);
        assert_eq!(normalize_tilt(270.0), 90.0);
    }

    #[test]
    fn shoelace_area_rectangle() {
        assert_eq!(shoelace_area(&rect(5, 5, 10, 20)), 200.0);
    }

    #[test]
    fn selects_screen_among_small_decoys() {
        let contours = vec![
            rect(0, 0, 20, 30),
            rect(300, 10, 40, 60),
            rect(100, 50, 90, 160),
            rect(10, 300, 50, 50),
        ];
        let best = locator().select_best(&contours).expect("screen qualifies");

        assert_eq!(best.score.area, 14400.0);
        assert!((best.score.aspect_ratio - 160.0 / 90.0).abs() < 1e-3);
        assert!(best.score.tilt_deg.abs() < 1e-3);
        let center = best.quad.center();
        assert!((center.x - 145.0).abs() < 0.5 && (center.y - 130.0).abs() < 0.5);
    }

    #[test]
    fn closest_aspect_ratio_wins() {
        let contours = vec![rect(0, 0, 80, 180), rect(200, 0, 90, 160)];
        let best = locator().select_best(&contours).unwrap();
        assert!((best.quad.center().x - 245.0).abs() < 0.5);
    }

    #[test]
    fn first_candidate_wins_ties() {
        let contours = vec![rect(0, 0, 90, 160), rect(200, 0, 90, 160)];
        let best = locator().select_best(&contours).unwrap();
        assert!((best.quad.center().x - 45.0).abs() < 0.5);
    }

    #[test]
    fn landscape_rectangle_is_rejected() {
        let contours = vec![rect(0, 0, 160, 90)];
        let measured = locator().measure(&contours[0]).unwrap();
        assert!((measured.score.tilt_deg.abs() - 90.0).abs() < 1e-3);
        assert!(locator().select_best(&contours).is_none());
    }

    #[test]
    fn tilt_beyond_limit_is_rejected() {
        let contours = vec![rotated_rect(200.0, 200.0, 90.0, 160.0, 30.0)];
        assert!(locator().select_best(&contours).is_none());

        let lenient = ScreenLocator::new(ScreenConfig {
            max_tilt_deg: 35.0,
            ..ScreenConfig::default()
        });
        let best = lenient.select_best(&contours).expect("within 35 degrees");
        assert!((best.score.tilt_deg.abs() - 30.0).abs() < 2.0);
    }

    #[test]
    fn small_tilt_is_accepted() {
        let contours = vec![rotated_rect(200.0, 200.0, 90.0, 160.0, -10.0)];
        let best = locator().select_best(&contours).expect("within 20 degrees");
        assert!((best.score.tilt_deg.abs() - 10.0).abs() < 2.0);
        assert!((best.score.aspect_ratio - 1.78).abs() < 0.1);
    }

    #[test]
    fn aspect_ratio_bounds_are_exclusive() {
        // Square and very tall candidates fall outside (1.3, 2.5).
        let contours = vec![rect(0, 0, 100, 100), rect(200, 0, 60, 180)];
        assert!(locator().select_best(&contours).is_none());
    }

    #[test]
    fn min_area_is_inclusive() {
        // 40 × 75 = 3000 with aspect 1.875.
        let contours = vec![rect(10, 10, 40, 75)];
        assert!(locator().select_best(&contours).is_some());

        let stricter = ScreenLocator::new(ScreenConfig {
            min_area: 3001.0,
            ..ScreenConfig::default()
        });
        assert!(stricter.select_best(&contours).is_none());
    }

    #[test]
    fn degenerate_contours_are_skipped() {
        let line = vec![PixelPoint::new(0, 0), PixelPoint::new(100, 0)];
        let collinear = vec![
            PixelPoint::new(0, 0),
            PixelPoint::new(50, 0),
            PixelPoint::new(100, 0),
        ];
        let permissive = ScreenLocator::new(ScreenConfig {
            min_area: 0.0,
            ..ScreenConfig::default()
        });
        assert!(permissive.measure(&line).is_none());
        assert!(permissive.measure(&collinear).is_none());
    }

    #[test]
    fn locates_dark_phone_on_bright_background() {
        let frame = GrayImage::from_fn(400, 300, |x, y| {
            if (150..240).contains(&x) && (60..220).contains(&y) {
                Luma([20u8])
            } else {
                Luma([200u8])
            }
        });
        let best = locator().locate_gray(&frame).expect("phone outline found");

        let center = best.quad.center();
        assert!((center.x - 195.0).abs() < 5.0, "center {center:?}");
        assert!((center.y - 140.0).abs() < 5.0, "center {center:?}");
        assert!(
            best.score.aspect_ratio > 1.6 && best.score.aspect_ratio < 1.95,
            "aspect {}",
            best.score.aspect_ratio
        );
        assert!(best.score.tilt_deg.abs() < 3.0);
    }

    #[test]
    fn colour_frames_use_bt601_luma() {
        // Saturated red phone on a green backdrop: BT.601 makes the phone the
        // darker region (76 vs 150).
        let frame = RgbImage::from_fn(400, 300, |x, y| {
            if (150..240).contains(&x) && (60..220).contains(&y) {
                image::Rgb([255u8, 0, 0])
            } else {
                image::Rgb([0u8, 255, 0])
            }
        });
        let from_rgb = locator().locate_rgb(&frame);
        let from_luma = locator().locate_gray(&luma_bt601(&frame));
        assert_eq!(from_rgb, from_luma);
        assert_eq!(locator().locate(&DynamicImage::ImageRgb8(frame)), from_rgb);
    }

    #[test]
    fn uniform_or_empty_frame_is_not_found() {
        let uniform = GrayImage::from_pixel(200, 200, Luma([180u8]));
        assert!(locator().locate_gray(&uniform).is_none());
        assert!(locator().locate_gray(&GrayImage::new(0, 0)).is_none());
        assert!(locator().locate(&DynamicImage::new_rgb8(0, 0)).is_none());
    }

    #[test]
    fn bilateral_filter_keeps_step_edges() {
        let step =
            GrayImage::from_fn(20, 10, |x, _| Luma([if x < 10 { 20u8 } else { 230u8 }]));
        let smoothed = bilateral_filter(&step, &BilateralConfig::default());
        assert!(smoothed.get_pixel(9, 5).0[0] < 50);
        assert!(smoothed.get_pixel(10, 5).0[0] > 200);
    }
}

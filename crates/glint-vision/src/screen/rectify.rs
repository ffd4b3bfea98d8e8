// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification — orders the corners of a detected screen quad
// and warps it to an upright, fronto-parallel rectangle.

use std::cmp::Ordering;

use glint_core::{OrderedCorners, Point, Quad};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use tracing::{debug, info, instrument, warn};

/// Quads with less area than this cannot be warped.
const MIN_QUAD_AREA: f32 = 1e-3;

/// Rectified screen image plus the corners it was cut from.
#[derive(Debug, Clone)]
pub struct RectifiedScreen {
    pub image: RgbImage,
    pub corners: OrderedCorners,
}

/// Label the four corners of a quad.
///
/// Image coordinates grow downward, so the top-left corner minimises `x + y`,
/// the bottom-right maximises it, the top-right maximises `x − y` and the
/// bottom-left minimises it. Ties are broken on `(x, y)`, which makes the
/// result independent of the input point order.
pub fn order_corners(quad: &Quad) -> OrderedCorners {
    let points = &quad.points;
    OrderedCorners {
        top_left: extreme(points, |p| p.x + p.y),
        top_right: extreme(points, |p| p.y - p.x),
        bottom_right: extreme(points, |p| -(p.x + p.y)),
        bottom_left: extreme(points, |p| p.x - p.y),
    }
}

/// Point with the smallest `key`, then smallest `(x, y)`.
fn extreme(points: &[Point; 4], key: impl Fn(&Point) -> f32) -> Point {
    let rank = |a: &Point, b: &Point| {
        key(a)
            .total_cmp(&key(b))
            .then(a.x.total_cmp(&b.x))
            .then(a.y.total_cmp(&b.y))
    };
    points[1..].iter().fold(points[0], |best, p| {
        if rank(p, &best) == Ordering::Less { *p } else { best }
    })
}

/// Warps a screen quad to an upright rectangle.
///
/// The output keeps the longer of each pair of opposite edges, so the
/// rectified image is never smaller than the quad in either direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerspectiveRectifier;

impl PerspectiveRectifier {
    pub fn new() -> Self {
        Self
    }

    /// Output `(width, height)` for a set of ordered corners, each at least 1.
    pub fn output_size(corners: &OrderedCorners) -> (u32, u32) {
        let width = corners
            .bottom_right
            .distance(&corners.bottom_left)
            .max(corners.top_right.distance(&corners.top_left));
        let height = corners
            .top_right
            .distance(&corners.bottom_right)
            .max(corners.top_left.distance(&corners.bottom_left));
        (
            (width.round() as u32).max(1),
            (height.round() as u32).max(1),
        )
    }

    /// Rectify the quad out of any image.
    pub fn rectify(&self, frame: &DynamicImage, quad: &Quad) -> Option<RectifiedScreen> {
        self.rectify_rgb(&frame.to_rgb8(), quad)
    }

    /// Rectify the quad out of a three-channel frame.
    ///
    /// Returns `None` for an empty frame or a collinear quad. Pixels that map
    /// outside the frame are black.
    #[instrument(skip_all, fields(width = frame.width(), height = frame.height()))]
    pub fn rectify_rgb(&self, frame: &RgbImage, quad: &Quad) -> Option<RectifiedScreen> {
        if frame.width() == 0 || frame.height() == 0 {
            warn!("Empty frame; nothing to rectify");
            return None;
        }

        let corners = order_corners(quad);
        let area = polygon_area(&corners.to_array());
        if area < MIN_QUAD_AREA {
            warn!(area, "Degenerate quad; skipping rectification");
            return None;
        }

        let (out_w, out_h) = Self::output_size(&corners);
        let (max_x, max_y) = ((out_w - 1).max(1) as f32, (out_h - 1).max(1) as f32);
        let dest: [(f32, f32); 4] = [
            (0.0, 0.0),     // top-left
            (max_x, 0.0),   // top-right
            (max_x, max_y), // bottom-right
            (0.0, max_y),   // bottom-left
        ];
        let src = corners.to_array().map(|p| (p.x, p.y));

        let Some(projection) = Projection::from_control_points(src, dest) else {
            warn!("Failed to compute projective transform");
            return None;
        };

        let mut image = RgbImage::new(out_w, out_h);
        warp_into(frame, &projection, Interpolation::Bilinear, Rgb([0, 0, 0]), &mut image);

        debug!(area, "Quad warped");
        info!(out_w, out_h, "Screen rectified");
        Some(RectifiedScreen { image, corners })
    }
}

/// Area of a polygon given in order (CW or CCW), by the shoelace formula.
fn polygon_area(points: &[Point; 4]) -> f32 {
    let mut sum = 0.0f32;
    for i in 0..points.len() {
        let j = (i + 1) % points.len();
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    (sum / 2.0).abs()
}

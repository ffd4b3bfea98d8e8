// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Glint.

use serde::{Deserialize, Serialize};

/// A 2-D point in image coordinates (x to the right, y downward).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl From<Point> for (f32, f32) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

/// Four points proposed as the boundary of a (possibly rotated) rectangle.
///
/// The points are kept in the order they were produced. `width`, `height` and
/// `angle` are measured along the first two edges (`p0→p1` and `p1→p2`), which
/// for a minimal-area rectangle are its two sides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    pub points: [Point; 4],
}

impl Quad {
    pub fn new(points: [Point; 4]) -> Self {
        Self { points }
    }

    /// Length of the `p0→p1` edge.
    pub fn width(&self) -> f32 {
        self.points[0].distance(&self.points[1])
    }

    /// Length of the `p1→p2` edge.
    pub fn height(&self) -> f32 {
        self.points[1].distance(&self.points[2])
    }

    /// Direction of the `p0→p1` edge in degrees, in (-180, 180].
    pub fn angle(&self) -> f32 {
        let [p0, p1, ..] = self.points;
        (p1.y - p0.y).atan2(p1.x - p0.x).to_degrees()
    }

    /// Mean of the four points.
    pub fn center(&self) -> Point {
        let (sx, sy) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point::new(sx / 4.0, sy / 4.0)
    }
}

/// Quad corners labelled in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderedCorners {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
}

impl OrderedCorners {
    /// Corners as `[top_left, top_right, bottom_right, bottom_left]`.
    pub fn to_array(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }
}

/// Geometric measurements used to rank screen candidates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    /// Contour area in square pixels.
    pub area: f64,
    /// Long side over short side, after portrait re-orientation.
    pub aspect_ratio: f32,
    /// Signed tilt of the long axis from vertical, degrees in (-90, 90].
    pub tilt_deg: f32,
    /// `|aspect_ratio - target_aspect_ratio|`.
    pub aspect_deviation: f32,
}

/// Discrete repositioning instruction derived from the glare peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MoveInstruction {
    Left,
    Right,
    TiltUp,
    TiltDown,
    /// Glare sits inside the dead zone.
    Hold,
    /// No glare peak was available.
    #[serde(rename = "NONE")]
    NoGlare,
}

impl MoveInstruction {
    /// Operator-facing text for this instruction.
    pub fn message(&self) -> &'static str {
        match self {
            MoveInstruction::Left => "Move phone LEFT",
            MoveInstruction::Right => "Move phone RIGHT",
            MoveInstruction::TiltUp => "Tilt phone UP",
            MoveInstruction::TiltDown => "Tilt phone DOWN",
            MoveInstruction::Hold => "Hold still, glare centered",
            MoveInstruction::NoGlare => "No glare detected",
        }
    }
}

impl std::fmt::Display for MoveInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Which image the glare scorer measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlareTarget {
    /// The whole camera frame.
    #[default]
    Frame,
    /// Only the rectified screen surface.
    Screen,
}

/// How the glare hotspot driving the move instruction is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeakStrategy {
    /// Brightest grayscale pixel of the scored image.
    #[default]
    BrightestPixel,
    /// Centroid of the thresholded glare mask.
    MaskCentroid,
}

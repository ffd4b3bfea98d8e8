// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// glint-vision — Screen localization and glare guidance for Glint.
//
// Finds a phone screen in a camera frame (contour geometry), rectifies it to
// an upright image, scores specular glare from photometric cues, and turns
// the glare hotspot into a repositioning instruction. Every component is a
// pure function of its inputs and an immutable configuration.

pub mod advise;
pub mod glare;
pub mod photometric;
pub mod pipeline;
pub mod screen;

#[cfg(feature = "ocr")]
pub mod ocr;

// Re-export the primary structs so callers can use `glint_vision::GlareScorer` etc.
pub use advise::DirectionAdvisor;
pub use glare::{GlareResult, GlareScorer, GlareSummary};
pub use photometric::{FeatureMap, PhotometricFeatureExtractor, PhotometricFeatures};
pub use pipeline::{FrameReport, GlareGuide, ReportSummary};
pub use screen::locate::{ScreenCandidate, ScreenLocator};
pub use screen::rectify::{PerspectiveRectifier, RectifiedScreen, order_corners};

#[cfg(feature = "ocr")]
pub use ocr::OcrEngine;

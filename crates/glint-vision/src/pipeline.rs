// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-frame pipeline — locate the screen, rectify it, score glare and advise
// the operator, all from one validated configuration.

use glint_core::config::GlintConfig;
use glint_core::{
    CandidateScore, GlareTarget, MoveInstruction, OrderedCorners, PeakStrategy, Result,
};
use image::{DynamicImage, RgbImage};
use serde::Serialize;
use tracing::{info, instrument};

use crate::advise::DirectionAdvisor;
use crate::glare::{GlareResult, GlareScorer, GlareSummary};
use crate::screen::{PerspectiveRectifier, RectifiedScreen, ScreenCandidate, ScreenLocator};

/// Everything learned from one frame.
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub screen: Option<ScreenCandidate>,
    /// Upright screen image, the handoff to text recognition.
    pub rectified: Option<RectifiedScreen>,
    pub glare: Option<GlareResult>,
    /// Hotspot that drove the instruction, in scored-image coordinates.
    pub peak: Option<(u32, u32)>,
    pub instruction: MoveInstruction,
}

/// JSON-friendly view of a [`FrameReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub screen_found: bool,
    pub screen: Option<CandidateScore>,
    pub corners: Option<OrderedCorners>,
    pub rectified_size: Option<(u32, u32)>,
    pub glare: Option<GlareSummary>,
    pub peak: Option<(u32, u32)>,
    pub instruction: MoveInstruction,
    pub message: String,
}

impl FrameReport {
    pub fn screen_found(&self) -> bool {
        self.screen.is_some()
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            screen_found: self.screen_found(),
            screen: self.screen.map(|s| s.score),
            corners: self.rectified.as_ref().map(|r| r.corners),
            rectified_size: self.rectified.as_ref().map(|r| r.image.dimensions()),
            glare: self.glare.as_ref().map(GlareResult::summary),
            peak: self.peak,
            instruction: self.instruction,
            message: self.instruction.message().to_string(),
        }
    }
}

/// Glare guidance for a stream of frames.
///
/// Holds only immutable components, so one instance can be shared across
/// threads behind an `Arc`.
#[derive(Debug, Clone)]
pub struct GlareGuide {
    config: GlintConfig,
    locator: ScreenLocator,
    rectifier: PerspectiveRectifier,
    scorer: GlareScorer,
    advisor: DirectionAdvisor,
}

impl GlareGuide {
    /// Build the pipeline. Fails if the configuration is out of range.
    pub fn new(config: GlintConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            locator: ScreenLocator::new(config.screen),
            rectifier: PerspectiveRectifier::new(),
            scorer: GlareScorer::new(config.glare),
            advisor: DirectionAdvisor::from_config(&config.advisor),
            config,
        })
    }

    pub fn config(&self) -> &GlintConfig {
        &self.config
    }

    /// Process any image.
    pub fn process(&self, frame: &DynamicImage) -> FrameReport {
        self.process_rgb(&frame.to_rgb8())
    }

    /// Process a three-channel frame.
    #[instrument(skip_all, fields(width = frame.width(), height = frame.height()))]
    pub fn process_rgb(&self, frame: &RgbImage) -> FrameReport {
        let pipeline = &self.config.pipeline;

        let screen = self.locator.locate_rgb(frame);
        if screen.is_none() && pipeline.require_screen {
            info!(found = false, instruction = %MoveInstruction::NoGlare, "Frame processed");
            return FrameReport {
                screen: None,
                rectified: None,
                glare: None,
                peak: None,
                instruction: MoveInstruction::NoGlare,
            };
        }

        let rectified = screen.and_then(|s| self.rectifier.rectify_rgb(frame, &s.quad));

        let target = match (pipeline.glare_target, &rectified) {
            (GlareTarget::Screen, Some(r)) => &r.image,
            _ => frame,
        };
        let glare = self.scorer.score_rgb(target);

        let peak = match pipeline.peak_strategy {
            PeakStrategy::BrightestPixel => glare.peak_location,
            PeakStrategy::MaskCentroid => glare.mask_centroid(),
        };
        let instruction = self.advisor.advise(peak, target.dimensions());

        info!(
            found = screen.is_some(),
            coverage = glare.coverage,
            has_glare = glare.has_glare,
            instruction = %instruction,
            "Frame processed"
        );

        FrameReport {
            screen,
            rectified,
            glare: Some(glare),
            peak,
            instruction,
        }
    }
}

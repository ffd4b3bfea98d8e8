// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.
//
// One immutable `GlintConfig` is built up front (defaults, or a JSON file
// with any subset of fields) and handed to each component. Every section
// carries `#[serde(default)]` so partial files are accepted.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GlintError, Result};
use crate::types::{GlareTarget, PeakStrategy};

/// Complete configuration for the locate → rectify → score → advise pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlintConfig {
    pub glare: GlareConfig,
    pub screen: ScreenConfig,
    pub advisor: AdvisorConfig,
    pub pipeline: PipelineConfig,
}

/// Relative weights of the three glare cues.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlareWeights {
    /// Weight of the bright-illumination cue.
    pub intensity: f32,
    /// Weight of the low-saturation cue.
    pub low_saturation: f32,
    /// Weight of the low-local-contrast cue.
    pub low_contrast: f32,
}

impl GlareWeights {
    pub fn sum(&self) -> f32 {
        self.intensity + self.low_saturation + self.low_contrast
    }
}

impl Default for GlareWeights {
    fn default() -> Self {
        Self {
            intensity: 0.45,
            low_saturation: 0.35,
            low_contrast: 0.20,
        }
    }
}

/// Photometric glare scoring parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlareConfig {
    /// Odd side length of the local-contrast window.
    pub window: u32,
    pub weights: GlareWeights,
    /// Per-pixel score cutoff in [0, 1].
    pub score_thresh: f32,
    /// Fraction of glare pixels at which the frame is flagged, in [0, 1].
    pub coverage_thresh: f32,
    /// Lower and upper percentiles used by robust normalization.
    pub percentiles: (f32, f32),
}

impl Default for GlareConfig {
    fn default() -> Self {
        Self {
            window: 15,
            weights: GlareWeights::default(),
            score_thresh: 0.65,
            coverage_thresh: 0.02,
            percentiles: (2.0, 98.0),
        }
    }
}

/// Edge-preserving smoothing parameters for the screen locator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BilateralConfig {
    /// Neighbourhood diameter in pixels.
    pub diameter: u32,
    pub sigma_color: f32,
    pub sigma_space: f32,
}

impl Default for BilateralConfig {
    fn default() -> Self {
        Self {
            diameter: 9,
            sigma_color: 75.0,
            sigma_space: 75.0,
        }
    }
}

/// Contour-based screen localization parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    /// Minimum contour area in square pixels (inclusive).
    pub min_area: f64,
    /// Maximum absolute tilt of the long axis from vertical, in degrees.
    pub max_tilt_deg: f32,
    pub target_aspect_ratio: f32,
    /// Exclusive bounds on the portrait aspect ratio.
    pub aspect_ratio_bounds: (f32, f32),
    /// Upper bound of the dark intensity band isolated before edge detection.
    pub dark_threshold: u8,
    /// Canny low/high hysteresis thresholds.
    pub canny_thresholds: (f32, f32),
    /// L-infinity radius of the closing element (2 → 5×5 square).
    pub closing_radius: u8,
    pub bilateral: BilateralConfig,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            min_area: 3000.0,
            max_tilt_deg: 20.0,
            target_aspect_ratio: 1.78,
            aspect_ratio_bounds: (1.3, 2.5),
            dark_threshold: 50,
            canny_thresholds: (50.0, 150.0),
            closing_radius: 2,
            bilateral: BilateralConfig::default(),
        }
    }
}

/// Direction advice parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Half-width of the central dead zone as a fraction of each dimension.
    pub dead_zone_fraction: f32,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            dead_zone_fraction: 0.2,
        }
    }
}

/// How the pipeline chains its components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub glare_target: GlareTarget,
    pub peak_strategy: PeakStrategy,
    /// Skip glare scoring when no screen is located.
    pub require_screen: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            glare_target: GlareTarget::Frame,
            peak_strategy: PeakStrategy::BrightestPixel,
            require_screen: true,
        }
    }
}

impl GlintConfig {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every field against its documented range.
    pub fn validate(&self) -> Result<()> {
        let glare = &self.glare;
        if glare.window == 0 || glare.window % 2 == 0 || glare.window > MAX_GLARE_WINDOW {
            return Err(invalid(format!(
                "glare.window must be an odd number in 1..={MAX_GLARE_WINDOW}, got {}",
                glare.window
            )));
        }
        let w = glare.weights;
        for (name, value) in [
            ("intensity", w.intensity),
            ("low_saturation", w.low_saturation),
            ("low_contrast", w.low_contrast),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!(
                    "glare.weights.{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if w.sum() <= 0.0 {
            return Err(invalid("glare.weights must not all be zero".into()));
        }
        check_unit("glare.score_thresh", glare.score_thresh)?;
        check_unit("glare.coverage_thresh", glare.coverage_thresh)?;
        let (p_lo, p_hi) = glare.percentiles;
        if !(0.0..=100.0).contains(&p_lo) || !(0.0..=100.0).contains(&p_hi) || p_lo >= p_hi {
            return Err(invalid(format!(
                "glare.percentiles must satisfy 0 <= lo < hi <= 100, got ({p_lo}, {p_hi})"
            )));
        }

        let screen = &self.screen;
        if !screen.min_area.is_finite() || screen.min_area < 0.0 {
            return Err(invalid(format!(
                "screen.min_area must be non-negative, got {}",
                screen.min_area
            )));
        }
        if !(0.0..=90.0).contains(&screen.max_tilt_deg) {
            return Err(invalid(format!(
                "screen.max_tilt_deg must be within [0, 90], got {}",
                screen.max_tilt_deg
            )));
        }
        let (ar_lo, ar_hi) = screen.aspect_ratio_bounds;
        if !(ar_lo >= 1.0 && ar_lo < ar_hi) {
            return Err(invalid(format!(
                "screen.aspect_ratio_bounds must satisfy 1 <= lo < hi, got ({ar_lo}, {ar_hi})"
            )));
        }
        if !(screen.target_aspect_ratio.is_finite() && screen.target_aspect_ratio > 0.0) {
            return Err(invalid(format!(
                "screen.target_aspect_ratio must be positive, got {}",
                screen.target_aspect_ratio
            )));
        }
        let (canny_lo, canny_hi) = screen.canny_thresholds;
        if !(canny_lo >= 0.0 && canny_lo <= canny_hi) {
            return Err(invalid(format!(
                "screen.canny_thresholds must satisfy 0 <= low <= high, \
                 got ({canny_lo}, {canny_hi})"
            )));
        }
        let bilateral = &screen.bilateral;
        if bilateral.diameter == 0 || bilateral.sigma_color <= 0.0 || bilateral.sigma_space <= 0.0
        {
            return Err(invalid(
                "screen.bilateral needs a positive diameter and positive sigmas".into(),
            ));
        }

        let fraction = self.advisor.dead_zone_fraction;
        if !(0.0..=0.5).contains(&fraction) {
            return Err(invalid(format!(
                "advisor.dead_zone_fraction must be within [0, 0.5], got {fraction}"
            )));
        }
        Ok(())
    }
}

/// Largest local-contrast window accepted by [`GlintConfig::validate`].
pub const MAX_GLARE_WINDOW: u32 = 255;

fn invalid(message: String) -> GlintError {
    GlintError::InvalidConfig(message)
}

fn check_unit(name: &str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be within [0, 1], got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = GlintConfig::default();
        config.validate().expect("defaults must validate");
        assert_eq!(config.glare.window, 15);
        assert_eq!(config.screen.min_area, 3000.0);
        assert_eq!(config.screen.aspect_ratio_bounds, (1.3, 2.5));
        assert_eq!(config.advisor.dead_zone_fraction, 0.2);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = GlintConfig::from_json_str(
            r#"{ "glare": { "score_thresh": 0.7 }, "pipeline": { "glare_target": "screen" } }"#,
        )
        .unwrap();
        assert_eq!(config.glare.score_thresh, 0.7);
        assert_eq!(config.glare.window, 15);
        assert_eq!(config.pipeline.glare_target, GlareTarget::Screen);
        assert_eq!(config.pipeline.peak_strategy, PeakStrategy::BrightestPixel);
        assert_eq!(config.screen, ScreenConfig::default());
    }

    #[test]
    fn even_window_is_rejected() {
        let err = GlintConfig::from_json_str(r#"{ "glare": { "window": 14 } }"#).unwrap_err();
        assert!(matches!(err, GlintError::InvalidConfig(_)), "got {err:?}");
    }

    #[test]
    fn oversized_window_is_rejected() {
        let mut config = GlintConfig::default();
        config.glare.window = MAX_GLARE_WINDOW;
        assert!(config.validate().is_ok());

        let err = GlintConfig::from_json_str(r#"{ "glare": { "window": 10001 } }"#).unwrap_err();
        assert!(matches!(err, GlintError::InvalidConfig(_)), "got {err:?}");
    }

    #[test]
    fn negative_or_all_zero_weights_are_rejected() {
        let mut config = GlintConfig::default();
        config.glare.weights.low_contrast = -0.1;
        assert!(config.validate().is_err());

        config.glare.weights = GlareWeights {
            intensity: 0.0,
            low_saturation: 0.0,
            low_contrast: 0.0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn thresholds_outside_unit_interval_are_rejected() {
        let mut config = GlintConfig::default();
        config.glare.coverage_thresh = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = GlintConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, GlintError::Serialization(_)));
    }

    #[test]
    fn load_round_trips_through_a_file() {
        let mut config = GlintConfig::default();
        config.screen.max_tilt_deg = 30.0;
        config.pipeline.peak_strategy = PeakStrategy::MaskCentroid;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_json_pretty().unwrap().as_bytes())
            .unwrap();

        let loaded = GlintConfig::load(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = GlintConfig::load("/nonexistent/glint/config.json").unwrap_err();
        assert!(matches!(err, GlintError::Io(_)));
    }
}

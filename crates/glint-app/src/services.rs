// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared wiring for the CLI commands: configuration loading, recognizer
// selection, the recognise-and-save handoff, and report formatting.

use std::path::Path;
use std::sync::Arc;

use glint_bridge::{NullRecognizer, ScreenSink, TextRecognizer};
use glint_core::{GlintConfig, Result};
use glint_vision::{FrameReport, ReportSummary};
use image::DynamicImage;
use tracing::{debug, info, warn};

/// Load and validate `path`, or fall back to the defaults.
pub fn load_config(path: Option<&Path>) -> Result<GlintConfig> {
    match path {
        Some(path) => {
            let config = GlintConfig::load(path)?;
            info!(path = %path.display(), "Configuration loaded");
            Ok(config)
        }
        None => Ok(GlintConfig::default()),
    }
}

/// Pick the text recognizer for this build.
///
/// With the `ocr` feature, models come from `models_dir` or the default cache
/// directory; missing default models fall back to no recognition.
#[cfg(feature = "ocr")]
pub fn build_recognizer(models_dir: Option<&Path>) -> Result<Arc<dyn TextRecognizer>> {
    use glint_vision::ocr::{OcrEngine, model_directory, models_available};

    match models_dir {
        Some(dir) => Ok(Arc::new(OcrEngine::from_model_dir(dir)?)),
        None if models_available() => Ok(Arc::new(OcrEngine::with_defaults()?)),
        None => {
            warn!(
                dir = %model_directory().display(),
                "OCR models not found; text recognition disabled"
            );
            Ok(Arc::new(NullRecognizer))
        }
    }
}

#[cfg(not(feature = "ocr"))]
pub fn build_recognizer(models_dir: Option<&Path>) -> Result<Arc<dyn TextRecognizer>> {
    if let Some(dir) = models_dir {
        warn!(
            dir = %dir.display(),
            "Built without the `ocr` feature; ignoring OCR models"
        );
    }
    Ok(Arc::new(NullRecognizer))
}

/// Read the rectified screen, if there is one.
pub fn read_screen(
    recognizer: &dyn TextRecognizer,
    report: &FrameReport,
) -> Result<Vec<String>> {
    match &report.rectified {
        Some(rectified) => {
            recognizer.recognize_lines(&DynamicImage::ImageRgb8(rectified.image.clone()))
        }
        None => Ok(Vec::new()),
    }
}

/// Write the rectified screen and its text. Nothing is written without a screen.
pub fn save_artifacts(
    sink: &dyn ScreenSink,
    report: &FrameReport,
    lines: &[String],
) -> Result<()> {
    let Some(rectified) = &report.rectified else {
        return Ok(());
    };
    let screen_path = sink.save_screen(&rectified.image)?;
    let text_path = sink.save_text(lines)?;
    debug!(
        screen = %screen_path.display(),
        text = %text_path.display(),
        "Artifacts written"
    );
    Ok(())
}

/// Human-readable multi-line report.
pub fn format_summary(label: &str, summary: &ReportSummary) -> String {
    let mut out = format!("{label}\n");

    match &summary.screen {
        Some(score) => out.push_str(&format!(
            "  screen:      found (aspect {:.2}, tilt {:.1} deg, area {:.0} px)\n",
            score.aspect_ratio, score.tilt_deg, score.area
        )),
        None => out.push_str("  screen:      not found\n"),
    }
    if let Some((w, h)) = summary.rectified_size {
        out.push_str(&format!("  rectified:   {w}x{h}\n"));
    }
    if let Some(glare) = &summary.glare {
        out.push_str(&format!(
            "  glare:       {:.1}% coverage{}\n",
            glare.coverage * 100.0,
            if glare.has_glare { " (glare)" } else { "" }
        ));
    }
    out.push_str(&format!("  instruction: {}", summary.message));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_core::MoveInstruction;

    #[test]
    fn missing_config_path_uses_defaults() {
        assert_eq!(load_config(None).unwrap(), GlintConfig::default());
    }

    #[test]
    fn config_file_is_loaded_and_validated() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        std::fs::write(&good, r#"{ "advisor": { "dead_zone_fraction": 0.1 } }"#).unwrap();
        assert_eq!(load_config(Some(&good)).unwrap().advisor.dead_zone_fraction, 0.1);

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{ "glare": { "window": 8 } }"#).unwrap();
        assert!(load_config(Some(&bad)).is_err());
    }

    #[cfg(not(feature = "ocr"))]
    #[test]
    fn recognizer_without_ocr_feature_is_null() {
        let recognizer = build_recognizer(Some(Path::new("/models"))).unwrap();
        assert_eq!(recognizer.name(), "none");
    }

    #[test]
    fn summary_text_for_missing_screen() {
        let summary = ReportSummary {
            screen_found: false,
            screen: None,
            corners: None,
            rectified_size: None,
            glare: None,
            peak: None,
            instruction: MoveInstruction::NoGlare,
            message: MoveInstruction::NoGlare.message().to_string(),
        };
        let text = format_summary("frame.jpg", &summary);
        assert!(text.starts_with("frame.jpg\n"));
        assert!(text.contains("screen:      not found"));
        assert!(text.ends_with("instruction: No glare detected"));
    }
}

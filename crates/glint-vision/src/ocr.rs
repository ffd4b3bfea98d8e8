// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text recognition on rectified screens.
//
// Wraps the pure-Rust `ocrs` engine (models executed by `rten`) behind the
// `TextRecognizer` bridge trait. Only compiled with the `ocr` feature.
//
// The engine needs two model files:
//
// - `text-detection.rten` — locates text regions
// - `text-recognition.rten` — decodes characters in each region
//
// Running `ocrs-cli` once downloads both to `$XDG_CACHE_HOME/ocrs`
// (typically `~/.cache/ocrs`), the default lookup directory.

use std::path::{Path, PathBuf};

use glint_bridge::TextRecognizer;
use glint_core::{GlintError, Result};
use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams};
use rten::Model;
use tracing::{debug, info, instrument};

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// `$XDG_CACHE_HOME/ocrs`, falling back to `~/.cache/ocrs`.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Locations of the two OCR model files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrConfig {
    /// Both models in `dir` under their well-known filenames.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    pub fn from_paths(
        detection_model: impl Into<PathBuf>,
        recognition_model: impl Into<PathBuf>,
    ) -> Self {
        Self {
            detection_model_path: detection_model.into(),
            recognition_model_path: recognition_model.into(),
        }
    }

    /// Check that both model files exist.
    pub fn validate(&self) -> Result<()> {
        for (kind, path) in [
            ("detection", &self.detection_model_path),
            ("recognition", &self.recognition_model_path),
        ] {
            if !path.exists() {
                return Err(GlintError::OcrError(format!(
                    "{kind} model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// OCR engine loaded once and reused for every rectified screen.
///
/// `ocrs` and `rten` are very slow in debug builds; run release builds when
/// OCR is enabled.
pub struct OcrEngine {
    engine: OcrsEngine,
}

impl std::fmt::Debug for OcrEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrEngine").finish_non_exhaustive()
    }
}

impl OcrEngine {
    /// Load both models. Fails with [`GlintError::OcrError`] if either is
    /// missing or corrupt.
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: OcrConfig) -> Result<Self> {
        config.validate()?;

        info!("Loading OCR detection model");
        let detection_model = load_model(&config.detection_model_path, "detection")?;
        info!("Loading OCR recognition model");
        let recognition_model = load_model(&config.recognition_model_path, "recognition")?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| GlintError::OcrError(format!("failed to initialise OCR engine: {err}")))?;

        info!("OCR engine initialised");
        Ok(Self { engine })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(OcrConfig::default())
    }

    pub fn from_model_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Self::new(OcrConfig::from_dir(dir))
    }

    /// All recognised text, lines joined by newlines.
    pub fn recognize_text(&self, image: &DynamicImage) -> Result<String> {
        Ok(self.recognize_lines(image)?.join("\n"))
    }

    /// Non-empty recognised lines in reading order.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn recognize_lines(&self, image: &DynamicImage) -> Result<Vec<String>> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            GlintError::OcrError(format!(
                "failed to create image source ({width}x{height}): {err}"
            ))
        })?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| GlintError::OcrError(format!("OCR preprocessing failed: {err}")))?;

        let words = self
            .engine
            .detect_words(&input)
            .map_err(|err| GlintError::OcrError(format!("word detection failed: {err}")))?;
        let line_rects = self.engine.find_text_lines(&input, &words);
        debug!(words = words.len(), lines = line_rects.len(), "Text lines found");

        let recognized = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|err| GlintError::OcrError(format!("line recognition failed: {err}")))?;

        let lines: Vec<String> = recognized
            .iter()
            .flatten()
            .map(|line| line.to_string())
            .filter(|text| !text.trim().is_empty())
            .collect();
        info!(lines = lines.len(), "OCR complete");
        Ok(lines)
    }
}

impl TextRecognizer for OcrEngine {
    fn name(&self) -> &str {
        "ocrs"
    }

    fn recognize_lines(&self, image: &DynamicImage) -> Result<Vec<String>> {
        OcrEngine::recognize_lines(self, image)
    }
}

fn load_model(path: &Path, kind: &str) -> Result<Model> {
    Model::load_file(path).map_err(|err| {
        GlintError::OcrError(format!(
            "failed to load {kind} model from {}: {err}",
            path.display()
        ))
    })
}

/// Whether both models are present in the default cache directory.
pub fn models_available() -> bool {
    let config = OcrConfig::default();
    config.detection_model_path.exists() && config.recognition_model_path.exists()
}

/// Default model directory, for diagnostics.
pub fn model_directory() -> PathBuf {
    default_model_dir()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_well_known_filenames() {
        let config = OcrConfig::default();
        assert!(config.detection_model_path.ends_with(DETECTION_MODEL_FILENAME));
        assert!(config.recognition_model_path.ends_with(RECOGNITION_MODEL_FILENAME));
        assert_eq!(config.detection_model_path.parent(), Some(model_directory().as_path()));
    }

    #[test]
    fn config_from_dir() {
        let config = OcrConfig::from_dir("/tmp/my-models");
        assert_eq!(
            config.detection_model_path,
            PathBuf::from("/tmp/my-models/text-detection.rten")
        );
        assert_eq!(
            config.recognition_model_path,
            PathBuf::from("/tmp/my-models/text-recognition.rten")
        );
    }

    #[test]
    fn config_from_paths() {
        let config = OcrConfig::from_paths("/a/detect.rten", "/b/recog.rten");
        assert_eq!(config.detection_model_path, PathBuf::from("/a/detect.rten"));
        assert_eq!(config.recognition_model_path, PathBuf::from("/b/recog.rten"));
    }

    #[test]
    fn missing_models_fail_validation() {
        let config = OcrConfig::from_dir("/nonexistent/path/ocr-models");
        assert!(matches!(config.validate(), Err(GlintError::OcrError(_))));
        assert!(OcrEngine::new(config).is_err());
    }
}

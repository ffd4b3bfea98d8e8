// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Trait definitions for the collaborators of the vision core.

use std::path::PathBuf;

use glint_core::Result;
use image::{DynamicImage, RgbImage};

/// One frame handed to the pipeline.
#[derive(Debug, Clone)]
pub struct SourceFrame {
    /// Where the frame came from (file name, capture index, ...).
    pub label: String,
    pub image: DynamicImage,
}

/// Supplies frames one at a time.
pub trait FrameSource {
    /// Next frame, or `Ok(None)` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<SourceFrame>>;
}

/// Reads text off a rectified screen.
pub trait TextRecognizer: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Recognised non-empty lines in reading order.
    fn recognize_lines(&self, image: &DynamicImage) -> Result<Vec<String>>;
}

/// Persists pipeline artifacts.
pub trait ScreenSink: Send + Sync {
    /// Store a rectified screen image and return where it went.
    fn save_screen(&self, screen: &RgbImage) -> Result<PathBuf>;

    /// Store recognised text lines and return where they went.
    fn save_text(&self, lines: &[String]) -> Result<PathBuf>;
}

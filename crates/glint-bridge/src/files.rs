// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// File-backed frame source and output sink.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use glint_core::{GlintError, Result};
use image::RgbImage;
use tracing::{debug, info, instrument, warn};

use crate::traits::{FrameSource, ScreenSink, SourceFrame};

/// Extensions picked up when a directory is given as input.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tif", "tiff", "webp"];

/// Default name of the latest rectified screen.
pub const SCREEN_FILENAME: &str = "detected_screen.jpg";
/// Default name of the latest recognised text.
pub const TEXT_FILENAME: &str = "output.txt";

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

/// Frames decoded from image files.
///
/// Inputs may be files or directories. A directory contributes its image
/// files (by extension, not recursive) in sorted order; explicit files keep
/// the order they were given in.
#[derive(Debug)]
pub struct ImageFileSource {
    pending: VecDeque<PathBuf>,
}

impl ImageFileSource {
    /// Expand `inputs` into the list of frames to read.
    ///
    /// Fails if an input does not exist or a directory cannot be listed.
    #[instrument(skip_all, fields(inputs = inputs.len()))]
    pub fn new<P: AsRef<Path>>(inputs: &[P]) -> Result<Self> {
        let mut pending = VecDeque::new();

        for input in inputs {
            let input = input.as_ref();
            if input.is_dir() {
                let mut images: Vec<PathBuf> = std::fs::read_dir(input)?
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|path| path.is_file() && is_image(path))
                    .collect();
                images.sort();
                debug!(dir = %input.display(), count = images.len(), "Directory expanded");
                pending.extend(images);
            } else if input.is_file() {
                pending.push_back(input.to_path_buf());
            } else {
                return Err(GlintError::FrameSource(format!(
                    "input not found: {}",
                    input.display()
                )));
            }
        }

        if pending.is_empty() {
            warn!("No image files found in the given inputs");
        }
        info!(frames = pending.len(), "Image file source ready");
        Ok(Self { pending })
    }

    /// Frames not yet read.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl FrameSource for ImageFileSource {
    fn next_frame(&mut self) -> Result<Option<SourceFrame>> {
        let Some(path) = self.pending.pop_front() else {
            return Ok(None);
        };

        let image = image::open(&path).map_err(|err| {
            GlintError::ImageError(format!("failed to decode {}: {err}", path.display()))
        })?;
        debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "Frame loaded"
        );

        Ok(Some(SourceFrame {
            label: path.display().to_string(),
            image,
        }))
    }
}

/// Writes rectified screens and recognised text into a directory.
///
/// By default every call overwrites `detected_screen.jpg` and `output.txt`.
/// With `keep_history`, each artifact gets a timestamped name instead.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    keep_history: bool,
    sequence: AtomicU64,
}

impl DirectorySink {
    /// Create the sink, creating `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            keep_history: false,
            sequence: AtomicU64::new(0),
        })
    }

    pub fn with_history(mut self, keep_history: bool) -> Self {
        self.keep_history = keep_history;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn artifact_path(&self, fixed_name: &str, prefix: &str, extension: &str) -> PathBuf {
        if !self.keep_history {
            return self.dir.join(fixed_name);
        }
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S_%3f");
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!("{prefix}_{stamp}_{seq:04}.{extension}"))
    }
}

impl ScreenSink for DirectorySink {
    fn save_screen(&self, screen: &RgbImage) -> Result<PathBuf> {
        let path = self.artifact_path(SCREEN_FILENAME, "screen", "jpg");
        screen.save(&path).map_err(|err| {
            GlintError::ImageError(format!("failed to write {}: {err}", path.display()))
        })?;
        debug!(path = %path.display(), "Screen saved");
        Ok(path)
    }

    fn save_text(&self, lines: &[String]) -> Result<PathBuf> {
        let path = self.artifact_path(TEXT_FILENAME, "output", "txt");
        let mut text = lines.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        std::fs::write(&path, text)?;
        debug!(path = %path.display(), lines = lines.len(), "Text saved");
        Ok(path)
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory stand-ins for builds without OCR models or a camera.

use std::collections::VecDeque;

use glint_core::Result;
use image::DynamicImage;

use crate::traits::{FrameSource, SourceFrame, TextRecognizer};

/// Recognizer used when OCR is disabled: never reads any text.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRecognizer;

impl TextRecognizer for NullRecognizer {
    fn name(&self) -> &str {
        "none"
    }

    fn recognize_lines(&self, _image: &DynamicImage) -> Result<Vec<String>> {
        tracing::debug!("Text recognition disabled; returning no lines");
        Ok(Vec::new())
    }
}

/// Frames held in memory, labelled by index.
#[derive(Debug, Default)]
pub struct MemorySource {
    frames: VecDeque<DynamicImage>,
    next_index: usize,
}

impl MemorySource {
    pub fn new(frames: impl IntoIterator<Item = DynamicImage>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            next_index: 0,
        }
    }
}

impl FrameSource for MemorySource {
    fn next_frame(&mut self) -> Result<Option<SourceFrame>> {
        let Some(image) = self.frames.pop_front() else {
            return Ok(None);
        };
        let label = format!("frame-{}", self.next_index);
        self.next_index += 1;
        Ok(Some(SourceFrame { label, image }))
    }
}

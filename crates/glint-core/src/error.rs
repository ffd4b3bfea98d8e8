// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Glint.
//
// The vision core never returns these: degenerate frames and missing screens
// are reported through `Option` and degenerate results. Errors exist for the
// layers around it (configuration, file I/O, OCR, frame sources).

use thiserror::Error;

/// Top-level error type for all Glint operations.
#[derive(Debug, Error)]
pub enum GlintError {
    // -- Configuration --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Images --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("frame source failed: {0}")]
    FrameSource(String),

    // -- Collaborators --
    #[error("OCR failed: {0}")]
    OcrError(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, GlintError>;

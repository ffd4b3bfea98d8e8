// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// glint-bridge — Collaborator abstractions around the vision core.
//
// Frames come in through a `FrameSource`, rectified screens go out through a
// `ScreenSink`, and text is read by a `TextRecognizer`. File-backed
// implementations live in `files`; in-memory stand-ins in `stub`.

pub mod files;
pub mod stub;
pub mod traits;

pub use files::{DirectorySink, ImageFileSource};
pub use stub::{MemorySource, NullRecognizer};
pub use traits::{FrameSource, ScreenSink, SourceFrame, TextRecognizer};

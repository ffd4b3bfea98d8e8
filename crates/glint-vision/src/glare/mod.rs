// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Glare scoring — combines photometric cues into a glare score map, binary
// mask, coverage decision, and hotspot location.

pub mod scorer;

pub use scorer::{GlareResult, GlareScorer, GlareSummary};

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Screen module — contour-based phone screen localization and perspective
// rectification of the detected quadrilateral.

pub mod locate;
pub mod rectify;

pub use locate::{ScreenCandidate, ScreenLocator};
pub use rectify::{PerspectiveRectifier, RectifiedScreen, order_corners};

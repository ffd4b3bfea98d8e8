// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Direction advice — maps the glare hotspot to a repositioning instruction.

use glint_core::MoveInstruction;
use glint_core::config::AdvisorConfig;
use tracing::debug;

/// Turns a glare peak into a [`MoveInstruction`].
///
/// A dead zone of `±fraction·w` by `±fraction·h` around the frame centre
/// yields [`MoveInstruction::Hold`]. Horizontal offsets are reported before
/// vertical ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionAdvisor {
    dead_zone_fraction: f32,
}

impl Default for DirectionAdvisor {
    fn default() -> Self {
        Self::from_config(&AdvisorConfig::default())
    }
}

impl DirectionAdvisor {
    pub fn new(dead_zone_fraction: f32) -> Self {
        Self { dead_zone_fraction }
    }

    pub fn from_config(config: &AdvisorConfig) -> Self {
        Self::new(config.dead_zone_fraction)
    }

    pub fn dead_zone_fraction(&self) -> f32 {
        self.dead_zone_fraction
    }

    /// Advise for a peak in a frame of `(width, height)`.
    pub fn advise(&self, peak: Option<(u32, u32)>, (width, height): (u32, u32)) -> MoveInstruction {
        let Some((x, y)) = peak else {
            return MoveInstruction::NoGlare;
        };
        if width == 0 || height == 0 {
            return MoveInstruction::NoGlare;
        }

        let (cx, cy) = ((width / 2) as f32, (height / 2) as f32);
        let zx = self.dead_zone_fraction * width as f32;
        let zy = self.dead_zone_fraction * height as f32;
        let (x, y) = (x as f32, y as f32);

        let instruction = if x < cx - zx {
            MoveInstruction::Left
        } else if x > cx + zx {
            MoveInstruction::Right
        } else if y < cy - zy {
            MoveInstruction::TiltUp
        } else if y > cy + zy {
            MoveInstruction::TiltDown
        } else {
            MoveInstruction::Hold
        };
        debug!(x, y, cx, cy, ?instruction, "Direction advised");
        instruction
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for glint-vision: glare scoring, screen localization,
// and the full per-frame pipeline on a synthetic 640x480 frame.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgb, RgbImage};

use glint_core::GlintConfig;
use glint_core::config::{GlareConfig, ScreenConfig};
use glint_vision::{GlareGuide, GlareScorer, ScreenLocator};

/// Light background, dark upright phone, small white reflection on its screen.
fn synthetic_frame() -> DynamicImage {
    let frame = RgbImage::from_fn(640, 480, |x, y| {
        let (dx, dy) = (x as i64 - 330, y as i64 - 180);
        if dx * dx + dy * dy <= 20 * 20 {
            Rgb([255, 255, 255])
        } else if (250..400).contains(&x) && (100..370).contains(&y) {
            Rgb([25, 25, 30])
        } else {
            Rgb([190, 185, 180])
        }
    });
    DynamicImage::ImageRgb8(frame)
}

fn bench_glare_scoring(c: &mut Criterion) {
    let frame = synthetic_frame();
    let scorer = GlareScorer::new(GlareConfig::default());

    c.bench_function("glare_score (640x480)", |b| {
        b.iter(|| black_box(scorer.score(black_box(&frame))));
    });
}

fn bench_screen_locate(c: &mut Criterion) {
    let frame = synthetic_frame();
    let locator = ScreenLocator::new(ScreenConfig::default());

    c.bench_function("screen_locate (640x480)", |b| {
        b.iter(|| black_box(locator.locate(black_box(&frame))));
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let frame = synthetic_frame();
    let Ok(guide) = GlareGuide::new(GlintConfig::default()) else {
        return;
    };

    c.bench_function("glare_guide_process (640x480)", |b| {
        b.iter(|| black_box(guide.process(black_box(&frame))));
    });
}

criterion_group!(benches, bench_glare_scoring, bench_screen_locate, bench_pipeline);
criterion_main!(benches);

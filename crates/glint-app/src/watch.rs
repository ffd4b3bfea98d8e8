// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `glint watch` — the live guidance loop.
//
// One frame per tick. Each frame is processed on the blocking pool; when a
// screen is found its rectified image and recognised text are written to the
// output directory. Stops when the source is exhausted or on Ctrl-C; a
// Ctrl-C that lands while a frame is still processing stops the loop without
// waiting for that frame.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use glint_bridge::{
    DirectorySink, FrameSource, ImageFileSource, ScreenSink, SourceFrame, TextRecognizer,
};
use glint_core::{GlintError, Result};
use glint_vision::{GlareGuide, ReportSummary};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::WatchArgs;
use crate::services;

/// What one processed frame produced.
#[derive(Debug)]
pub struct FrameOutcome {
    pub label: String,
    pub summary: ReportSummary,
    pub lines: Vec<String>,
}

/// Counters reported when the loop ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WatchStats {
    pub frames: usize,
    pub screens_found: usize,
    pub failures: usize,
}

pub async fn run(args: WatchArgs) -> Result<()> {
    let config = services::load_config(args.config.as_deref())?;
    let guide = Arc::new(GlareGuide::new(config)?);
    let mut source = ImageFileSource::new(&args.input)?;
    let sink: Arc<dyn ScreenSink> =
        Arc::new(DirectorySink::new(&args.out)?.with_history(args.keep_history));
    let recognizer = services::build_recognizer(args.ocr_models.as_deref())?;

    info!(
        interval_ms = args.interval_ms,
        out = %args.out.display(),
        recognizer = recognizer.name(),
        "Watching for frames"
    );
    let stats = watch_loop(
        &mut source,
        guide,
        sink,
        recognizer,
        Duration::from_millis(args.interval_ms.max(1)),
        ctrl_c(),
        |outcome| {
            println!("{}", services::format_summary(&outcome.label, &outcome.summary));
            for line in &outcome.lines {
                println!("  text:        {line}");
            }
        },
    )
    .await?;

    info!(
        frames = stats.frames,
        screens_found = stats.screens_found,
        failures = stats.failures,
        "Watch finished"
    );
    Ok(())
}

/// Resolves on the first Ctrl-C. Never resolves if the handler cannot be
/// installed.
async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Ctrl-C handler unavailable");
        std::future::pending::<()>().await;
    }
}

/// Drive `source` on a fixed cadence until it is exhausted or `shutdown`
/// resolves.
///
/// `shutdown` is polled across ticks and while a frame is processing; a frame
/// interrupted mid-flight is counted but never reported. A frame that fails to
/// decode or process is logged and skipped.
pub async fn watch_loop(
    source: &mut dyn FrameSource,
    guide: Arc<GlareGuide>,
    sink: Arc<dyn ScreenSink>,
    recognizer: Arc<dyn TextRecognizer>,
    interval: Duration,
    shutdown: impl Future<Output = ()>,
    mut on_outcome: impl FnMut(&FrameOutcome),
) -> Result<WatchStats> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut stats = WatchStats::default();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Interrupted; stopping");
                break;
            }

            _ = ticker.tick() => {
                let frame = match source.next_frame() {
                    Ok(Some(frame)) => frame,
                    Ok(None) => {
                        debug!("Frame source exhausted");
                        break;
                    }
                    Err(err) => {
                        warn!(error = %err, "Skipping unreadable frame");
                        stats.failures += 1;
                        continue;
                    }
                };
                stats.frames += 1;

                let guide = Arc::clone(&guide);
                let sink = Arc::clone(&sink);
                let recognizer = Arc::clone(&recognizer);
                let task = tokio::task::spawn_blocking(move || {
                    process_frame(&guide, frame, sink.as_ref(), recognizer.as_ref())
                });
                let outcome = tokio::select! {
                    _ = &mut shutdown => {
                        info!("Interrupted while processing a frame; stopping");
                        break;
                    }
                    joined = task => joined.map_err(|err| {
                        GlintError::FrameSource(format!("frame task failed: {err}"))
                    })?,
                };

                match outcome {
                    Ok(outcome) => {
                        if outcome.summary.screen_found {
                            stats.screens_found += 1;
                        }
                        on_outcome(&outcome);
                    }
                    Err(err) => {
                        warn!(error = %err, "Frame processing failed");
                        stats.failures += 1;
                    }
                }
            }
        }
    }

    Ok(stats)
}

/// Run the pipeline on one frame and persist its artifacts.
///
/// Text recognition and saving only happen when a screen was found.
pub fn process_frame(
    guide: &GlareGuide,
    frame: SourceFrame,
    sink: &dyn ScreenSink,
    recognizer: &dyn TextRecognizer,
) -> Result<FrameOutcome> {
    let report = guide.process(&frame.image);
    let lines = services::read_screen(recognizer, &report)?;
    services::save_artifacts(sink, &report, &lines)?;

    Ok(FrameOutcome {
        label: frame.label,
        summary: report.summary(),
        lines,
    })
}

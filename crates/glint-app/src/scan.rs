// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `glint scan` — analyse one image.

use glint_bridge::DirectorySink;
use glint_core::{GlintError, Result};
use glint_vision::GlareGuide;
use tracing::{info, instrument};

use crate::ScanArgs;
use crate::services;

#[instrument(skip_all, fields(image = %args.image.display()))]
pub fn run(args: &ScanArgs) -> Result<()> {
    let config = services::load_config(args.config.as_deref())?;
    let guide = GlareGuide::new(config)?;

    let frame = image::open(&args.image).map_err(|err| {
        GlintError::ImageError(format!("failed to decode {}: {err}", args.image.display()))
    })?;
    let recognizer = services::build_recognizer(args.ocr_models.as_deref())?;

    let report = guide.process(&frame);
    let lines = services::read_screen(recognizer.as_ref(), &report)?;

    if let Some(out) = &args.out {
        services::save_artifacts(&DirectorySink::new(out)?, &report, &lines)?;
        info!(out = %out.display(), "Scan artifacts written");
    }

    let summary = report.summary();
    if args.json {
        let mut json = serde_json::to_value(&summary)?;
        json["lines"] = serde_json::json!(lines);
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!(
            "{}",
            services::format_summary(&args.image.display().to_string(), &summary)
        );
        for line in &lines {
            println!("  text:        {line}");
        }
    }
    Ok(())
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Glint — command-line entry point.
//
// `scan` analyses one image, `watch` runs the live guidance loop over a
// stream of frames, `config` prints the effective configuration.

mod scan;
mod services;
mod watch;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "glint")]
#[command(about = "Find a phone screen in camera frames, measure glare on it, and say how to move")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a single image.
    Scan(ScanArgs),

    /// Process frames on a fixed cadence until the input runs out or Ctrl-C.
    Watch(WatchArgs),

    /// Print the effective configuration as JSON.
    Config {
        /// Configuration file to validate and print (defaults when omitted).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ScanArgs {
    /// Path to the input image.
    #[arg(long)]
    pub image: PathBuf,

    /// JSON configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory to write the rectified screen into.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    pub json: bool,

    /// Directory holding the OCR models (needs the `ocr` feature).
    #[arg(long)]
    pub ocr_models: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct WatchArgs {
    /// Image files or directories of images, processed in order.
    #[arg(long, required = true, num_args = 1..)]
    pub input: Vec<PathBuf>,

    /// Milliseconds between frames.
    #[arg(long, default_value = "1000")]
    pub interval_ms: u64,

    /// JSON configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for the rectified screen and recognised text.
    #[arg(long, default_value = "saved_images")]
    pub out: PathBuf,

    /// Keep every frame's artifacts under timestamped names.
    #[arg(long)]
    pub keep_history: bool,

    /// Directory holding the OCR models (needs the `ocr` feature).
    #[arg(long)]
    pub ocr_models: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Scan(args) => scan::run(&args),
        Commands::Watch(args) => watch::run(args).await,
        Commands::Config { config } => services::load_config(config.as_deref())
            .and_then(|config| config.to_json_pretty())
            .map(|json| println!("{json}")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "glint failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

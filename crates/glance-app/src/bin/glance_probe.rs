//! One-shot capture against the primary monitor - run with:
//! cargo run -p glance-app --bin glance-probe -- --x 100 --y 100 --width 200 --height 80

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use glance_capture::{CaptureLoop, MonitorFrameSource, SharedRegion};
use glance_config::Config;
use glance_core::{DiagnosticSink, FsDiagnosticSink, NullDiagnosticSink};
use glance_types::CaptureRegion;
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Parser)]
#[command(name = "glance-probe", about = "Capture one region and dump what the recognizer would see")]
struct Args {
    #[arg(long)]
    x: i32,
    #[arg(long)]
    y: i32,
    #[arg(long)]
    width: u32,
    #[arg(long)]
    height: u32,

    /// Binarization threshold, defaults to the configured one
    #[arg(long)]
    threshold: Option<u8>,

    /// JSON profile; defaults plus environment overrides when absent
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Directory the crop and its binarization are written to
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// Print a JSON report and log as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct Report {
    region: CaptureRegion,
    threshold: u8,
    crop_width: u32,
    crop_height: u32,
    elapsed_ms: u128,
    crop: PathBuf,
    binarized: PathBuf,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if args.json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::new(),
    };
    if let Some(timeout_ms) = args.timeout_ms {
        config.capture.timeout_ms = timeout_ms;
    }
    let threshold = args.threshold.unwrap_or(config.capture.default_threshold);

    let diagnostics: Arc<dyn DiagnosticSink> = if config.diagnostics.enabled {
        Arc::new(FsDiagnosticSink::new(&config.diagnostics.dir))
    } else {
        Arc::new(NullDiagnosticSink)
    };

    let region = CaptureRegion::new(args.x, args.y, args.width, args.height);
    let capture = CaptureLoop::new(
        Arc::new(MonitorFrameSource::new()),
        Arc::new(SharedRegion::new(region)),
        diagnostics,
        &config.capture,
    );

    tracing::info!(
        "Waiting up to {:?} for the marker border around {}",
        capture.timeout(),
        region
    );
    let start = Instant::now();
    let mut shot = capture.acquire(threshold).context("Capture failed")?;
    let elapsed = start.elapsed();

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("Failed to create {}", args.out.display()))?;
    let crop_path = args.out.join(format!("probe_{region}_crop.png"));
    let binarized_path = args.out.join(format!("probe_{region}_t{threshold}.png"));

    shot.crop()
        .save(&crop_path)
        .with_context(|| format!("Failed to write {}", crop_path.display()))?;
    shot.cached()
        .save(&binarized_path)
        .with_context(|| format!("Failed to write {}", binarized_path.display()))?;

    let report = Report {
        region,
        threshold: shot.threshold(),
        crop_width: shot.crop().width(),
        crop_height: shot.crop().height(),
        elapsed_ms: elapsed.as_millis(),
        crop: crop_path,
        binarized: binarized_path,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        tracing::info!(
            "Captured {}x{} in {:?}, wrote {} and {}",
            report.crop_width,
            report.crop_height,
            elapsed,
            report.crop.display(),
            report.binarized.display()
        );
    }

    Ok(())
}

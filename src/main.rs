//! mlswarp - Warp an image with moving least squares control points
//!
//! Reads control point pairs from a TOML configuration, deforms the input
//! image so the content at each `from` point lands on its `to` point, and
//! writes the result.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use mlswarp::config::Config;
use mlswarp::warp_image;

/// mlswarp - point based image deformation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input image
    #[arg(short, long)]
    input: PathBuf,

    /// Output image
    #[arg(short, long)]
    output: PathBuf,

    /// Configuration file path
    #[arg(short, long, default_value = "warp.toml")]
    config: PathBuf,

    /// Write the deformed grid as JSON
    #[arg(long)]
    grid_json: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("mlswarp v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load_or_create(&args.config)?;

    let src = image::open(&args.input)
        .with_context(|| format!("Failed to open image {:?}", args.input))?
        .to_rgba8();
    let (width, height) = src.dimensions();
    info!("Input: {:?} ({}x{})", args.input, width, height);

    if config.controls.is_empty() {
        warn!("No control points configured, writing input unchanged");
        src.save(&args.output)
            .with_context(|| format!("Failed to write image {:?}", args.output))?;
        return Ok(());
    }

    info!(
        "Grid: {}x{}, alpha {}, {} control points",
        config.grid.rows,
        config.grid.cols,
        config.grid.alpha,
        config.controls.len()
    );

    let start = Instant::now();
    let mls = config
        .build_deformer(width, height)
        .context("Failed to build deformation")?;
    info!("Deformation solved in {:?}", start.elapsed());

    if let Some(path) = &args.grid_json {
        let grid = mls.deformed_grid()?;
        let content = serde_json::to_string_pretty(&grid).context("Failed to serialize grid")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write grid to {:?}", path))?;
        info!("Wrote deformed grid to {:?}", path);
    }

    let start = Instant::now();
    let dst = warp_image(&mls, &src);
    info!("Warped image in {:?}", start.elapsed());

    dst.save(&args.output)
        .with_context(|| format!("Failed to write image {:?}", args.output))?;
    info!("Wrote {:?}", args.output);

    Ok(())
}

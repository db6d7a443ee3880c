//! # Tide Almanac Application Entry Point
//!
//! This binary prefetches predictions for every configured station, composes one
//! page per day, and writes the almanac as a PDF. It also supports a development
//! mode (`--stdout`) that prints each page as text, and optional PBM previews.

// Test modules
#[cfg(test)]
mod tests;

use anyhow::{bail, Context};
use chrono::{Duration, Local, NaiveDate};
use clap::Parser;
use std::path::PathBuf;
use tide_almanac_lib::{
    canvas::render,
    config::Config,
    logging,
    noaa::{fetch_almanac_data, NoaaClient},
    page::{Almanac, LocalEphemeris},
    pdf::PdfCanvas,
    raster::RasterCanvas,
    renderer::draw_ascii,
};
use tracing::info;

/// Preview resolution in pixels per point.
const PREVIEW_SCALE: f64 = 1.0;

/// Days covered when only a start date is known.
const DEFAULT_SPAN_DAYS: i64 = 6;

/// Printable tide, current, sun and moon almanac.
#[derive(Parser, Debug)]
#[command(name = "tide-almanac", version, about = "Printable daily tide and current almanac")]
struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file; errors in an explicit file are fatal.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// First day (YYYY-MM-DD), defaults to today.
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day (YYYY-MM-DD), defaults to six days after the start.
    #[arg(long)]
    end: Option<NaiveDate>,

    /// PDF output path.
    #[arg(short, long, default_value = "almanac.pdf")]
    output: PathBuf,

    /// Also write one PBM preview per page into this directory.
    #[arg(long)]
    preview_dir: Option<PathBuf>,

    /// Print pages as text instead of writing files.
    #[arg(long)]
    stdout: bool,

    /// Write the default configuration to this path and exit.
    #[arg(long, value_name = "PATH")]
    init_config: Option<PathBuf>,
}

/// Resolve the inclusive date range from the optional CLI dates.
fn resolve_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> anyhow::Result<(NaiveDate, NaiveDate)> {
    let start = start.unwrap_or(today);
    let end = end.unwrap_or(start + Duration::days(DEFAULT_SPAN_DAYS));
    if start > end {
        bail!("start date {start} is after end date {end}");
    }
    Ok((start, end))
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            Config::try_load(path).with_context(|| format!("loading config {}", path.display()))
        }
        None => Ok(Config::load()),
    }
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Some(path) = &cli.init_config {
        Config::default()
            .save(path)
            .with_context(|| format!("writing config {}", path.display()))?;
        return Ok(());
    }

    let config = load_config(cli.config.as_ref())?;
    let (start, end) = resolve_range(cli.start, cli.end, Local::now().date_naive())?;
    info!(%start, %end, location = %config.location.name, "building almanac");

    // Everything is fetched up front; composition below is synchronous
    let client = NoaaClient::from_config(&config).context("building HTTP client")?;
    let rt = tokio::runtime::Runtime::new()?;
    let data = rt.block_on(fetch_almanac_data(&client, &config, start, end));

    let almanac = Almanac::new(&config, &data, LocalEphemeris::from_config(&config));
    let pages = almanac.compose(start, end);

    // Development mode: text output for checking layout
    if cli.stdout {
        draw_ascii(&pages);
        return Ok(());
    }

    let size = almanac.frame().size;
    let mut pdf = PdfCanvas::new(size);
    render(&pages, &mut pdf);
    pdf.write_to(&cli.output)
        .with_context(|| format!("writing {}", cli.output.display()))?;

    if let Some(dir) = &cli.preview_dir {
        let mut raster = RasterCanvas::new(size, PREVIEW_SCALE);
        render(&pages, &mut raster);
        raster
            .write_previews(dir, &pages)
            .with_context(|| format!("writing previews to {}", dir.display()))?;
    }

    Ok(())
}

//! RWEQ CLI - monthly wind erosion rasters from a scene catalog

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use rweq_algorithms::pipeline::{run, RweqInputs};
use rweq_algorithms::RweqConfig;
use rweq_core::calendar::month_windows;
use rweq_core::io::{export_series, read_frame, Catalog};
use rweq_core::RasterSeries;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "rweq")]
#[command(
    author,
    version,
    about = "Monthly Revised Wind Erosion Equation rasters",
    long_about = None
)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline and export the slrc, wf and soil loss batches
    Run {
        /// Scene catalog (JSON)
        #[arg(short, long)]
        catalog: PathBuf,
        /// Run configuration (JSON); defaults are used when omitted
        #[arg(short = 'f', long)]
        config: Option<PathBuf>,
        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
        /// Override the first month (YYYY-MM-DD, first of month)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Override the exclusive end (YYYY-MM-DD, first of month)
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// List the monthly windows of a date range
    Months {
        /// Inclusive start (YYYY-MM-DD, first of month)
        #[arg(long)]
        start: NaiveDate,
        /// Exclusive end (YYYY-MM-DD, first of month)
        #[arg(long)]
        end: NaiveDate,
    },
    /// Show information about a GeoTIFF, band by band
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Print the default configuration as JSON
    Config,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set the default subscriber")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn load_config(
    path: Option<&Path>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<RweqConfig> {
    let mut config = match path {
        Some(path) => RweqConfig::from_json_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => RweqConfig::default(),
    };
    if let Some(start) = start {
        config.start_date = start;
    }
    if let Some(end) = end {
        config.end_date = end;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Export one batch; failures are reported and counted, not propagated
fn export_batch(name: &str, series: &RasterSeries, dir: &Path, pattern: &str) -> bool {
    let pb = spinner(&format!("Exporting {}...", name));
    let result = export_series(series, dir, pattern);
    pb.finish_and_clear();

    match result {
        Ok(paths) => {
            println!("{}: {} files", name, paths.len());
            true
        }
        Err(e) => {
            error!("Export of {} failed: {}", name, e);
            false
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        // ── Run ──────────────────────────────────────────────────────
        Commands::Run {
            catalog,
            config,
            output,
            start,
            end,
        } => {
            let config = load_config(config.as_deref(), start, end)?;
            let catalog = Catalog::from_json_file(&catalog)
                .with_context(|| format!("Failed to read catalog {}", catalog.display()))?;

            let pb = spinner("Reading scenes...");
            let inputs = RweqInputs::load(&catalog).context("Failed to load inputs")?;
            pb.finish_and_clear();

            let start_time = Instant::now();
            let outputs = run(&inputs, &config).context("Pipeline failed")?;
            info!("Pipeline finished in {:.2?}", start_time.elapsed());

            let e = &config.export;
            let batches = [
                ("slrc", &outputs.slrc, e.slrc_pattern.as_str()),
                ("wf", &outputs.wf, e.wf_pattern.as_str()),
                ("soil loss", &outputs.soil_loss, e.soil_loss_pattern.as_str()),
            ];
            let failed = batches
                .iter()
                .filter(|(name, series, pattern)| !export_batch(name, series, &output, pattern))
                .count();

            if failed > 0 {
                bail!("{} of {} export batches failed", failed, batches.len());
            }
            println!("Outputs saved to: {}", output.display());
            println!("  Processing time: {:.2?}", start_time.elapsed());
        }

        // ── Months ───────────────────────────────────────────────────
        Commands::Months { start, end } => {
            let windows = month_windows(start, end).context("Invalid date range")?;
            for window in &windows {
                println!(
                    "{}  {} .. {}  nDays = {}",
                    window.key,
                    window.start,
                    window.end,
                    window.n_days()
                );
            }
            println!("{} months", windows.len());
        }

        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let pb = spinner("Reading raster...");
            let frame = read_frame(&input).context("Failed to read raster")?;
            pb.finish_and_clear();

            println!("File: {}", input.display());
            let Some(first) = frame.bands().first() else {
                println!("No bands");
                return Ok(());
            };
            let raster = &first.raster;
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", raster.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(crs) = raster.crs() {
                println!("CRS: {}", crs);
            }

            for band in frame.bands() {
                let stats = band.raster.statistics();
                println!("\nBand '{}':", band.name);
                if let Some(min) = stats.min {
                    println!("  Min: {:.4}", min);
                }
                if let Some(max) = stats.max {
                    println!("  Max: {:.4}", max);
                }
                if let Some(mean) = stats.mean {
                    println!("  Mean: {:.4}", mean);
                }
                println!(
                    "  Valid cells: {} ({:.1}%)",
                    stats.valid_count,
                    100.0 * stats.valid_count as f64 / band.raster.len().max(1) as f64
                );
            }
        }

        // ── Config ───────────────────────────────────────────────────
        Commands::Config => {
            let json = RweqConfig::default()
                .to_json_pretty()
                .context("Failed to serialize config")?;
            println!("{}", json);
        }
    }

    Ok(())
}

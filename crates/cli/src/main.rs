//! TerraClump CLI - Raster segmentation cleanup

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use terraclump_algorithms::segmentation::{
    clump, eliminate_small_clumps, relabel_sequential, BandRescale, ClumpParams, DistanceMetric,
    EliminateParams, MeanMode, Schedule,
};
use terraclump_core::io::{
    read_band_stack, read_geotiff, read_stretch_stats, write_label_geotiff,
};
use terraclump_core::raster::Neighborhood;
use terraclump_core::{BandStack, Raster};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "terraclump")]
#[command(author, version, about = "Raster segmentation cleanup", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Label connected regions of equal value
    Clump {
        /// Input categorical raster
        input: PathBuf,
        /// Output label raster
        output: PathBuf,
        /// Use 8-connectivity instead of 4
        #[arg(long)]
        eight: bool,
    },
    /// Merge small clumps into their spectrally nearest larger neighbor
    Eliminate {
        /// Input label raster (0 = background)
        labels: PathBuf,
        /// Output label raster
        output: PathBuf,
        /// Spectral bands: one multi-band file or one file per band
        #[arg(short, long, num_args = 1.., required = true)]
        bands: Vec<PathBuf>,
        /// Clumps of at most this many pixels are eliminated
        #[arg(short, long, default_value = "10")]
        min_size: usize,
        /// Maximum spectral distance for a merge (default: unlimited)
        #[arg(short, long)]
        threshold: Option<f64>,
        /// Band stretch statistics (band,orig_min,orig_max,img_min,img_max per line)
        #[arg(long)]
        stretch_stats: Option<PathBuf>,
        /// Schedule: iterative, stepwise, single
        #[arg(long, default_value = "iterative")]
        schedule: String,
        /// Mean handling: tracked, on-demand
        #[arg(long, default_value = "tracked")]
        mean: String,
        /// Distance metric: euclidean, band-normalized
        #[arg(long, default_value = "euclidean")]
        metric: String,
        /// Stop repeating a size level after this many passes
        #[arg(long)]
        max_passes: Option<usize>,
        /// Compact surviving ids to 1..=n before writing
        #[arg(long)]
        relabel: bool,
        /// Write a JSON run report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Compact label ids to 1..=n
    Relabel {
        /// Input label raster
        input: PathBuf,
        /// Output label raster
        output: PathBuf,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install log subscriber")
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

fn read_labels(path: &Path) -> Result<Raster<u32>> {
    let pb = spinner("Reading labels...");
    let raster: Raster<u32> = read_geotiff(path, None)
        .with_context(|| format!("Failed to read label raster {}", path.display()))?;
    pb.finish_and_clear();
    info!("Labels: {} x {}", raster.cols(), raster.rows());
    Ok(raster)
}

fn read_bands(paths: &[PathBuf]) -> Result<BandStack> {
    let pb = spinner("Reading bands...");
    let stack = read_band_stack(paths).context("Failed to read spectral bands")?;
    pb.finish_and_clear();
    info!(
        "Bands: {} x {} x {}",
        stack.band_count(),
        stack.cols(),
        stack.rows()
    );
    Ok(stack)
}

fn write_labels(raster: &Raster<u32>, path: &Path) -> Result<()> {
    let pb = spinner("Writing output...");
    write_label_geotiff(raster, path).context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn parse_schedule(s: &str) -> Result<Schedule> {
    match s.to_lowercase().as_str() {
        "iterative" | "iter" => Ok(Schedule::Iterative),
        "stepwise" | "step" => Ok(Schedule::Stepwise),
        "single" | "single-pass" => Ok(Schedule::SinglePass),
        _ => anyhow::bail!("Unknown schedule: {}. Use iterative, stepwise, or single.", s),
    }
}

fn parse_mean_mode(s: &str) -> Result<MeanMode> {
    match s.to_lowercase().as_str() {
        "tracked" => Ok(MeanMode::Tracked),
        "on-demand" | "ondemand" => Ok(MeanMode::OnDemand),
        _ => anyhow::bail!("Unknown mean mode: {}. Use tracked or on-demand.", s),
    }
}

fn parse_metric(s: &str) -> Result<DistanceMetric> {
    match s.to_lowercase().as_str() {
        "euclidean" | "l2" => Ok(DistanceMetric::Euclidean),
        "band-normalized" | "normalized" => Ok(DistanceMetric::BandNormalized),
        _ => anyhow::bail!("Unknown metric: {}. Use euclidean or band-normalized.", s),
    }
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Info { input } => {
            let pb = spinner("Reading raster...");
            let raster: Raster<f64> = read_geotiff(&input, None).context("Failed to read raster")?;
            pb.finish_and_clear();
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();
            let stats = raster.statistics();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", raster.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }
            println!("\nStatistics:");
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
                100.0 * stats.valid_count as f64 / raster.len().max(1) as f64
            );
        }

        Commands::Clump {
            input,
            output,
            eight,
        } => {
            let classes = read_labels(&input)?;
            let neighborhood = if eight {
                Neighborhood::Queen
            } else {
                Neighborhood::Rook
            };
            let start = Instant::now();
            let labels =
                clump(&classes, ClumpParams { neighborhood }).context("Failed to clump raster")?;
            let elapsed = start.elapsed();
            info!(
                "Clumps: {}",
                labels.data().iter().copied().max().unwrap_or(0)
            );
            write_labels(&labels, &output)?;
            done("Clumps", &output, elapsed);
        }

        Commands::Eliminate {
            labels,
            output,
            bands,
            min_size,
            threshold,
            stretch_stats,
            schedule,
            mean,
            metric,
            max_passes,
            relabel,
            report,
        } => {
            let mut label_raster = read_labels(&labels)?;
            let stack = read_bands(&bands)?;

            let rescale = match stretch_stats {
                Some(path) => {
                    let stats = read_stretch_stats(&path).with_context(|| {
                        format!("Failed to read stretch statistics {}", path.display())
                    })?;
                    Some(
                        BandRescale::from_stretch_stats(&stats, stack.band_count())
                            .context("Stretch statistics do not match the band stack")?,
                    )
                }
                None => None,
            };

            let defaults = EliminateParams::default();
            let params = EliminateParams {
                min_clump_size: min_size,
                spec_threshold: threshold.unwrap_or(defaults.spec_threshold),
                schedule: parse_schedule(&schedule)?,
                mean_mode: parse_mean_mode(&mean)?,
                metric: parse_metric(&metric)?,
                rescale,
                max_passes_per_level: max_passes,
                ..defaults
            };

            let start = Instant::now();
            let run = eliminate_small_clumps(&mut label_raster, &stack, &params)
                .context("Failed to eliminate small clumps")?;
            if relabel {
                let n = relabel_sequential(&mut label_raster);
                info!("Relabelled to {} ids", n);
            }
            let elapsed = start.elapsed();

            write_labels(&label_raster, &output)?;
            if let Some(path) = report {
                let json = serde_json::to_string_pretty(&run).context("Failed to encode report")?;
                std::fs::write(&path, json)
                    .with_context(|| format!("Failed to write report {}", path.display()))?;
            }

            println!(
                "Clumps: {} -> {} ({} merges in {} passes, {} undersized left)",
                run.initial_clumps,
                run.final_clumps,
                run.merges,
                run.passes,
                run.remaining_undersized
            );
            done("Segmentation", &output, elapsed);
        }

        Commands::Relabel { input, output } => {
            let mut labels = read_labels(&input)?;
            let start = Instant::now();
            let n = relabel_sequential(&mut labels);
            let elapsed = start.elapsed();
            info!("Ids: {}", n);
            write_labels(&labels, &output)?;
            done("Relabelled", &output, elapsed);
        }
    }

    Ok(())
}

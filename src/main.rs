use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use image::ImageFormat;
use std::path::{Path, PathBuf};
use the_ark::artifact::save_image;
use the_ark::compare::{compare_image, image_difference};
use the_ark::utils::logger::init_logger;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "ark", about = "Visual comparison of website captures")]
struct Cli {
    /// Write logs to a timestamped file in this directory instead of stderr
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pixel comparison of two images, optionally writing the diff overlay
    Compare {
        baseline: PathBuf,
        candidate: PathBuf,

        /// Directory to write the overlay image into
        #[arg(long)]
        overlay_dir: Option<PathBuf>,

        /// Exit with an error when more than this percentage of pixels changed
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Histogram RMS difference of two images
    Difference { baseline: PathBuf, candidate: PathBuf },
}

fn open(path: &Path) -> Result<image::DynamicImage> {
    image::open(path).with_context(|| format!("Failed to open image: {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.log_dir.as_deref())?;

    match cli.command {
        Command::Compare { baseline, candidate, overlay_dir, threshold } => {
            let result = compare_image(&open(&baseline)?, &open(&candidate)?)?;
            println!("{:.4}% of pixels changed", result.percent_changed);

            if let Some(dir) = overlay_dir {
                let encoded = result.encode(ImageFormat::Png)?;
                let name = baseline
                    .file_stem()
                    .map(|s| format!("{}_compare", s.to_string_lossy()))
                    .unwrap_or_else(|| "compare".to_string());
                let path = save_image(&dir, &name, &encoded)?;
                println!("Overlay saved to: {}", path.display());
            }

            if let Some(threshold) = threshold {
                if result.percent_changed > threshold {
                    anyhow::bail!(
                        "{:.4}% of pixels changed, above the {:.4}% threshold",
                        result.percent_changed,
                        threshold
                    );
                }
            }
        }
        Command::Difference { baseline, candidate } => {
            let rms = image_difference(&open(&baseline)?, &open(&candidate)?);
            info!("Histogram difference computed");
            println!("{:.4}", rms);
        }
    }

    Ok(())
}

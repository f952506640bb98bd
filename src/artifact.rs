use anyhow::{Context, Result};
use image::ImageFormat;
use sanitize_filename::sanitize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

use crate::capture::{CaptureResult, EncodedImage};
use crate::utils::url_to_snake_case;

fn timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Writes one encoded image as `<base_name>_<timestamp>.<ext>` inside `dir`
pub fn save_image(dir: &Path, base_name: &str, image: &EncodedImage) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let file_path = dir.join(format!("{}_{}.{}", sanitize(base_name), timestamp(), image.extension()));
    debug!("Saving image to {}", file_path.display());
    fs::write(&file_path, &image.data)
        .with_context(|| format!("Failed to write image to {}", file_path.display()))?;

    info!("Image saved to {}", file_path.display());
    Ok(file_path)
}

/// Writes every image of a page capture, named after the page URL.
///
/// Sequences get a zero-padded index so the files sort in capture order.
pub fn save_capture(dir: &Path, page_url: &str, result: &CaptureResult, format: ImageFormat) -> Result<Vec<PathBuf>> {
    let stem = url_to_snake_case(page_url);
    let encoded = result.encode(format).context("Failed to encode captured images")?;

    match result {
        CaptureResult::Single(_) => encoded
            .iter()
            .map(|image| save_image(dir, &stem, image))
            .collect(),
        CaptureResult::Sequence(_) => encoded
            .iter()
            .enumerate()
            .map(|(i, image)| {
                trace!("Saving tile {} of {}", i + 1, encoded.len());
                save_image(dir, &format!("{}_{:03}", stem, i), image)
            })
            .collect(),
    }
}

//! Joins a top-of-page capture and a bottom-of-page capture into one image.
//!
//! The last rows of the header capture act as a fingerprint. The first place in
//! the footer capture where the whole fingerprint reappears is the seam; footer
//! rows up to and including the fingerprint are dropped before the two images
//! are stacked. Without a seam the footer is cut at the header height.

use image::{imageops, DynamicImage, RgbaImage};
use tracing::{debug, warn};

use crate::capture::config::PIXEL_MATCH_OFFSET;
use crate::error::{CaptureError, ErrorDetails};

/// Where the footer capture gets cut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seam {
    /// Fingerprint found starting at `row`; the footer is cut at `crop_row`
    Matched { row: u32, crop_row: u32 },
    /// No complete fingerprint match; the footer is cut at the header height
    Unmatched,
}

impl Seam {
    /// Footer row the stitched footer part starts at
    pub fn crop_row(&self, header_height: u32) -> u32 {
        match self {
            Seam::Matched { crop_row, .. } => *crop_row,
            Seam::Unmatched => header_height,
        }
    }
}

/// Number of trailing header rows used as the fingerprint
pub fn fingerprint_rows(header_height: u32) -> u32 {
    PIXEL_MATCH_OFFSET.min(header_height.saturating_sub(1))
}

fn row(image: &RgbaImage, y: u32) -> &[u8] {
    let stride = image.width() as usize * 4;
    let start = y as usize * stride;
    &image.as_raw()[start..start + stride]
}

/// Scans `footer` top-down for the last `fingerprint_rows` rows of `header`
pub fn find_seam(header: &RgbaImage, footer: &RgbaImage) -> Seam {
    let offset = fingerprint_rows(header.height());
    if offset == 0 || footer.height() < offset {
        return Seam::Unmatched;
    }

    let fingerprint_start = header.height() - offset;
    let first = row(header, fingerprint_start);

    for i in 0..=(footer.height() - offset) {
        if row(footer, i) != first {
            continue;
        }
        let matched = (1..offset).all(|y| row(footer, i + y) == row(header, fingerprint_start + y));
        if matched {
            return Seam::Matched { row: i, crop_row: i + offset };
        }
    }

    Seam::Unmatched
}

/// Stitches the header capture on top of the non-overlapping part of the footer capture.
///
/// The canvas takes the footer's width. Both captures are expected to share a width;
/// that is not checked here.
pub fn crop_and_stitch(header: &DynamicImage, footer: &DynamicImage) -> Result<DynamicImage, CaptureError> {
    let details = || {
        ErrorDetails::new()
            .with("header_size", format!("{}x{}", header.width(), header.height()))
            .with("footer_size", format!("{}x{}", footer.width(), footer.height()))
    };

    if header.width() == 0 || header.height() == 0 || footer.width() == 0 {
        return Err(CaptureError::failure(
            "Error while cropping and stitching a full page screenshot | empty capture",
            details(),
        ));
    }

    let header_rgba = header.to_rgba8();
    let footer_rgba = footer.to_rgba8();

    let seam = find_seam(&header_rgba, &footer_rgba);
    match seam {
        Seam::Matched { row, crop_row } => debug!("Seam found at footer row {}, cropping at {}", row, crop_row),
        // Known approximation: content between the two captures may be lost or repeated
        Seam::Unmatched => warn!(
            "No seam found between header and footer captures, cropping footer at {}",
            header_rgba.height()
        ),
    }

    let crop_row = seam.crop_row(header_rgba.height()).min(footer_rgba.height());
    let cropped_height = footer_rgba.height() - crop_row;
    let cropped_footer = imageops::crop_imm(&footer_rgba, 0, crop_row, footer_rgba.width(), cropped_height).to_image();

    let total_height = header_rgba.height().checked_add(cropped_height).ok_or_else(|| {
        CaptureError::failure(
            "Error while cropping and stitching a full page screenshot | stitched height overflows",
            details(),
        )
    })?;

    let mut canvas = RgbaImage::new(footer_rgba.width(), total_height);
    imageops::replace(&mut canvas, &header_rgba, 0, 0);
    imageops::replace(&mut canvas, &cropped_footer, 0, i64::from(header_rgba.height()));

    debug!(
        "Stitched {}px header and {}px of footer into {}x{}",
        header_rgba.height(),
        cropped_height,
        canvas.width(),
        canvas.height()
    );

    if header.color().has_alpha() || footer.color().has_alpha() {
        Ok(DynamicImage::ImageRgba8(canvas))
    } else {
        Ok(DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8()))
    }
}

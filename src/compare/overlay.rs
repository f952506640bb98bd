use image::{imageops, ColorType, DynamicImage, ImageFormat, Rgba, RgbaImage};
use tracing::{debug, info};

use crate::capture::EncodedImage;
use crate::error::{CompareError, ErrorDetails};

/// Crimson, fully transparent until blended
pub const DEFAULT_OVERLAY_COLOR: Rgba<u8> = Rgba([220, 20, 60, 0]);
const UNCHANGED_COLOR: [u8; 4] = [255, 255, 255, 0];
pub const OVERLAY_OPACITY: f32 = 0.8;

/// Outcome of a pixel comparison
#[derive(Debug, Clone, PartialEq)]
pub struct CompareResult {
    /// Share of overlay pixels that differ, 0 to 100
    pub percent_changed: f64,
    /// First image with the changed-pixel mask blended over it
    pub overlay_image: DynamicImage,
}

impl CompareResult {
    pub fn is_identical(&self) -> bool {
        self.percent_changed == 0.0
    }

    pub fn encode(&self, format: ImageFormat) -> Result<EncodedImage, CompareError> {
        EncodedImage::encode(&self.overlay_image, format)
            .map_err(|e| CompareError::compose(e.message(), e.details().clone()))
    }
}

/// Compares two images pixel by pixel using the default overlay color
pub fn compare_image(image_1: &DynamicImage, image_2: &DynamicImage) -> Result<CompareResult, CompareError> {
    compare_image_with(image_1, image_2, DEFAULT_OVERLAY_COLOR)
}

/// Compares two images pixel by pixel.
///
/// The overlay covers the larger of the two sizes in each dimension; pixels that
/// exist in only one image count as changed.
pub fn compare_image_with(
    image_1: &DynamicImage,
    image_2: &DynamicImage,
    overlay_color: Rgba<u8>,
) -> Result<CompareResult, CompareError> {
    let (width_1, height_1) = (image_1.width(), image_1.height());
    let (width_2, height_2) = (image_2.width(), image_2.height());
    let overlay_width = width_1.max(width_2);
    let overlay_height = height_1.max(height_2);

    let details = || {
        ErrorDetails::new()
            .with("image_1_size", format!("{}x{}", width_1, height_1))
            .with("image_2_size", format!("{}x{}", width_2, height_2))
    };

    if overlay_width == 0 || overlay_height == 0 {
        return Err(CompareError::data_gather("cannot compare images without pixels", details()));
    }

    let first = image_1.to_rgba8();
    let second = image_2.to_rgba8();

    let pixel_total = u64::from(overlay_width) * u64::from(overlay_height);
    let capacity = usize::try_from(pixel_total * 4)
        .map_err(|e| CompareError::data_gather(format!("overlay is too large: {}", e), details()))?;
    let mut mask = Vec::with_capacity(capacity);
    let mut pixels_changed = 0u64;

    for y in 0..overlay_height {
        for x in 0..overlay_width {
            let unchanged = x < width_1
                && y < height_1
                && x < width_2
                && y < height_2
                && first.get_pixel(x, y) == second.get_pixel(x, y);
            if unchanged {
                mask.extend_from_slice(&UNCHANGED_COLOR);
            } else {
                mask.extend_from_slice(&overlay_color.0);
                pixels_changed += 1;
            }
        }
    }

    let percent_changed = 100.0 * pixels_changed as f64 / pixel_total as f64;
    debug!("{} of {} pixels changed", pixels_changed, pixel_total);

    let overlay = RgbaImage::from_raw(overlay_width, overlay_height, mask)
        .ok_or_else(|| CompareError::compose("overlay buffer does not match its dimensions", details()))?;
    let overlay_image = blend_overlay(&first, &overlay, image_1.color())?;

    info!(
        "Compared {}x{} against {}x{}: {:.2}% changed",
        width_1, height_1, width_2, height_2, percent_changed
    );
    Ok(CompareResult { percent_changed, overlay_image })
}

fn blend_channel(base: u8, top: u8) -> u8 {
    let base = f32::from(base);
    let top = f32::from(top);
    (base + OVERLAY_OPACITY * (top - base)).round().clamp(0.0, 255.0) as u8
}

/// Pastes `base` onto an overlay-sized canvas and blends the mask over it.
///
/// Colour channels are blended; alpha keeps the base value inside the base
/// image and is opaque outside it. The result takes the 8-bit form of `color`.
fn blend_overlay(base: &RgbaImage, overlay: &RgbaImage, color: ColorType) -> Result<DynamicImage, CompareError> {
    let (width, height) = overlay.dimensions();
    if base.width() > width || base.height() > height {
        return Err(CompareError::compose(
            "base image is larger than the overlay",
            ErrorDetails::new()
                .with("base_size", format!("{}x{}", base.width(), base.height()))
                .with("overlay_size", format!("{}x{}", width, height)),
        ));
    }

    let mut canvas = RgbaImage::new(width, height);
    imageops::replace(&mut canvas, base, 0, 0);

    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let top = overlay.get_pixel(x, y);
        for channel in 0..3 {
            pixel[channel] = blend_channel(pixel[channel], top[channel]);
        }
        if x >= base.width() || y >= base.height() {
            pixel[3] = 255;
        }
    }

    let canvas = DynamicImage::ImageRgba8(canvas);
    Ok(match color {
        ColorType::L8 | ColorType::L16 => DynamicImage::ImageLuma8(canvas.to_luma8()),
        ColorType::La8 | ColorType::La16 => DynamicImage::ImageLumaA8(canvas.to_luma_alpha8()),
        color if color.has_alpha() => canvas,
        _ => DynamicImage::ImageRgb8(canvas.to_rgb8()),
    })
}

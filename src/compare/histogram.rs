use image::DynamicImage;
use std::borrow::Cow;
use tracing::debug;

const BINS_PER_CHANNEL: usize = 256;

/// Per-channel pixel counts, 256 bins for each channel of the 8-bit representation
pub fn histogram(image: &DynamicImage) -> Vec<u64> {
    let (channels, samples): (usize, Cow<'_, [u8]>) = match image {
        DynamicImage::ImageLuma8(buffer) => (1, Cow::Borrowed(buffer.as_raw().as_slice())),
        DynamicImage::ImageLumaA8(buffer) => (2, Cow::Borrowed(buffer.as_raw().as_slice())),
        DynamicImage::ImageRgb8(buffer) => (3, Cow::Borrowed(buffer.as_raw().as_slice())),
        DynamicImage::ImageRgba8(buffer) => (4, Cow::Borrowed(buffer.as_raw().as_slice())),
        other => (4, Cow::Owned(other.to_rgba8().into_raw())),
    };

    let mut bins = vec![0u64; channels * BINS_PER_CHANNEL];
    for pixel in samples.chunks_exact(channels) {
        for (channel, &value) in pixel.iter().enumerate() {
            bins[channel * BINS_PER_CHANNEL + value as usize] += 1;
        }
    }
    bins
}

/// Root-mean-square distance between the colour histograms of two images.
///
/// Cheap and position-blind: two images with the same colours in different places
/// score 0. Histograms of different lengths are compared bin by bin with missing
/// bins counted as empty.
pub fn image_difference(image_1: &DynamicImage, image_2: &DynamicImage) -> f64 {
    let first = histogram(image_1);
    let second = histogram(image_2);
    let bin_count = first.len().max(second.len());

    let sum_of_squares: f64 = (0..bin_count)
        .map(|i| {
            let a = first.get(i).copied().unwrap_or(0) as f64;
            let b = second.get(i).copied().unwrap_or(0) as f64;
            (a - b) * (a - b)
        })
        .sum();

    let rms = (sum_of_squares / bin_count as f64).sqrt();
    debug!("Histogram RMS difference over {} bins: {:.3}", bin_count, rms);
    rms
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn test_histogram_counts_every_channel() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 3, Rgb([1, 2, 3])));
        let bins = histogram(&image);

        assert_eq!(bins.len(), 768);
        assert_eq!(bins[1], 6);
        assert_eq!(bins[256 + 2], 6);
        assert_eq!(bins[512 + 3], 6);
        assert_eq!(bins.iter().sum::<u64>(), 18);
    }

    #[test]
    fn test_identical_images_have_zero_difference() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_fn(16, 16, |x, y| {
            Rgba([x as u8 * 10, y as u8 * 10, 99, 255])
        }));
        assert_eq!(image_difference(&image, &image), 0.0);
    }

    #[test]
    fn test_difference_of_solid_images() {
        // 4 pixels each: every channel moves 4 counts from one bin to another
        let black = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([0, 0, 0])));
        let white = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([255, 255, 255])));

        let expected = ((6.0 * 16.0) / 768.0f64).sqrt();
        assert!((image_difference(&black, &white) - expected).abs() < 1e-9);
        assert_eq!(image_difference(&black, &white), image_difference(&white, &black));
    }

    #[test]
    fn test_position_blind() {
        let a = DynamicImage::ImageRgb8(RgbImage::from_fn(2, 1, |x, _| if x == 0 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) }));
        let b = DynamicImage::ImageRgb8(RgbImage::from_fn(2, 1, |x, _| if x == 0 { Rgb([0, 0, 255]) } else { Rgb([255, 0, 0]) }));
        assert_eq!(image_difference(&a, &b), 0.0);
    }

    #[test]
    fn test_mixed_channel_counts() {
        let rgb = DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, Rgb([0, 0, 0])));
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255])));
        // only the alpha bin differs, over 1024 bins
        let expected = (1.0 / 1024.0f64).sqrt();
        assert!((image_difference(&rgb, &rgba) - expected).abs() < 1e-9);
    }
}

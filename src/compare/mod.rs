//! Visual comparison of two captures.
//!
//! [`image_difference`] is a fast histogram pre-check; [`compare_image`] does the
//! pixel-accurate comparison and renders an overlay of the changed pixels.

pub mod histogram;
pub mod overlay;

pub use histogram::{histogram, image_difference};
pub use overlay::{compare_image, compare_image_with, CompareResult, DEFAULT_OVERLAY_COLOR, OVERLAY_OPACITY};

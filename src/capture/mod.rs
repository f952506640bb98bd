//! Page capture: single viewport, paginated tiles, and full pages with sticky
//! header/footer handling.

pub mod config;
pub mod model;
pub mod page;
pub mod stitch;

pub use config::{CaptureConfiguration, DEFAULT_FILE_EXTENSION, DEFAULT_SCROLL_PADDING, PIXEL_MATCH_OFFSET};
pub use model::{CaptureResult, EncodedImage};
pub use page::{crop_to_viewport, decode_screenshot, PageCapture};
pub use stitch::{crop_and_stitch, find_seam, Seam};

//! QA helpers for website regression testing: full-page screenshot capture with
//! sticky header/footer stitching, and visual comparison of captures.

pub mod artifact;
pub mod capture;
pub mod compare;
pub mod driver;
pub mod error;
pub mod settings;
pub mod utils;

pub use capture::{CaptureConfiguration, CaptureResult, EncodedImage, PageCapture};
pub use compare::{compare_image, image_difference, CompareResult};
pub use driver::{BrowserDriver, DriverError, ScrollAxis, WebDriverSession};
pub use error::{CaptureError, CompareError, ErrorDetails};

pub mod config;
pub mod webdriver;

use std::fmt;
use thiserror::Error;

use crate::error::ErrorDetails;

pub use webdriver::WebDriverSession;

/// Direction a scrollable element is walked in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAxis {
    Vertical,
    Horizontal,
}

impl fmt::Display for ScrollAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrollAxis::Vertical => write!(f, "vertical"),
            ScrollAxis::Horizontal => write!(f, "horizontal"),
        }
    }
}

/// Errors reported by a browser driver
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DriverError {
    #[error("element '{selector}' does not exist on the page")]
    ElementNotFound { selector: String },

    #[error("element '{selector}' is not visible")]
    ElementNotVisible { selector: String },

    #[error("timed out waiting for element '{selector}'")]
    Timeout { selector: String },

    /// The window could not be scrolled to the requested offset
    #[error("unable to scroll to position ({x}, {y})")]
    InvalidScrollTarget { x: i64, y: i64 },

    #[error("webdriver session error: {0}")]
    Session(String),

    #[error("webdriver command failed: {0}")]
    Command(String),
}

impl DriverError {
    pub fn details(&self) -> ErrorDetails {
        match self {
            DriverError::ElementNotFound { selector }
            | DriverError::ElementNotVisible { selector }
            | DriverError::Timeout { selector } => ErrorDetails::new().with("selector", selector),
            DriverError::InvalidScrollTarget { x, y } => {
                ErrorDetails::new().with("x_position", x).with("y_position", y)
            }
            DriverError::Session(_) | DriverError::Command(_) => ErrorDetails::new(),
        }
    }

    /// Whether hiding/showing a sticky element may silently skip this error
    pub fn is_missing_element(&self) -> bool {
        matches!(
            self,
            DriverError::ElementNotFound { .. } | DriverError::ElementNotVisible { .. }
        )
    }
}

/// The browser operations page capture relies on.
///
/// Calls block until the browser has answered. A session is not meant to be
/// driven from several callers at once, hence `&mut self` throughout.
pub trait BrowserDriver {
    fn scroll_to_position(&mut self, x: u32, y: u32) -> Result<(), DriverError>;

    /// Scrolls the window to its maximum vertical offset
    fn scroll_to_bottom(&mut self) -> Result<(), DriverError>;

    /// Visible area as (width, height)
    fn viewport_size(&mut self) -> Result<(u32, u32), DriverError>;

    /// Window scroll offset as (x, y)
    fn scroll_offset(&mut self) -> Result<(u32, u32), DriverError>;

    fn scroll_element_to_start(&mut self, selector: &str, axis: ScrollAxis) -> Result<(), DriverError>;

    fn scroll_element_by(&mut self, selector: &str, axis: ScrollAxis, amount: u32) -> Result<(), DriverError>;

    fn element_scroll_offset(&mut self, selector: &str, axis: ScrollAxis) -> Result<u32, DriverError>;

    /// Rendered size of the element as (width, height)
    fn element_size(&mut self, selector: &str) -> Result<(u32, u32), DriverError>;

    fn is_element_scroll_at_end(&mut self, selector: &str, axis: ScrollAxis) -> Result<bool, DriverError>;

    /// Raw screenshot of the visible browser canvas, PNG bytes or base64 text
    fn capture_screenshot(&mut self) -> Result<Vec<u8>, DriverError>;

    fn hide_element(&mut self, selector: &str) -> Result<(), DriverError>;

    fn show_element(&mut self, selector: &str) -> Result<(), DriverError>;
}

impl<D: BrowserDriver + ?Sized> BrowserDriver for &mut D {
    fn scroll_to_position(&mut self, x: u32, y: u32) -> Result<(), DriverError> {
        (**self).scroll_to_position(x, y)
    }

    fn scroll_to_bottom(&mut self) -> Result<(), DriverError> {
        (**self).scroll_to_bottom()
    }

    fn viewport_size(&mut self) -> Result<(u32, u32), DriverError> {
        (**self).viewport_size()
    }

    fn scroll_offset(&mut self) -> Result<(u32, u32), DriverError> {
        (**self).scroll_offset()
    }

    fn scroll_element_to_start(&mut self, selector: &str, axis: ScrollAxis) -> Result<(), DriverError> {
        (**self).scroll_element_to_start(selector, axis)
    }

    fn scroll_element_by(&mut self, selector: &str, axis: ScrollAxis, amount: u32) -> Result<(), DriverError> {
        (**self).scroll_element_by(selector, axis, amount)
    }

    fn element_scroll_offset(&mut self, selector: &str, axis: ScrollAxis) -> Result<u32, DriverError> {
        (**self).element_scroll_offset(selector, axis)
    }

    fn element_size(&mut self, selector: &str) -> Result<(u32, u32), DriverError> {
        (**self).element_size(selector)
    }

    fn is_element_scroll_at_end(&mut self, selector: &str, axis: ScrollAxis) -> Result<bool, DriverError> {
        (**self).is_element_scroll_at_end(selector, axis)
    }

    fn capture_screenshot(&mut self) -> Result<Vec<u8>, DriverError> {
        (**self).capture_screenshot()
    }

    fn hide_element(&mut self, selector: &str) -> Result<(), DriverError> {
        (**self).hide_element(selector)
    }

    fn show_element(&mut self, selector: &str) -> Result<(), DriverError> {
        (**self).show_element(selector)
    }
}

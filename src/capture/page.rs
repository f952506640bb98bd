use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::DynamicImage;
use tracing::{debug, info, trace, warn};

use crate::capture::config::CaptureConfiguration;
use crate::capture::model::{CaptureResult, EncodedImage};
use crate::capture::stitch;
use crate::driver::{BrowserDriver, DriverError, ScrollAxis};
use crate::error::{CaptureError, ErrorDetails};

const PAGE_DRIVER_ISSUE: &str = "A driver issue arose while taking the screenshot";
const ELEMENT_DRIVER_ISSUE: &str = "A driver issue arose while capturing the scrolling element";

/// Failure inside a capture step, classified once at the public boundary
enum CaptureFault {
    Driver(DriverError),
    Failure(CaptureError),
}

impl From<DriverError> for CaptureFault {
    fn from(err: DriverError) -> Self {
        CaptureFault::Driver(err)
    }
}

impl From<CaptureError> for CaptureFault {
    fn from(err: CaptureError) -> Self {
        CaptureFault::Failure(err)
    }
}

impl CaptureFault {
    fn into_capture_error(self, driver_message: &str, details: ErrorDetails) -> CaptureError {
        match self {
            CaptureFault::Driver(err) => CaptureError::selenium(driver_message, err, details),
            CaptureFault::Failure(err) => err.with_details(details),
        }
    }
}

/// Decodes screenshot bytes, accepting binary image data or base64 text of it
pub fn decode_screenshot(data: &[u8]) -> Result<DynamicImage, CaptureError> {
    match image::load_from_memory(data) {
        Ok(image) => Ok(image),
        Err(binary_err) => {
            trace!("Screenshot is not binary image data ({}), trying base64", binary_err);
            let text: Vec<u8> = data.iter().copied().filter(|b| !b.is_ascii_whitespace()).collect();
            let decoded = BASE64.decode(&text).map_err(|e| {
                CaptureError::failure(
                    format!("Screenshot data could not be decoded: {} / {}", binary_err, e),
                    ErrorDetails::new().with("bytes", data.len()),
                )
            })?;
            image::load_from_memory(&decoded).map_err(|e| {
                CaptureError::failure(
                    format!("Screenshot data could not be decoded: {}", e),
                    ErrorDetails::new().with("bytes", data.len()),
                )
            })
        }
    }
}

/// Crops a raw screenshot to the visible viewport rectangle.
///
/// Screenshots that are only viewport sized already start at the scroll offset,
/// in which case the crop origin falls back to the image origin.
pub fn crop_to_viewport(
    image: &DynamicImage,
    scroll_offset: (u32, u32),
    viewport: (u32, u32),
) -> Result<DynamicImage, CaptureError> {
    let (scroll_x, scroll_y) = scroll_offset;
    let (viewport_width, viewport_height) = viewport;
    let (width, height) = (image.width(), image.height());

    if viewport_width == 0 || viewport_height == 0 {
        return Err(CaptureError::failure(
            "The driver reported an empty viewport",
            ErrorDetails::new().with("viewport", format!("{}x{}", viewport_width, viewport_height)),
        ));
    }

    let x = if width >= scroll_x.saturating_add(viewport_width) { scroll_x } else { 0 };
    let y = if height >= scroll_y.saturating_add(viewport_height) { scroll_y } else { 0 };
    let crop_width = viewport_width.min(width - x);
    let crop_height = viewport_height.min(height - y);

    trace!("Cropping {}x{} screenshot to ({}, {}) {}x{}", width, height, x, y, crop_width, crop_height);
    Ok(image.crop_imm(x, y, crop_width, crop_height))
}

fn hide_elements<D: BrowserDriver>(driver: &mut D, selectors: &[String]) -> Result<(), DriverError> {
    for selector in selectors {
        match driver.hide_element(selector) {
            Ok(()) => trace!("Hid element '{}'", selector),
            // Missing or already hidden elements are skipped
            Err(e) if e.is_missing_element() => debug!("Skipping hide of '{}': {}", selector, e),
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn show_elements<D: BrowserDriver>(driver: &mut D, selectors: &[String]) -> Result<(), DriverError> {
    for selector in selectors {
        match driver.show_element(selector) {
            Ok(()) => trace!("Showed element '{}'", selector),
            Err(e) if e.is_missing_element() => debug!("Skipping show of '{}': {}", selector, e),
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Captures pages and scrollable elements through a browser driver
pub struct PageCapture<D: BrowserDriver> {
    driver: D,
    config: CaptureConfiguration,
}

impl<D: BrowserDriver> std::fmt::Debug for PageCapture<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageCapture").field("config", &self.config).finish_non_exhaustive()
    }
}

impl<D: BrowserDriver> PageCapture<D> {
    /// Creates a capture context; the configuration is validated up front
    pub fn new(driver: D, config: CaptureConfiguration) -> Result<Self, CaptureError> {
        config.validate()?;
        debug!(
            "Creating PageCapture (paginated: {}, headers: {}, footers: {}, padding: {})",
            config.paginated,
            config.header_selectors.len(),
            config.footer_selectors.len(),
            config.scroll_padding
        );
        Ok(Self { driver, config })
    }

    pub fn config(&self) -> &CaptureConfiguration {
        &self.config
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Captures the current page.
    ///
    /// Paginated configurations always produce a tile sequence and ignore
    /// `viewport_only`. `scroll_padding` overrides the configured padding for this call.
    pub fn capture_page(&mut self, viewport_only: bool, scroll_padding: Option<u32>) -> Result<CaptureResult, CaptureError> {
        let padding = self.config.effective_scroll_padding(scroll_padding);
        info!(
            "Capturing page (paginated: {}, viewport only: {}, padding: {})",
            self.config.paginated, viewport_only, padding
        );

        let result = if self.config.paginated {
            self.paginated_page(padding).map(CaptureResult::Sequence)
        } else if viewport_only {
            self.single_viewport().map(CaptureResult::Single)
        } else {
            self.full_page().map(CaptureResult::Single)
        };

        let result = result.map_err(|fault| {
            fault.into_capture_error(
                PAGE_DRIVER_ISSUE,
                ErrorDetails::new()
                    .with("operation", "capture_page")
                    .with("viewport_only", viewport_only)
                    .with("paginated", self.config.paginated),
            )
        })?;

        info!("Captured {} image(s) of the page", result.len());
        Ok(result)
    }

    /// Captures the page and encodes every image in the configured file format
    pub fn capture_page_encoded(
        &mut self,
        viewport_only: bool,
        scroll_padding: Option<u32>,
    ) -> Result<Vec<EncodedImage>, CaptureError> {
        let format = self.config.image_format()?;
        self.capture_page(viewport_only, scroll_padding)?.encode(format)
    }

    /// Scrolls an element top to bottom, one element height minus padding per step,
    /// capturing after every step
    pub fn capture_scrolling_element(&mut self, selector: &str, viewport_only: bool) -> Result<Vec<DynamicImage>, CaptureError> {
        self.capture_element(selector, ScrollAxis::Vertical, viewport_only)
    }

    /// Horizontal counterpart of [`capture_scrolling_element`](Self::capture_scrolling_element)
    pub fn capture_horizontal_scrolling_element(
        &mut self,
        selector: &str,
        viewport_only: bool,
    ) -> Result<Vec<DynamicImage>, CaptureError> {
        self.capture_element(selector, ScrollAxis::Horizontal, viewport_only)
    }

    fn capture_element(&mut self, selector: &str, axis: ScrollAxis, viewport_only: bool) -> Result<Vec<DynamicImage>, CaptureError> {
        info!("Capturing {} scrolling element '{}'", axis, selector);
        let images = self.scrolling_element(selector, axis, viewport_only).map_err(|fault| {
            fault.into_capture_error(
                ELEMENT_DRIVER_ISSUE,
                ErrorDetails::new()
                    .with("operation", "capture_scrolling_element")
                    .with("selector", selector)
                    .with("axis", axis),
            )
        })?;
        info!("Captured {} image(s) of element '{}'", images.len(), selector);
        Ok(images)
    }

    fn scrolling_element(&mut self, selector: &str, axis: ScrollAxis, viewport_only: bool) -> Result<Vec<DynamicImage>, CaptureFault> {
        let mut images = Vec::new();
        self.driver.scroll_element_to_start(selector, axis)?;

        loop {
            let image = if viewport_only { self.single_viewport()? } else { self.full_page()? };
            images.push(image);

            if self.driver.is_element_scroll_at_end(selector, axis)? {
                debug!("Element '{}' scrolled to its end after {} capture(s)", selector, images.len());
                break;
            }

            let (width, height) = self.driver.element_size(selector)?;
            let extent = match axis {
                ScrollAxis::Vertical => height,
                ScrollAxis::Horizontal => width,
            };
            let amount = extent.saturating_sub(self.config.scroll_padding).max(1);

            let before = self.driver.element_scroll_offset(selector, axis)?;
            self.driver.scroll_element_by(selector, axis, amount)?;
            let after = self.driver.element_scroll_offset(selector, axis)?;
            if after == before {
                warn!("Element '{}' did not move when scrolled by {}px, stopping", selector, amount);
                break;
            }
            trace!("Element '{}' scrolled from {} to {}", selector, before, after);
        }

        Ok(images)
    }

    fn raw_image(&mut self) -> Result<DynamicImage, CaptureFault> {
        let data = self.driver.capture_screenshot()?;
        Ok(decode_screenshot(&data)?)
    }

    fn single_viewport(&mut self) -> Result<DynamicImage, CaptureFault> {
        let image = self.raw_image()?;
        if self.config.mobile {
            return Ok(image);
        }
        let offset = self.driver.scroll_offset()?;
        let viewport = self.driver.viewport_size()?;
        Ok(crop_to_viewport(&image, offset, viewport)?)
    }

    /// Runs `step` with `selectors` hidden. Visibility is restored whether or not
    /// hiding or the step failed; the first error wins.
    fn while_hidden<T>(
        &mut self,
        selectors: &[String],
        step: impl FnOnce(&mut Self) -> Result<T, CaptureFault>,
    ) -> Result<T, CaptureFault> {
        let result = match hide_elements(&mut self.driver, selectors) {
            Ok(()) => step(self),
            Err(e) => Err(e.into()),
        };
        let restored = show_elements(&mut self.driver, selectors);
        if result.is_err() {
            if let Err(e) = &restored {
                warn!("Failed to restore hidden elements after a capture error: {}", e);
            }
        }
        let value = result?;
        restored?;
        Ok(value)
    }

    fn full_page(&mut self) -> Result<DynamicImage, CaptureFault> {
        let has_headers = !self.config.header_selectors.is_empty();
        let has_footers = !self.config.footer_selectors.is_empty();

        match (has_headers, has_footers) {
            (true, true) => {
                let footers = self.config.footer_selectors.clone();
                let headers = self.config.header_selectors.clone();

                debug!("Capturing header view with footers hidden");
                self.driver.scroll_to_position(0, 0)?;
                let header_image = self.while_hidden(&footers, Self::single_viewport)?;

                debug!("Capturing footer view with headers hidden");
                self.driver.scroll_to_bottom()?;
                let footer_image = self.while_hidden(&headers, Self::raw_image)?;

                Ok(stitch::crop_and_stitch(&header_image, &footer_image)?)
            }
            (true, false) => {
                // Headers must not cover content below the top of the page
                self.driver.scroll_to_position(0, 0)?;
                self.raw_image()
            }
            (false, true) => {
                self.driver.scroll_to_bottom()?;
                self.raw_image()
            }
            (false, false) => self.raw_image(),
        }
    }

    fn paginated_page(&mut self, padding: u32) -> Result<Vec<DynamicImage>, CaptureFault> {
        let mut images = Vec::new();
        self.driver.scroll_to_position(0, 0)?;

        let mut current = 0u32;
        let (_, viewport_height) = self.driver.viewport_size()?;
        let step = viewport_height.saturating_sub(padding).max(1);

        loop {
            images.push(self.single_viewport()?);

            self.driver.scroll_to_position(0, current.saturating_add(step))?;
            let (_, position) = self.driver.scroll_offset()?;
            if position == current {
                break;
            }
            trace!("Page scrolled from {} to {}", current, position);
            current = position;
        }

        debug!("Captured {} paginated tile(s)", images.len());
        Ok(images)
    }
}

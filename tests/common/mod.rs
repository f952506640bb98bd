//! In-memory browser page used to drive `PageCapture` without a WebDriver server.
#![allow(dead_code)]

use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use the_ark::{BrowserDriver, DriverError, ScrollAxis};

pub const HEADER_COLOR: Rgb<u8> = Rgb([255, 0, 255]);
pub const FOOTER_COLOR: Rgb<u8> = Rgb([0, 255, 255]);

/// Page rows coloured by their index so every row is distinct
pub fn striped_page(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |_, y| Rgb([(y % 256) as u8, (y / 256) as u8, 7]))
}

/// The colour `striped_page` gives to row `y`
pub fn row_color(y: u32) -> Rgb<u8> {
    Rgb([(y % 256) as u8, (y / 256) as u8, 7])
}

#[derive(Debug, Clone)]
pub struct FakeElement {
    pub size: (u32, u32),
    pub content: (u32, u32),
    pub offset: (u32, u32),
    /// Never reports its end and ignores scrolling
    pub stuck: bool,
}

impl FakeElement {
    pub fn new(size: (u32, u32), content: (u32, u32)) -> Self {
        Self { size, content, offset: (0, 0), stuck: false }
    }

    fn max_offset(&self, axis: ScrollAxis) -> u32 {
        match axis {
            ScrollAxis::Vertical => self.content.1.saturating_sub(self.size.1),
            ScrollAxis::Horizontal => self.content.0.saturating_sub(self.size.0),
        }
    }

    fn offset(&self, axis: ScrollAxis) -> u32 {
        match axis {
            ScrollAxis::Vertical => self.offset.1,
            ScrollAxis::Horizontal => self.offset.0,
        }
    }

    fn set_offset(&mut self, axis: ScrollAxis, value: u32) {
        let value = value.min(self.max_offset(axis));
        match axis {
            ScrollAxis::Vertical => self.offset.1 = value,
            ScrollAxis::Horizontal => self.offset.0 = value,
        }
    }
}

pub struct FakePage {
    pub page: RgbImage,
    pub viewport: (u32, u32),
    pub scroll: (u32, u32),
    /// Sticky elements drawn over the top / bottom of every visible viewport
    pub sticky_header: Option<(String, u32)>,
    pub sticky_footer: Option<(String, u32)>,
    pub hidden: HashSet<String>,
    pub elements: HashMap<String, FakeElement>,
    /// Return the whole page instead of the viewport
    pub full_page_screenshots: bool,
    pub base64_screenshots: bool,
    pub corrupt_screenshots: bool,
    pub screenshot_error: Option<DriverError>,
    /// Errors returned when hiding these selectors
    pub hide_errors: HashMap<String, DriverError>,
    pub log: Vec<String>,
}

impl FakePage {
    pub fn new(width: u32, height: u32, viewport: (u32, u32)) -> Self {
        Self {
            page: striped_page(width, height),
            viewport,
            scroll: (0, 0),
            sticky_header: None,
            sticky_footer: None,
            hidden: HashSet::new(),
            elements: HashMap::new(),
            full_page_screenshots: false,
            base64_screenshots: false,
            corrupt_screenshots: false,
            screenshot_error: None,
            hide_errors: HashMap::new(),
            log: Vec::new(),
        }
    }

    pub fn with_sticky_header(mut self, selector: &str, height: u32) -> Self {
        self.sticky_header = Some((selector.to_string(), height));
        self
    }

    pub fn with_sticky_footer(mut self, selector: &str, height: u32) -> Self {
        self.sticky_footer = Some((selector.to_string(), height));
        self
    }

    pub fn with_element(mut self, selector: &str, element: FakeElement) -> Self {
        self.elements.insert(selector.to_string(), element);
        self
    }

    pub fn with_hide_error(mut self, selector: &str, err: DriverError) -> Self {
        self.hide_errors.insert(selector.to_string(), err);
        self
    }

    pub fn screenshots_taken(&self) -> usize {
        self.log.iter().filter(|entry| entry.as_str() == "screenshot").count()
    }

    fn max_scroll(&self) -> (u32, u32) {
        (
            self.page.width().saturating_sub(self.viewport.0),
            self.page.height().saturating_sub(self.viewport.1),
        )
    }

    fn sticky_exists(&self, selector: &str) -> bool {
        self.sticky_header.iter().chain(self.sticky_footer.iter()).any(|(s, _)| s == selector)
    }

    fn element(&mut self, selector: &str) -> Result<&mut FakeElement, DriverError> {
        self.elements
            .get_mut(selector)
            .ok_or_else(|| DriverError::ElementNotFound { selector: selector.to_string() })
    }

    fn render(&self) -> RgbImage {
        let mut image = if self.full_page_screenshots {
            self.page.clone()
        } else {
            let (x, y) = self.scroll;
            image::imageops::crop_imm(&self.page, x, y, self.viewport.0, self.viewport.1).to_image()
        };

        // sticky elements sit at fixed viewport positions
        let top = if self.full_page_screenshots { self.scroll.1 } else { 0 };
        if let Some((selector, band)) = &self.sticky_header {
            if !self.hidden.contains(selector) {
                for y in top..(top + band).min(image.height()) {
                    for x in 0..image.width() {
                        image.put_pixel(x, y, HEADER_COLOR);
                    }
                }
            }
        }
        if let Some((selector, band)) = &self.sticky_footer {
            if !self.hidden.contains(selector) {
                let bottom = (top + self.viewport.1).min(image.height());
                for y in bottom.saturating_sub(*band)..bottom {
                    for x in 0..image.width() {
                        image.put_pixel(x, y, FOOTER_COLOR);
                    }
                }
            }
        }
        image
    }
}

impl BrowserDriver for FakePage {
    fn scroll_to_position(&mut self, x: u32, y: u32) -> Result<(), DriverError> {
        let (max_x, max_y) = self.max_scroll();
        self.scroll = (x.min(max_x), y.min(max_y));
        self.log.push(format!("scroll_to({},{})", x, y));
        Ok(())
    }

    fn scroll_to_bottom(&mut self) -> Result<(), DriverError> {
        self.scroll.1 = self.max_scroll().1;
        self.log.push("scroll_to_bottom".to_string());
        Ok(())
    }

    fn viewport_size(&mut self) -> Result<(u32, u32), DriverError> {
        Ok(self.viewport)
    }

    fn scroll_offset(&mut self) -> Result<(u32, u32), DriverError> {
        Ok(self.scroll)
    }

    fn scroll_element_to_start(&mut self, selector: &str, axis: ScrollAxis) -> Result<(), DriverError> {
        self.element(selector)?.set_offset(axis, 0);
        self.log.push(format!("element_start({})", selector));
        Ok(())
    }

    fn scroll_element_by(&mut self, selector: &str, axis: ScrollAxis, amount: u32) -> Result<(), DriverError> {
        let element = self.element(selector)?;
        if !element.stuck {
            let target = element.offset(axis) + amount;
            element.set_offset(axis, target);
        }
        self.log.push(format!("element_by({},{})", selector, amount));
        Ok(())
    }

    fn element_scroll_offset(&mut self, selector: &str, axis: ScrollAxis) -> Result<u32, DriverError> {
        Ok(self.element(selector)?.offset(axis))
    }

    fn element_size(&mut self, selector: &str) -> Result<(u32, u32), DriverError> {
        Ok(self.element(selector)?.size)
    }

    fn is_element_scroll_at_end(&mut self, selector: &str, axis: ScrollAxis) -> Result<bool, DriverError> {
        let element = self.element(selector)?;
        Ok(!element.stuck && element.offset(axis) >= element.max_offset(axis))
    }

    fn capture_screenshot(&mut self) -> Result<Vec<u8>, DriverError> {
        if let Some(err) = self.screenshot_error.clone() {
            return Err(err);
        }
        self.log.push("screenshot".to_string());
        if self.corrupt_screenshots {
            return Ok(b"definitely not a png".to_vec());
        }

        let mut data = Vec::new();
        DynamicImage::ImageRgb8(self.render())
            .write_to(&mut Cursor::new(&mut data), ImageOutputFormat::Png)
            .map_err(|e| DriverError::Command(e.to_string()))?;

        if self.base64_screenshots {
            use base64::Engine as _;
            return Ok(base64::engine::general_purpose::STANDARD.encode(&data).into_bytes());
        }
        Ok(data)
    }

    fn hide_element(&mut self, selector: &str) -> Result<(), DriverError> {
        if let Some(err) = self.hide_errors.get(selector) {
            return Err(err.clone());
        }
        if !self.sticky_exists(selector) {
            return Err(DriverError::ElementNotFound { selector: selector.to_string() });
        }
        if !self.hidden.insert(selector.to_string()) {
            return Err(DriverError::ElementNotVisible { selector: selector.to_string() });
        }
        self.log.push(format!("hide({})", selector));
        Ok(())
    }

    fn show_element(&mut self, selector: &str) -> Result<(), DriverError> {
        if !self.sticky_exists(selector) {
            return Err(DriverError::ElementNotFound { selector: selector.to_string() });
        }
        self.hidden.remove(selector);
        self.log.push(format!("show({})", selector));
        Ok(())
    }
}

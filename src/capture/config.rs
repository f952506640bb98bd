use image::ImageFormat;
use serde::{Deserialize, Serialize};

use crate::error::{CaptureError, ErrorDetails};

pub const DEFAULT_SCROLL_PADDING: u32 = 100;    // Overlap kept between consecutive tiles
pub const DEFAULT_FILE_EXTENSION: &str = ".png";
pub const PIXEL_MATCH_OFFSET: u32 = 100;        // Rows used as the seam fingerprint

fn is_writable(format: &ImageFormat) -> bool {
    matches!(
        format,
        ImageFormat::Png
            | ImageFormat::Jpeg
            | ImageFormat::Bmp
            | ImageFormat::Gif
            | ImageFormat::Tiff
            | ImageFormat::Tga
            | ImageFormat::Ico
    )
}

/// Settings for one page-capture context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfiguration {
    /// Capture full pages as a sequence of viewport sized tiles
    pub paginated: bool,

    /// Selectors of elements that stick to the top of the viewport
    pub header_selectors: Vec<String>,

    /// Selectors of elements that stick to the bottom of the viewport
    pub footer_selectors: Vec<String>,

    /// Pixels of overlap between tiles and between scrolled element views
    pub scroll_padding: u32,

    /// Extension of encoded captures, with or without the leading dot
    pub file_extension: String,

    /// Mobile drivers already return only the visible area, so no viewport crop is applied
    pub mobile: bool,
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            paginated: false,
            header_selectors: Vec::new(),
            footer_selectors: Vec::new(),
            scroll_padding: DEFAULT_SCROLL_PADDING,
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
            mobile: false,
        }
    }
}

impl CaptureConfiguration {
    pub fn paginated(mut self, paginated: bool) -> Self {
        self.paginated = paginated;
        self
    }

    pub fn with_headers<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header_selectors = selectors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_footers<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.footer_selectors = selectors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_scroll_padding(mut self, scroll_padding: u32) -> Self {
        self.scroll_padding = scroll_padding;
        self
    }

    pub fn with_file_extension(mut self, extension: &str) -> Self {
        self.file_extension = extension.to_string();
        self
    }

    pub fn mobile(mut self, mobile: bool) -> Self {
        self.mobile = mobile;
        self
    }

    /// Image format matching `file_extension`
    pub fn image_format(&self) -> Result<ImageFormat, CaptureError> {
        let extension = self.file_extension.trim_start_matches('.');
        ImageFormat::from_extension(extension)
            .filter(is_writable)
            .ok_or_else(|| {
                CaptureError::failure(
                    format!("Unsupported screenshot file extension '{}'", self.file_extension),
                    ErrorDetails::new().with("file_extension", &self.file_extension),
                )
            })
    }

    /// Checks the configuration before it is used for a capture
    pub fn validate(&self) -> Result<(), CaptureError> {
        self.image_format()?;
        if let Some(selector) = self
            .header_selectors
            .iter()
            .chain(self.footer_selectors.iter())
            .find(|s| s.trim().is_empty())
        {
            return Err(CaptureError::failure(
                "Sticky element selectors cannot be empty",
                ErrorDetails::new().with("selector", format!("{:?}", selector)),
            ));
        }
        Ok(())
    }

    /// Padding for one call: the explicit argument wins over the configured value
    pub fn effective_scroll_padding(&self, requested: Option<u32>) -> u32 {
        requested.unwrap_or(self.scroll_padding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CaptureConfiguration::default();
        assert!(!config.paginated);
        assert_eq!(config.scroll_padding, 100);
        assert_eq!(config.image_format().unwrap(), ImageFormat::Png);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_extension_without_dot() {
        let config = CaptureConfiguration::default().with_file_extension("bmp");
        assert_eq!(config.image_format().unwrap(), ImageFormat::Bmp);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let config = CaptureConfiguration::default().with_file_extension(".doc");
        let err = config.validate().unwrap_err();
        assert!(!err.is_driver_issue());
        assert_eq!(err.details().get("file_extension"), Some(".doc"));
    }

    #[test]
    fn test_blank_selector_rejected() {
        let config = CaptureConfiguration::default().with_headers(["#nav", " "]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_padding_precedence() {
        let config = CaptureConfiguration::default().with_scroll_padding(40);
        assert_eq!(config.effective_scroll_padding(None), 40);
        assert_eq!(config.effective_scroll_padding(Some(300)), 300);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: CaptureConfiguration =
            serde_json::from_str(r#"{"paginated": true, "footer_selectors": [".cookie-bar"]}"#).unwrap();
        assert!(config.paginated);
        assert_eq!(config.footer_selectors, vec![".cookie-bar".to_string()]);
        assert_eq!(config.scroll_padding, DEFAULT_SCROLL_PADDING);
        assert_eq!(config.file_extension, ".png");
    }
}

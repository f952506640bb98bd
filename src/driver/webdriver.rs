use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder};
use serde_json::{json, Value};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, error, trace, warn};

use crate::driver::config::{self, CONNECTION_TIMEOUT};
use crate::driver::{BrowserDriver, DriverError, ScrollAxis};

const SCROLL_TO_SCRIPT: &str = "window.scrollTo(arguments[0], arguments[1]); \
     return Number.isFinite(window.scrollX) && Number.isFinite(window.scrollY);";
const SCROLL_TO_BOTTOM_SCRIPT: &str = "window.scrollTo(window.scrollX, \
     Math.max(document.body.scrollHeight, document.documentElement.scrollHeight));";
const VIEWPORT_SCRIPT: &str =
    "return [document.documentElement.clientWidth, document.documentElement.clientHeight];";
const SCROLL_OFFSET_SCRIPT: &str = "return [window.scrollX, window.scrollY];";

// Element scripts take the selector as arguments[0] and a horizontal flag as arguments[1].
// They return null when the selector matches nothing.
const ELEMENT_SCROLL_START_SCRIPT: &str = "var el = document.querySelector(arguments[0]); \
     if (!el) { return null; } \
     if (arguments[1]) { el.scrollLeft = 0; } else { el.scrollTop = 0; } \
     return true;";
const ELEMENT_SCROLL_BY_SCRIPT: &str = "var el = document.querySelector(arguments[0]); \
     if (!el) { return null; } \
     if (arguments[1]) { el.scrollLeft += arguments[2]; } else { el.scrollTop += arguments[2]; } \
     return true;";
const ELEMENT_SCROLL_OFFSET_SCRIPT: &str = "var el = document.querySelector(arguments[0]); \
     if (!el) { return null; } \
     return arguments[1] ? el.scrollLeft : el.scrollTop;";
const ELEMENT_AT_END_SCRIPT: &str = "var el = document.querySelector(arguments[0]); \
     if (!el) { return null; } \
     var max = arguments[1] ? el.scrollWidth - el.clientWidth : el.scrollHeight - el.clientHeight; \
     var pos = arguments[1] ? el.scrollLeft : el.scrollTop; \
     return Math.ceil(pos) >= max;";
const ELEMENT_SIZE_SCRIPT: &str = "var el = document.querySelector(arguments[0]); \
     if (!el) { return null; } \
     return [el.offsetWidth, el.offsetHeight];";
const HIDE_ELEMENT_SCRIPT: &str = "var el = document.querySelector(arguments[0]); \
     if (!el) { return null; } \
     if (el.style.display === 'none') { return 'hidden'; } \
     el.style.display = 'none'; \
     return 'ok';";
const SHOW_ELEMENT_SCRIPT: &str = "var el = document.querySelector(arguments[0]); \
     if (!el) { return null; } \
     el.style.display = ''; \
     return 'ok';";

/// A fantoccini WebDriver session exposed through the blocking [`BrowserDriver`] interface.
///
/// The session owns a current-thread tokio runtime and blocks on it for every
/// command, so it must not be used from inside another async runtime.
pub struct WebDriverSession {
    client: Client,
    runtime: Runtime,
}

impl std::fmt::Debug for WebDriverSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebDriverSession").finish_non_exhaustive()
    }
}

fn build_runtime() -> Result<Runtime, DriverError> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| DriverError::Session(format!("Failed to build tokio runtime: {}", e)))
}

fn map_cmd_error(err: CmdError, selector: Option<&str>) -> DriverError {
    match (err, selector) {
        (CmdError::NoSuchElement(_), Some(selector)) => DriverError::ElementNotFound {
            selector: selector.to_string(),
        },
        (CmdError::WaitTimeout, Some(selector)) => DriverError::Timeout {
            selector: selector.to_string(),
        },
        (err, _) => DriverError::Command(err.to_string()),
    }
}

// The scroll script answers false when the window offset is not a finite number afterwards
fn check_scroll_result(value: &Value, x: u32, y: u32) -> Result<(), DriverError> {
    match value {
        Value::Bool(true) => Ok(()),
        _ => Err(DriverError::InvalidScrollTarget {
            x: i64::from(x),
            y: i64::from(y),
        }),
    }
}

fn as_pixels(value: &Value, what: &str) -> Result<u32, DriverError> {
    value
        .as_f64()
        .map(|v| v.max(0.0).round() as u32)
        .ok_or_else(|| DriverError::Command(format!("Expected a number for {}, got {}", what, value)))
}

fn as_pixel_pair(value: &Value, what: &str) -> Result<(u32, u32), DriverError> {
    match value.as_array().map(Vec::as_slice) {
        Some([first, second]) => Ok((as_pixels(first, what)?, as_pixels(second, what)?)),
        _ => Err(DriverError::Command(format!("Expected a pair for {}, got {}", what, value))),
    }
}

impl WebDriverSession {
    /// Wraps an existing WebDriver client
    pub fn from_client(client: Client) -> Result<Self, DriverError> {
        Ok(Self {
            client,
            runtime: build_runtime()?,
        })
    }

    /// Opens a new Chrome session against the given WebDriver server
    pub fn connect(
        webdriver_url: Option<&str>,
        viewport_size: Option<(u32, u32)>,
        headless: bool,
    ) -> Result<Self, DriverError> {
        let webdriver_url = webdriver_url.unwrap_or(config::DEFAULT_WEBDRIVER_URL);
        let viewport = viewport_size.unwrap_or(config::DEFAULT_VIEWPORT);
        let runtime = build_runtime()?;

        let mut caps = serde_json::map::Map::new();
        let mut chrome_opts = serde_json::map::Map::new();
        debug!("Configuring Chrome options with headless={}", headless);
        let args = config::chrome_arguments(headless, viewport);
        trace!("Setting Chrome arguments: {:?}", args);
        chrome_opts.insert(
            "args".to_string(),
            Value::Array(args.into_iter().map(Value::String).collect()),
        );
        chrome_opts.insert("prefs".to_string(), Value::Object(config::chrome_preferences()));
        caps.insert("goog:chromeOptions".to_string(), Value::Object(chrome_opts));

        debug!("Connecting to WebDriver at {}", webdriver_url);
        let client = runtime.block_on(async {
            let mut builder = ClientBuilder::native();
            let connect = builder.capabilities(caps).connect(webdriver_url);
            match tokio::time::timeout(CONNECTION_TIMEOUT, connect).await {
                Ok(Ok(client)) => Ok(client),
                Ok(Err(e)) => {
                    error!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
                    Err(DriverError::Session(format!(
                        "Failed to connect to WebDriver at {}: {}",
                        webdriver_url, e
                    )))
                }
                Err(_) => Err(DriverError::Session(format!(
                    "Timed out connecting to WebDriver at {}",
                    webdriver_url
                ))),
            }
        })?;

        if let Err(e) = runtime.block_on(client.set_window_size(viewport.0, viewport.1)) {
            // Not fatal, the window-size argument already applies
            warn!("Failed to set window size to {}x{}: {}", viewport.0, viewport.1, e);
        }

        trace!("Successfully created WebDriver session");
        Ok(Self { client, runtime })
    }

    /// Navigates the session to `url`
    pub fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        debug!("Navigating to URL: {}", url);
        self.runtime
            .block_on(self.client.goto(url))
            .map_err(|e| map_cmd_error(e, None))
    }

    /// Ends the WebDriver session
    pub fn close(self) -> Result<(), DriverError> {
        self.runtime
            .block_on(self.client.close())
            .map_err(|e| map_cmd_error(e, None))
    }

    fn execute(&mut self, script: &str, args: Vec<Value>, selector: Option<&str>) -> Result<Value, DriverError> {
        trace!("Executing script: {}", script);
        self.runtime
            .block_on(self.client.execute(script, args))
            .map_err(|e| map_cmd_error(e, selector))
    }

    fn execute_on_element(&mut self, script: &str, selector: &str, mut extra: Vec<Value>) -> Result<Value, DriverError> {
        let mut args = vec![json!(selector)];
        args.append(&mut extra);
        match self.execute(script, args, Some(selector))? {
            Value::Null => Err(DriverError::ElementNotFound {
                selector: selector.to_string(),
            }),
            value => Ok(value),
        }
    }
}

impl BrowserDriver for WebDriverSession {
    fn scroll_to_position(&mut self, x: u32, y: u32) -> Result<(), DriverError> {
        debug!("Scrolling window to ({}, {})", x, y);
        let value = self.execute(SCROLL_TO_SCRIPT, vec![json!(x), json!(y)], None)?;
        check_scroll_result(&value, x, y)
    }

    fn scroll_to_bottom(&mut self) -> Result<(), DriverError> {
        debug!("Scrolling window to the bottom of the page");
        self.execute(SCROLL_TO_BOTTOM_SCRIPT, Vec::new(), None)?;
        Ok(())
    }

    fn viewport_size(&mut self) -> Result<(u32, u32), DriverError> {
        let value = self.execute(VIEWPORT_SCRIPT, Vec::new(), None)?;
        as_pixel_pair(&value, "viewport size")
    }

    fn scroll_offset(&mut self) -> Result<(u32, u32), DriverError> {
        let value = self.execute(SCROLL_OFFSET_SCRIPT, Vec::new(), None)?;
        as_pixel_pair(&value, "scroll offset")
    }

    fn scroll_element_to_start(&mut self, selector: &str, axis: ScrollAxis) -> Result<(), DriverError> {
        debug!("Scrolling element '{}' to its start ({})", selector, axis);
        let horizontal = axis == ScrollAxis::Horizontal;
        self.execute_on_element(ELEMENT_SCROLL_START_SCRIPT, selector, vec![json!(horizontal)])?;
        Ok(())
    }

    fn scroll_element_by(&mut self, selector: &str, axis: ScrollAxis, amount: u32) -> Result<(), DriverError> {
        debug!("Scrolling element '{}' by {}px ({})", selector, amount, axis);
        let horizontal = axis == ScrollAxis::Horizontal;
        self.execute_on_element(
            ELEMENT_SCROLL_BY_SCRIPT,
            selector,
            vec![json!(horizontal), json!(amount)],
        )?;
        Ok(())
    }

    fn element_scroll_offset(&mut self, selector: &str, axis: ScrollAxis) -> Result<u32, DriverError> {
        let horizontal = axis == ScrollAxis::Horizontal;
        let value = self.execute_on_element(ELEMENT_SCROLL_OFFSET_SCRIPT, selector, vec![json!(horizontal)])?;
        as_pixels(&value, "element scroll offset")
    }

    fn element_size(&mut self, selector: &str) -> Result<(u32, u32), DriverError> {
        let value = self.execute_on_element(ELEMENT_SIZE_SCRIPT, selector, Vec::new())?;
        as_pixel_pair(&value, "element size")
    }

    fn is_element_scroll_at_end(&mut self, selector: &str, axis: ScrollAxis) -> Result<bool, DriverError> {
        let horizontal = axis == ScrollAxis::Horizontal;
        let value = self.execute_on_element(ELEMENT_AT_END_SCRIPT, selector, vec![json!(horizontal)])?;
        value
            .as_bool()
            .ok_or_else(|| DriverError::Command(format!("Expected a boolean scroll state, got {}", value)))
    }

    fn capture_screenshot(&mut self) -> Result<Vec<u8>, DriverError> {
        debug!("Capturing screenshot");
        let data = self
            .runtime
            .block_on(self.client.screenshot())
            .map_err(|e| map_cmd_error(e, None))?;
        trace!("Screenshot captured successfully, {} bytes", data.len());
        Ok(data)
    }

    fn hide_element(&mut self, selector: &str) -> Result<(), DriverError> {
        match self.execute_on_element(HIDE_ELEMENT_SCRIPT, selector, Vec::new())? {
            Value::String(state) if state == "hidden" => Err(DriverError::ElementNotVisible {
                selector: selector.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn show_element(&mut self, selector: &str) -> Result<(), DriverError> {
        self.execute_on_element(SHOW_ELEMENT_SCRIPT, selector, Vec::new())?;
        Ok(())
    }
}

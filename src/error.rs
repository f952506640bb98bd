use std::backtrace::{Backtrace, BacktraceStatus};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::driver::DriverError;

/// Structured context attached to capture and compare failures
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorDetails(BTreeMap<String, String>);

impl ErrorDetails {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }

    pub fn insert(&mut self, key: &str, value: impl ToString) {
        self.0.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Merges `other` into self; keys already present are kept
    fn merge(mut self, other: ErrorDetails) -> Self {
        for (key, value) in other.0 {
            self.0.entry(key).or_insert(value);
        }
        self
    }
}

impl fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        Ok(())
    }
}

/// Returns the current stacktrace when backtraces are enabled (RUST_BACKTRACE)
fn capture_stacktrace() -> Option<String> {
    let backtrace = Backtrace::capture();
    match backtrace.status() {
        BacktraceStatus::Captured => Some(backtrace.to_string()),
        _ => None,
    }
}

/// Failures raised while acquiring page images
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The browser driver reported a problem (missing element, timeout, bad scroll target)
    #[error("{message} | {source}")]
    SeleniumIssue {
        message: String,
        #[source]
        source: DriverError,
        details: ErrorDetails,
        stacktrace: Option<String>,
    },

    /// Anything else that went wrong while decoding, cropping or stitching images
    #[error("{message}")]
    CaptureFailure {
        message: String,
        details: ErrorDetails,
        stacktrace: Option<String>,
    },
}

impl CaptureError {
    pub fn selenium(message: &str, source: DriverError, details: ErrorDetails) -> Self {
        let details = details.merge(source.details());
        CaptureError::SeleniumIssue {
            message: message.to_string(),
            source,
            details,
            stacktrace: capture_stacktrace(),
        }
    }

    pub fn failure(message: impl Into<String>, details: ErrorDetails) -> Self {
        CaptureError::CaptureFailure {
            message: message.into(),
            details,
            stacktrace: capture_stacktrace(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            CaptureError::SeleniumIssue { message, .. } => message,
            CaptureError::CaptureFailure { message, .. } => message,
        }
    }

    pub fn details(&self) -> &ErrorDetails {
        match self {
            CaptureError::SeleniumIssue { details, .. } => details,
            CaptureError::CaptureFailure { details, .. } => details,
        }
    }

    pub fn stacktrace(&self) -> Option<&str> {
        match self {
            CaptureError::SeleniumIssue { stacktrace, .. } => stacktrace.as_deref(),
            CaptureError::CaptureFailure { stacktrace, .. } => stacktrace.as_deref(),
        }
    }

    pub fn is_driver_issue(&self) -> bool {
        matches!(self, CaptureError::SeleniumIssue { .. })
    }

    /// Adds context to an error on its way up without discarding what is already there
    pub(crate) fn with_details(self, extra: ErrorDetails) -> Self {
        match self {
            CaptureError::SeleniumIssue { message, source, details, stacktrace } => {
                CaptureError::SeleniumIssue { message, source, details: details.merge(extra), stacktrace }
            }
            CaptureError::CaptureFailure { message, details, stacktrace } => {
                CaptureError::CaptureFailure { message, details: details.merge(extra), stacktrace }
            }
        }
    }
}

/// Failures raised by the image comparison routines
#[derive(Debug, Error)]
pub enum CompareError {
    #[error("Error gathering the data for the images: {message}")]
    DataGatherFailure {
        message: String,
        details: ErrorDetails,
        stacktrace: Option<String>,
    },

    #[error("Could not merge the compare overlay onto the image: {message}")]
    ComposeFailure {
        message: String,
        details: ErrorDetails,
        stacktrace: Option<String>,
    },
}

impl CompareError {
    pub fn data_gather(message: impl Into<String>, details: ErrorDetails) -> Self {
        CompareError::DataGatherFailure {
            message: message.into(),
            details,
            stacktrace: capture_stacktrace(),
        }
    }

    pub fn compose(message: impl Into<String>, details: ErrorDetails) -> Self {
        CompareError::ComposeFailure {
            message: message.into(),
            details,
            stacktrace: capture_stacktrace(),
        }
    }

    pub fn details(&self) -> &ErrorDetails {
        match self {
            CompareError::DataGatherFailure { details, .. } => details,
            CompareError::ComposeFailure { details, .. } => details,
        }
    }

    pub fn stacktrace(&self) -> Option<&str> {
        match self {
            CompareError::DataGatherFailure { stacktrace, .. } => stacktrace.as_deref(),
            CompareError::ComposeFailure { stacktrace, .. } => stacktrace.as_deref(),
        }
    }
}

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use std::path::Path;
use tracing::debug;

use crate::capture::CaptureConfiguration;

/// Prefix of environment overrides, e.g. `ARK_SCROLL_PADDING=60`
pub const ENV_PREFIX: &str = "ARK";

/// Loads a capture configuration from defaults, an optional file and `ARK_*`
/// environment variables, later sources taking precedence.
///
/// Selector lists may be given in the environment as comma separated values.
pub fn load_capture_configuration(path: Option<&Path>) -> Result<CaptureConfiguration> {
    load_with_prefix(path, ENV_PREFIX)
}

fn load_with_prefix(path: Option<&Path>, prefix: &str) -> Result<CaptureConfiguration> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        debug!("Reading capture configuration from {}", path.display());
        builder = builder.add_source(File::from(path));
    }

    let settings = builder
        .add_source(
            Environment::with_prefix(prefix)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("header_selectors")
                .with_list_parse_key("footer_selectors"),
        )
        .build()
        .context("Failed to read capture configuration")?;

    let configuration: CaptureConfiguration = settings
        .try_deserialize()
        .context("Invalid capture configuration")?;
    configuration.validate().context("Invalid capture configuration")?;

    debug!("Loaded capture configuration: {:?}", configuration);
    Ok(configuration)
}

//! Configuration loading for the `mediabridge` binary.

use anyhow::{Context, Result};
use mb_core::config::Config;
use std::path::Path;

/// File picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "mediabridge.toml";

/// Load and parse a config file. Validation warnings are logged, not fatal.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config = Config::from_toml(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    for warning in config.validate() {
        tracing::warn!("{}", warning);
    }

    Ok(config)
}

/// Load config from `custom_path`, else `./mediabridge.toml`, else defaults.
///
/// An explicitly named file must exist and parse.
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let local = Path::new(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return load_config(local);
    }

    Ok(Config::default())
}

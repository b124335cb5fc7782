// src/config/io.rs
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::types::PrankConfig;
use crate::error::PrankError;

pub const DEFAULT_PATH: &str = "prank.toml";

/// Reads `path`, falling back to defaults when the file does not exist.
///
/// # Errors
/// Returns error if the file exists but can't be read or parsed.
pub fn load_from_file(path: &Path) -> Result<PrankConfig> {
    if !path.exists() {
        return Ok(PrankConfig::default());
    }
    let content = fs::read_to_string(path).map_err(|source| PrankError::Io {
        source,
        path: path.to_path_buf(),
    })?;
    parse_toml(&content).with_context(|| format!("Invalid TOML in {}", path.display()))
}

/// Parses `prank.toml` content.
///
/// # Errors
/// Returns error on malformed TOML or mistyped fields.
pub fn parse_toml(content: &str) -> crate::error::Result<PrankConfig> {
    Ok(toml::from_str(content)?)
}

/// Writes the configuration to `path`.
///
/// # Errors
/// Returns error if serialization or the write fails.
pub fn save_to_file(config: &PrankConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

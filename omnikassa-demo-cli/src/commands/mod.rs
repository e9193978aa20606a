//! CLI command implementations

use anyhow::{Context, Result};
use omnikassa_lib::OmnikassaConfig;
use std::path::Path;

pub mod announce;
pub mod canonical;
pub mod sign;
pub mod status_pull;
pub mod verify_notification;

/// Load configuration from `path`, or from the environment when absent.
pub fn load_config(path: Option<&Path>) -> Result<OmnikassaConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            OmnikassaConfig::from_json(&raw)
                .with_context(|| format!("Invalid config file {}", path.display()))
        }
        None => OmnikassaConfig::from_env()
            .context("No --config given and OMNIKASSA_* environment incomplete"),
    }
}

/// Read a file into a string with a readable error.
pub fn read_payload(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

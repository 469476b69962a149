pub mod config;
pub mod info;
pub mod render;

use std::path::Path;

use anyhow::{Context, Result};
use slideview_core::config::ViewerConfig;

/// Load the config file when one is given, defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<ViewerConfig> {
    match path {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(ViewerConfig::default()),
    }
}

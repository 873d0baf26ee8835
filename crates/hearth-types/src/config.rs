//! Launcher configuration loaded from `hearth.toml`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::app::DEFAULT_ICON_SIZE;
use crate::error::{HearthError, Result};
use crate::page::MAX_PAGE_COUNT;

/// Layout snapshots a single page may hold.
pub const MAX_LAYOUTS_PER_PAGE: usize = 5;

/// Top-level configuration. Every field has a default so an empty file is valid.
#[derive(Debug, Clone, Deserialize)]
pub struct HearthConfig {
    /// Directory holding one JSON file per store namespace.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Highest page index the pager accepts, so the pager holds one more
    /// page than this.
    #[serde(default = "default_max_page_index")]
    pub max_page_index: usize,
    #[serde(default = "default_max_layouts")]
    pub max_layouts_per_page: usize,
    #[serde(default = "default_icon_size")]
    pub default_icon_size: f32,
    /// Initial value of the global "new apps visible" flag on first run.
    #[serde(default = "yes")]
    pub new_apps_visible_by_default: bool,
    /// Hand durable writes to a background thread instead of writing inline.
    #[serde(default = "yes")]
    pub background_writes: bool,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("hearth-data")
}
fn default_max_page_index() -> usize {
    MAX_PAGE_COUNT
}
fn default_max_layouts() -> usize {
    MAX_LAYOUTS_PER_PAGE
}
fn default_icon_size() -> f32 {
    DEFAULT_ICON_SIZE
}
fn yes() -> bool {
    true
}

impl Default for HearthConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            max_page_index: default_max_page_index(),
            max_layouts_per_page: default_max_layouts(),
            default_icon_size: default_icon_size(),
            new_apps_visible_by_default: true,
            background_writes: true,
        }
    }
}

impl HearthConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            },
            Err(e) => Err(e.into()),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.max_layouts_per_page == 0 {
            return Err(HearthError::Config(
                "max_layouts_per_page must be at least 1".to_string(),
            ));
        }
        if !(self.default_icon_size.is_finite() && self.default_icon_size > 0.0) {
            return Err(HearthError::Config(format!(
                "default_icon_size must be positive, got {}",
                self.default_icon_size
            )));
        }
        Ok(())
    }
}

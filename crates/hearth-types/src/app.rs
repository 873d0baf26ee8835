//! App records exchanged between the app enumerator and the page managers.

use serde::{Deserialize, Serialize};

/// Icon size used when none was recorded.
pub const DEFAULT_ICON_SIZE: f32 = 64.0;

/// An installed app as reported by the app enumerator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppInfo {
    pub package_name: String,
    pub label: String,
}

impl AppInfo {
    pub fn new(package_name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            label: label.into(),
        }
    }
}

/// Free-form placement of one icon on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppPosition {
    /// Unique within a page.
    pub package_name: String,
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_icon_size")]
    pub icon_size: f32,
}

fn default_icon_size() -> f32 {
    DEFAULT_ICON_SIZE
}

impl AppPosition {
    /// Position with the default icon size.
    pub fn new(package_name: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            package_name: package_name.into(),
            x,
            y,
            icon_size: DEFAULT_ICON_SIZE,
        }
    }

    pub fn with_icon_size(mut self, icon_size: f32) -> Self {
        self.icon_size = icon_size;
        self
    }
}

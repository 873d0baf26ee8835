//! App folders placed on free-form pages.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hearth_types::app::DEFAULT_ICON_SIZE;

/// A named group of apps shown as a single icon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppFolder {
    pub id: Uuid,
    pub name: String,
    /// Display order; never holds duplicates.
    pub apps: Vec<String>,
    pub x: f32,
    pub y: f32,
    pub icon_size: f32,
}

impl AppFolder {
    /// New folder with a fresh id. Duplicate packages keep their first slot.
    pub fn new<I, S>(name: impl Into<String>, apps: I, x: f32, y: f32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut folder = Self {
            id: Uuid::new_v4(),
            name: name.into(),
            apps: Vec::new(),
            x,
            y,
            icon_size: DEFAULT_ICON_SIZE,
        };
        for app in apps {
            folder.add_app(app);
        }
        folder
    }

    pub fn contains(&self, package_name: &str) -> bool {
        self.apps.iter().any(|a| a == package_name)
    }

    /// Append `package_name`. Returns `false` if it was already present.
    pub fn add_app(&mut self, package_name: impl Into<String>) -> bool {
        let package_name = package_name.into();
        if package_name.is_empty() || self.contains(&package_name) {
            return false;
        }
        self.apps.push(package_name);
        true
    }

    /// Remove `package_name`. Returns `false` if it was not present.
    pub fn remove_app(&mut self, package_name: &str) -> bool {
        let before = self.apps.len();
        self.apps.retain(|a| a != package_name);
        self.apps.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

//! Page kinds shown in the launcher pager.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HearthError;

/// Highest page index the pager accepts. At most `MAX_PAGE_COUNT + 1` pages exist.
pub const MAX_PAGE_COUNT: usize = 2;

/// What a pager page shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    /// App grid (or free-form icons) only.
    #[default]
    AppsOnly,
    /// Apps combined with hosted widgets.
    AppsAndWidgets,
}

impl PageType {
    /// Stable identifier written to the store.
    pub fn as_key(self) -> &'static str {
        match self {
            Self::AppsOnly => "apps_only",
            Self::AppsAndWidgets => "apps_and_widgets",
        }
    }

    /// Parse a stored identifier. Unknown values yield `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "apps_only" => Some(Self::AppsOnly),
            "apps_and_widgets" => Some(Self::AppsAndWidgets),
            _ => None,
        }
    }

    /// Whether the page owns a widget-page record.
    ///
    /// Both kinds host a widget page; an `AppsOnly` page simply starts with
    /// no widgets placed on it.
    pub fn hosts_widgets(self) -> bool {
        match self {
            Self::AppsOnly | Self::AppsAndWidgets => true,
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

/// Accepts the stored key or a short alias (`apps`, `widgets`).
impl FromStr for PageType {
    type Err = HearthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "apps" | "a" => Ok(Self::AppsOnly),
            "widgets" | "w" => Ok(Self::AppsAndWidgets),
            other => Self::from_key(other)
                .ok_or_else(|| HearthError::Command(format!("unknown page type: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_roundtrip() {
        for t in [PageType::AppsOnly, PageType::AppsAndWidgets] {
            assert_eq!(PageType::from_key(t.as_key()), Some(t));
        }
    }

    #[test]
    fn unknown_key_is_none() {
        assert_eq!(PageType::from_key("widgets_only"), None);
        assert_eq!(PageType::from_key(""), None);
    }

    #[test]
    fn both_kinds_host_widgets() {
        assert!(PageType::AppsOnly.hosts_widgets());
        assert!(PageType::AppsAndWidgets.hosts_widgets());
    }

    #[test]
    fn default_is_apps_only() {
        assert_eq!(PageType::default(), PageType::AppsOnly);
    }

    #[test]
    fn display_uses_key() {
        assert_eq!(PageType::AppsAndWidgets.to_string(), "apps_and_widgets");
    }

    #[test]
    fn parse_aliases() {
        assert_eq!("apps".parse::<PageType>().unwrap(), PageType::AppsOnly);
        assert_eq!(" Widgets ".parse::<PageType>().unwrap(), PageType::AppsAndWidgets);
        assert_eq!(
            "apps_and_widgets".parse::<PageType>().unwrap(),
            PageType::AppsAndWidgets
        );
        assert!("grid".parse::<PageType>().is_err());
    }
}

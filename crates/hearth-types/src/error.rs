//! Error types for Hearth.

use std::io;

/// Errors produced by the Hearth framework.
#[derive(Debug, thiserror::Error)]
pub enum HearthError {
    #[error("store error: {0}")]
    Store(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("command error: {0}")]
    Command(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, HearthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display() {
        let e = HearthError::Store("namespace closed".into());
        assert_eq!(format!("{e}"), "store error: namespace closed");
    }

    #[test]
    fn config_error_display() {
        let e = HearthError::Config("max_layouts_per_page must be at least 1".into());
        assert_eq!(format!("{e}"), "config error: max_layouts_per_page must be at least 1");
    }

    #[test]
    fn command_error_display() {
        let e = HearthError::Command("usage: home <page>".into());
        assert_eq!(format!("{e}"), "command error: usage: home <page>");
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let e: HearthError = io_err.into();
        let msg = format!("{e}");
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn toml_error_from_conversion() {
        let toml_err = toml::from_str::<toml::Value>("this is [[[not valid toml").unwrap_err();
        let e: HearthError = toml_err.into();
        assert!(format!("{e}").contains("TOML parse error"));
    }

    #[test]
    fn json_error_from_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let e: HearthError = json_err.into();
        assert!(format!("{e}").contains("JSON error"));
    }

    #[test]
    fn result_alias_err() {
        let r: Result<i32> = Err(HearthError::Store("oops".into()));
        assert!(r.is_err());
    }
}

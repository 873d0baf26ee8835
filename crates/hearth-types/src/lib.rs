//! Foundation types for the Hearth launcher.
//!
//! This crate contains the platform-agnostic types shared by every Hearth
//! crate: page kinds, app records, navigation directions, configuration, and
//! error types.

pub mod app;
pub mod config;
pub mod error;
pub mod input;
pub mod page;

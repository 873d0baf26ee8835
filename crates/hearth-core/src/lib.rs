//! Hearth page model.
//!
//! Maintains the ordered list of launcher pages and the per-page state that
//! hangs off it (icon positions and folders, hidden apps, saved layouts,
//! widget-page apps), keeps that state consistent when pages are inserted,
//! removed or moved, and persists it through the flat-string codec. Also
//! provides directional focus navigation between free-form icons.

// Re-exports from hearth-types and hearth-store.
pub use hearth_store as store;
pub use hearth_types::app;
pub use hearth_types::config;
pub use hearth_types::error;
pub use hearth_types::input;
pub use hearth_types::page;

pub mod codec;
pub mod folders;
pub mod index;
pub mod layouts;
pub mod model;
pub mod navigator;
pub mod observe;
pub mod pages;
pub mod positions;
pub mod reindex;
pub mod visibility;
pub mod widget_apps;

pub use model::PageModel;

#![allow(clippy::collapsible_if)]
#![allow(clippy::collapsible_else_if)]

pub mod action;
pub mod components;
pub mod config;
pub mod dialog;
pub mod filter;
pub mod logging;
pub mod query;
pub mod resources;
pub mod tui;

// Re-export commonly used types
pub use action::Action;
pub use components::{Component, Dashboard, DashboardView};
pub use config::{Config, Mode};
pub use filter::{AnalysisFilters, FilterState, UserFilterStore};
pub use resources::WorkspaceSnapshot;

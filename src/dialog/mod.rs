//! Popup dialogs layered over the dashboard.
pub mod filter_popover;
pub mod users_filter_popover;

pub use filter_popover::{FilterDriver, FilterPopover};
pub use users_filter_popover::UsersFilterPopover;

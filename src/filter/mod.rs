//! Filter-builder state machines backing the "Add Filter" popovers.
pub mod analysis;
pub mod state;
pub mod user_events;
pub mod users;

pub use analysis::{AnalysisChartFilters, AnalysisFilterKey, AnalysisFilters};
pub use state::{
    Filter, FilterCommand, FilterKey, FilterState, ItemCommand, KeyOptions, SelectionMap, Stage,
};
pub use user_events::{UserEventsFilterKey, UserEventsFilterState};
pub use users::{UserFilterStage, UserFilterState, UserFilterStore};

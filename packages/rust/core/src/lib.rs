//! Aggregation and filtering engine for ExpertDesk.
//!
//! Data flows one way: the fetcher's raw snapshot is joined by [`aggregate`]
//! into expert views, held by [`state::ExpertsState`], and narrowed by
//! [`filter`] for display.

pub mod aggregate;
pub mod filter;
pub mod listing;
pub mod state;

pub use aggregate::{aggregate, aggregate_snapshot, is_former, sort_career};
pub use filter::{CriteriaPatch, EmploymentType, Facet, FilterCriteria, filter};
pub use listing::{Facets, Page, facets, paginate};
pub use state::{ExpertsState, LogNotifier, Notifier, SnapshotSource};

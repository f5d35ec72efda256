//! Filtered-list and report query building: filter expressions from query
//! parameters, sort resolution, paginated execution and score aggregation.

pub mod builder;
pub mod error;
pub mod lists;
pub mod pagination;
pub mod params;
pub mod report;
pub mod sort;

pub use builder::{FilterBuilder, ListSpec, StatusFilter, SCOPE_MEMBERS, SCOPE_NONE, SCOPE_USERS};
pub use error::QueryError;
pub use pagination::{paginate, Page, PageWindow};
pub use params::ListParams;
pub use report::{aggregate_scores, CategoryTotal, ScoreReport, ScoredAnswer};
pub use sort::resolve_sort;

#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Pure state transitions for review front ends.
//!
//! Nothing here performs I/O or reads a clock; callers pass instants in so the
//! same helpers drive the CLI, a TUI, or a browser build.

pub mod debounce;
pub mod filters;
pub mod health;
pub mod pagination;
pub mod reviews;
pub mod search;
pub mod selection;

pub use debounce::SearchDebouncer;
pub use filters::{FilterError, ReplyStatusFilter, ReviewFilters, ReviewQueryKey, StarRating};
pub use health::{HealthGrade, health_grade, reply_rate};
pub use pagination::{clamp_page, has_next, has_prev, item_range, page_window, total_pages};
pub use reviews::{
    ReviewsState, apply_bulk_report, bulk_request, mark_replied, select_visible_rows, set_rows,
};
pub use search::{filter_rows, matches_search};
pub use selection::{
    SelectionSet, eligible_ids, initial_selection, select_all_or_clear, toggle_selection,
};

#[cfg(test)]
mod fixtures;

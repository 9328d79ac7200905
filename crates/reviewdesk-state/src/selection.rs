//! Bulk selection helpers.
//!
//! The selection is derived whenever the bulk view opens and never persisted.

use std::collections::BTreeSet;

use reviewdesk_api_models::{Review, ReviewStatus};

/// Review ids chosen for a bulk action.
pub type SelectionSet = BTreeSet<String>;

/// Ids of reviews that may take part in a bulk reply, in list order.
#[must_use]
pub fn eligible_ids(rows: &[Review]) -> Vec<String> {
    rows.iter()
        .filter(|review| review.status == ReviewStatus::New && !review.is_deleted)
        .map(|review| review.id.clone())
        .collect()
}

/// Selection used when the bulk view opens: every eligible review.
#[must_use]
pub fn initial_selection(rows: &[Review]) -> SelectionSet {
    eligible_ids(rows).into_iter().collect()
}

/// Toggle the presence of an id in the selection set.
#[must_use]
pub fn toggle_selection(selected: &SelectionSet, id: &str) -> SelectionSet {
    let mut next = selected.clone();
    if !next.remove(id) {
        next.insert(id.to_string());
    }
    next
}

/// Select every eligible review, or clear when all of them are already selected.
#[must_use]
pub fn select_all_or_clear(selected: &SelectionSet, rows: &[Review]) -> SelectionSet {
    let eligible = eligible_ids(rows);
    let all_selected = !selected.is_empty() && eligible.iter().all(|id| selected.contains(id));
    if all_selected {
        SelectionSet::new()
    } else {
        eligible.into_iter().collect()
    }
}

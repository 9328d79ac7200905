//! Review list state and its transitions.

use std::collections::HashMap;
use std::rc::Rc;

use reviewdesk_api_models::{Review, ReviewReply, ReviewStatus};
use reviewdesk_core::{BulkReplyReport, BulkReplyRequest, ReplyBody, ReviewId};
use tracing::warn;

use crate::filters::ReviewFilters;
use crate::selection::SelectionSet;

/// Current review list slice held by a front end.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ReviewsState {
    /// Review rows by id.
    pub by_id: HashMap<String, Rc<Review>>,
    /// Ordered list of visible review ids.
    pub visible_ids: Vec<String>,
    /// Multi-select set for bulk replies.
    pub selected: SelectionSet,
    /// Active filters driving the list query.
    pub filters: ReviewFilters,
}

/// Replace list rows with a new page; selection is pruned to rows still present.
pub fn set_rows(state: &mut ReviewsState, rows: Vec<Review>) {
    state.visible_ids = rows.iter().map(|row| row.id.clone()).collect();
    state.by_id = rows
        .into_iter()
        .map(|row| (row.id.clone(), Rc::new(row)))
        .collect();
    state.selected.retain(|id| state.by_id.contains_key(id));
}

/// Read the visible rows in list order.
#[must_use]
pub fn select_visible_rows(state: &ReviewsState) -> Vec<Review> {
    state
        .visible_ids
        .iter()
        .filter_map(|id| state.by_id.get(id).map(|row| (**row).clone()))
        .collect()
}

/// Record a successful reply on a row and drop it from the selection.
pub fn mark_replied(state: &mut ReviewsState, id: &str, body: &ReplyBody) {
    state.selected.remove(id);
    let Some(current) = state.by_id.get(id) else {
        return;
    };
    let mut next = (**current).clone();
    next.status = ReviewStatus::Replied;
    next.reply = Some(ReviewReply {
        comment: body.text().to_string(),
        is_public: body.is_public(),
        update_time: None,
    });
    state.by_id.insert(id.to_string(), Rc::new(next));
}

/// Build a bulk request from the selection, in visible order.
///
/// Returns `None` when nothing visible is selected.
#[must_use]
pub fn bulk_request(state: &ReviewsState, body: ReplyBody) -> Option<BulkReplyRequest> {
    let ids: Vec<ReviewId> = state
        .visible_ids
        .iter()
        .filter(|id| state.selected.contains(*id))
        .filter_map(|id| match ReviewId::new(id.as_str()) {
            Ok(review_id) => Some(review_id),
            Err(err) => {
                warn!(review_id = %id, error = %err, "skipping selected review with invalid id");
                None
            }
        })
        .collect();
    if ids.is_empty() {
        None
    } else {
        Some(BulkReplyRequest::new(ids, body))
    }
}

/// Mark every review the backend accepted as replied; failures stay selected.
pub fn apply_bulk_report(state: &mut ReviewsState, body: &ReplyBody, report: &BulkReplyReport) {
    for review_id in &report.replied {
        mark_replied(state, review_id.as_str(), body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::review;
    use crate::selection::initial_selection;
    use reviewdesk_core::{ApiError, BulkReplyFailure};

    fn loaded() -> ReviewsState {
        let mut state = ReviewsState::default();
        set_rows(
            &mut state,
            vec![
                review("a", ReviewStatus::New),
                review("b", ReviewStatus::Replied),
                review("c", ReviewStatus::New),
            ],
        );
        state.selected = initial_selection(&select_visible_rows(&state));
        state
    }

    fn body() -> ReplyBody {
        ReplyBody::new("Thanks for stopping by", true).expect("valid body")
    }

    #[test]
    fn set_rows_prunes_missing_selection() {
        let mut state = loaded();
        set_rows(&mut state, vec![review("c", ReviewStatus::New)]);
        assert_eq!(state.visible_ids, vec!["c".to_string()]);
        assert_eq!(state.selected, SelectionSet::from(["c".to_string()]));
    }

    #[test]
    fn bulk_request_follows_visible_order() {
        let state = loaded();
        let request = bulk_request(&state, body()).expect("selection present");
        let ids: Vec<&str> = request.review_ids().iter().map(ReviewId::as_str).collect();
        assert_eq!(ids, vec!["a", "c"]);

        let empty = ReviewsState::default();
        assert!(bulk_request(&empty, body()).is_none());
    }

    #[test]
    fn bulk_request_skips_invalid_ids() {
        let mut state = ReviewsState::default();
        set_rows(
            &mut state,
            vec![
                review("a", ReviewStatus::New),
                review("   ", ReviewStatus::New),
            ],
        );
        state.selected = SelectionSet::from(["a".to_string(), "   ".to_string()]);
        let request = bulk_request(&state, body()).expect("one valid id");
        let ids: Vec<&str> = request.review_ids().iter().map(ReviewId::as_str).collect();
        assert_eq!(ids, vec!["a"]);

        state.selected = SelectionSet::from(["   ".to_string()]);
        assert!(bulk_request(&state, body()).is_none());
    }

    #[test]
    fn mark_replied_updates_row_and_selection() {
        let mut state = loaded();
        mark_replied(&mut state, "a", &body());
        let row = state.by_id.get("a").expect("row a");
        assert_eq!(row.status, ReviewStatus::Replied);
        assert_eq!(
            row.reply.as_ref().map(|reply| reply.comment.as_str()),
            Some("Thanks for stopping by")
        );
        assert!(!state.selected.contains("a"));

        mark_replied(&mut state, "missing", &body());
        assert_eq!(state.by_id.len(), 3);
    }

    #[test]
    fn bulk_report_keeps_failures_selected() {
        let mut state = loaded();
        let report = BulkReplyReport {
            total: 2,
            completed: 2,
            succeeded: 1,
            failed: 1,
            replied: vec![ReviewId::new("a").expect("id")],
            failures: vec![BulkReplyFailure {
                review_id: ReviewId::new("c").expect("id"),
                error: ApiError::new("boom", 500),
            }],
            ..BulkReplyReport::default()
        };

        apply_bulk_report(&mut state, &body(), &report);

        assert_eq!(state.selected, SelectionSet::from(["c".to_string()]));
        assert_eq!(
            state.by_id.get("c").map(|row| row.status),
            Some(ReviewStatus::New)
        );
    }
}

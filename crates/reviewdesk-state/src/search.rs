//! Client-side search over fetched reviews.

use reviewdesk_api_models::Review;

/// Case-insensitive match over reviewer name and comment; blank terms match all.
#[must_use]
pub fn matches_search(review: &Review, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    review.reviewer_name.to_lowercase().contains(&needle)
        || review
            .comment
            .as_deref()
            .is_some_and(|comment| comment.to_lowercase().contains(&needle))
}

/// Rows matching `term`, order preserved.
#[must_use]
pub fn filter_rows<'a>(rows: &'a [Review], term: &str) -> Vec<&'a Review> {
    rows.iter()
        .filter(|review| matches_search(review, term))
        .collect()
}

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
//! Shared HTTP DTOs for the review management API.
//!
//! The backend owns these shapes; the client crates re-use them for request
//! and response encoding so the wire contract lives in exactly one place.
//! Response bodies use camelCase keys while list query parameters use
//! `snake_case`, matching what the backend accepts.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status attached to a review by the backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// Review has not been handled yet.
    New,
    /// A business reply has been posted.
    Replied,
    /// Review was hidden from the public listing.
    Hidden,
    /// Review was flagged for moderation.
    Flagged,
}

impl ReviewStatus {
    /// Stable lowercase label used in tables and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Replied => "replied",
            Self::Hidden => "hidden",
            Self::Flagged => "flagged",
        }
    }
}

/// Business reply attached to a review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewReply {
    /// Reply text as published.
    pub comment: String,
    /// Whether the reply is visible to the public.
    #[serde(default = "default_true")]
    pub is_public: bool,
    /// Timestamp of the last reply edit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
}

const fn default_true() -> bool {
    true
}

/// Customer review tied to a business location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Backend identifier for the review.
    pub id: String,
    /// Location the review belongs to.
    pub location_id: String,
    /// Display name of the reviewer.
    pub reviewer_name: String,
    /// Star rating in the range 1–5.
    pub star_rating: u8,
    /// Free-form review text, absent for rating-only reviews.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Creation timestamp.
    pub create_time: DateTime<Utc>,
    /// Last modification timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
    /// Lifecycle status.
    pub status: ReviewStatus,
    /// Existing business reply, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<ReviewReply>,
    /// Soft-deletion marker.
    #[serde(default)]
    pub is_deleted: bool,
}

impl Review {
    /// Whether a business reply is already attached.
    #[must_use]
    pub const fn has_reply(&self) -> bool {
        self.reply.is_some()
    }
}

/// Page metadata returned with every review list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current page, 1-based.
    pub page: u32,
    /// Page size used by the backend.
    pub limit: u32,
    /// Total reviews matching the query.
    pub total: u64,
    /// Number of pages available.
    pub total_pages: u32,
    /// Whether a following page exists.
    pub has_next: bool,
    /// Whether a preceding page exists.
    pub has_prev: bool,
}

/// Aggregate rating figures for the filtered review set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    /// Total reviews in the summary scope.
    pub total: u64,
    /// Mean star rating.
    pub average_rating: f64,
    /// Count of reviews per star rating.
    #[serde(default)]
    pub rating_distribution: BTreeMap<u8, u64>,
}

/// Response body for the review list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewListResponse {
    /// Reviews on the requested page.
    pub reviews: Vec<Review>,
    /// Paging metadata.
    pub pagination: Pagination,
    /// Aggregate rating figures.
    pub summary: ReviewSummary,
}

/// Query parameters accepted by the review list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReviewListQuery {
    /// Page to fetch, 1-based.
    pub page: u32,
    /// Page size.
    pub per_page: u32,
    /// Restrict to a single star rating.
    pub star_rating: Option<u8>,
    /// Restrict to reviews with (`true`) or without (`false`) a reply.
    pub has_reply: Option<bool>,
    /// Include (`true`) or exclude (`false`) soft-deleted reviews.
    pub is_deleted: Option<bool>,
}

impl ReviewListQuery {
    /// Render the query as ordered `(name, value)` pairs, omitting unset filters.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
        ];
        if let Some(stars) = self.star_rating {
            pairs.push(("star_rating", stars.to_string()));
        }
        if let Some(has_reply) = self.has_reply {
            pairs.push(("has_reply", has_reply.to_string()));
        }
        if let Some(is_deleted) = self.is_deleted {
            pairs.push(("is_deleted", is_deleted.to_string()));
        }
        pairs
    }
}

/// Wire body for posting a business reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    /// Reply text.
    pub text: String,
    /// Whether the reply is published publicly.
    pub is_public: bool,
}

/// Error document returned by the backend on non-2xx responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// Human-readable failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Machine-readable failure code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Status echoed in the body; the HTTP status line wins when both exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

/// Profile completeness and review hygiene figures for one location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationHealth {
    /// Location identifier.
    pub location_id: String,
    /// Display name of the location.
    pub location_name: String,
    /// Completeness score in the range 0–100.
    pub hygiene_score: u8,
    /// Profile fields the backend reports as missing.
    #[serde(default)]
    pub missing_fields: Vec<String>,
    /// Reviews recorded for the location.
    pub total_reviews: u64,
    /// Reviews still waiting for a reply.
    pub unreplied_reviews: u64,
    /// Mean star rating, absent when there are no reviews.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
}

/// AI-generated reply draft for a review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplySuggestion {
    /// Suggested reply text.
    pub suggestion: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn review_list_response_decodes_backend_shape() -> Result<(), serde_json::Error> {
        let body = json!({
            "reviews": [{
                "id": "r-1",
                "locationId": "loc-9",
                "reviewerName": "Ada",
                "starRating": 4,
                "comment": "Lovely staff",
                "createTime": "2024-05-01T10:00:00Z",
                "status": "new"
            }, {
                "id": "r-2",
                "locationId": "loc-9",
                "reviewerName": "Grace",
                "starRating": 2,
                "createTime": "2024-05-02T10:00:00Z",
                "status": "replied",
                "reply": { "comment": "Sorry to hear that" }
            }],
            "pagination": {
                "page": 1, "limit": 10, "total": 2,
                "totalPages": 1, "hasNext": false, "hasPrev": false
            },
            "summary": {
                "total": 2,
                "averageRating": 3.0,
                "ratingDistribution": { "2": 1, "4": 1 }
            }
        });

        let decoded: ReviewListResponse = serde_json::from_value(body)?;
        assert_eq!(decoded.reviews.len(), 2);
        assert_eq!(decoded.reviews[0].status, ReviewStatus::New);
        assert!(!decoded.reviews[0].has_reply());
        assert!(!decoded.reviews[0].is_deleted);
        let reply = decoded.reviews[1].reply.as_ref().map(|reply| reply.is_public);
        assert_eq!(reply, Some(true));
        assert_eq!(decoded.summary.rating_distribution.get(&4), Some(&1));
        assert_eq!(decoded.pagination.total_pages, 1);
        Ok(())
    }

    #[test]
    fn reply_request_uses_camel_case() -> Result<(), serde_json::Error> {
        let request = ReplyRequest {
            text: "Thanks!".to_string(),
            is_public: false,
        };
        let value = serde_json::to_value(&request)?;
        assert_eq!(value, json!({ "text": "Thanks!", "isPublic": false }));
        Ok(())
    }

    #[test]
    fn query_pairs_skip_unset_filters() {
        let query = ReviewListQuery {
            page: 2,
            per_page: 25,
            star_rating: Some(5),
            has_reply: None,
            is_deleted: Some(false),
        };
        let pairs = query.query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("page", "2".to_string()),
                ("per_page", "25".to_string()),
                ("star_rating", "5".to_string()),
                ("is_deleted", "false".to_string()),
            ]
        );
    }

    #[test]
    fn error_body_tolerates_missing_fields() -> Result<(), serde_json::Error> {
        let body: ErrorBody = serde_json::from_str("{}")?;
        assert_eq!(body, ErrorBody::default());
        let body: ErrorBody =
            serde_json::from_str(r#"{"message":"slow down","code":"RATE_LIMITED"}"#)?;
        assert_eq!(body.code.as_deref(), Some("RATE_LIMITED"));
        Ok(())
    }
}

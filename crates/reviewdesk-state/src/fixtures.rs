//! Review builders shared by unit tests.

use chrono::{TimeZone, Utc};
use reviewdesk_api_models::{Review, ReviewReply, ReviewStatus};

pub fn review(id: &str, status: ReviewStatus) -> Review {
    Review {
        id: id.to_string(),
        location_id: "loc-1".to_string(),
        reviewer_name: format!("Reviewer {id}"),
        star_rating: 4,
        comment: Some("Friendly staff and quick service".to_string()),
        create_time: Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp"),
        update_time: None,
        status,
        reply: (status == ReviewStatus::Replied).then(|| ReviewReply {
            comment: "Thanks!".to_string(),
            is_public: true,
            update_time: None,
        }),
        is_deleted: false,
    }
}

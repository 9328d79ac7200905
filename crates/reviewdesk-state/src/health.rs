//! Location health grading.

use reviewdesk_api_models::LocationHealth;
use serde::Serialize;

/// Coarse grade derived from a hygiene score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthGrade {
    /// Score of 90 or more.
    Excellent,
    /// Score of 70 to 89.
    Good,
    /// Score of 50 to 69.
    Fair,
    /// Score below 50.
    Poor,
}

impl HealthGrade {
    /// Lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }
}

/// Grade a hygiene score.
#[must_use]
pub const fn health_grade(score: u8) -> HealthGrade {
    match score {
        90.. => HealthGrade::Excellent,
        70..=89 => HealthGrade::Good,
        50..=69 => HealthGrade::Fair,
        _ => HealthGrade::Poor,
    }
}

/// Share of reviews that have a reply, or `None` without reviews.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn reply_rate(health: &LocationHealth) -> Option<f64> {
    if health.total_reviews == 0 {
        return None;
    }
    let replied = health.total_reviews.saturating_sub(health.unreplied_reviews);
    Some(replied as f64 / health.total_reviews as f64)
}

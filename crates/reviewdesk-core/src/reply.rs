//! Validated reply inputs and single-reply submission.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use async_trait::async_trait;
use reviewdesk_api_models::ReplyRequest;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::error::{ApiError, ServiceResult, TransportError};

/// Longest reply the backend accepts, counted in characters.
pub const MAX_REPLY_CHARS: usize = 1_000;

/// Reasons a reply is rejected before it reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplyValidationError {
    /// The review identifier was blank.
    #[error("review id must not be empty")]
    EmptyReviewId,
    /// The reply text was blank or whitespace only.
    #[error("reply text must not be empty")]
    EmptyText,
    /// The reply text was longer than [`MAX_REPLY_CHARS`].
    #[error("reply text is {length} characters; the limit is {max}")]
    TextTooLong {
        /// Characters supplied.
        length: usize,
        /// Characters allowed.
        max: usize,
    },
}

/// Opaque, non-empty review identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ReviewId(String);

impl ReviewId {
    /// Wrap a raw identifier.
    ///
    /// # Errors
    /// Returns [`ReplyValidationError::EmptyReviewId`] when the identifier is blank.
    pub fn new(raw: impl Into<String>) -> Result<Self, ReplyValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ReplyValidationError::EmptyReviewId);
        }
        Ok(Self(raw))
    }

    /// Borrow the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ReviewId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl FromStr for ReviewId {
    type Err = ReplyValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::new(raw)
    }
}

/// Reply text plus visibility, validated once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyBody {
    text: String,
    is_public: bool,
}

impl ReplyBody {
    /// Validate and build a reply body.
    ///
    /// # Errors
    /// Returns [`ReplyValidationError::EmptyText`] for blank text and
    /// [`ReplyValidationError::TextTooLong`] past [`MAX_REPLY_CHARS`].
    pub fn new(text: impl Into<String>, is_public: bool) -> Result<Self, ReplyValidationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ReplyValidationError::EmptyText);
        }
        let length = text.chars().count();
        if length > MAX_REPLY_CHARS {
            return Err(ReplyValidationError::TextTooLong {
                length,
                max: MAX_REPLY_CHARS,
            });
        }
        Ok(Self { text, is_public })
    }

    /// Reply text as supplied.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the reply is published publicly.
    #[must_use]
    pub const fn is_public(&self) -> bool {
        self.is_public
    }

    /// Wire form posted to the backend.
    #[must_use]
    pub fn to_request(&self) -> ReplyRequest {
        ReplyRequest {
            text: self.text.clone(),
            is_public: self.is_public,
        }
    }
}

/// Network seam for posting replies.
#[async_trait]
pub trait ReplyTransport: Send + Sync {
    /// Post a reply to the given review.
    async fn post_reply(
        &self,
        review_id: &ReviewId,
        request: &ReplyRequest,
    ) -> Result<(), TransportError>;
}

/// Submit one reply and normalise the outcome.
///
/// Rate-limit handling is left to the caller; see
/// [`crate::RateLimitGuard::handle_error`].
///
/// # Errors
/// Returns the [`ApiError`] derived from the transport failure.
pub async fn submit_reply<T>(
    transport: &T,
    review_id: &ReviewId,
    body: &ReplyBody,
) -> ServiceResult<()>
where
    T: ReplyTransport + ?Sized,
{
    debug!(review_id = %review_id, is_public = body.is_public(), "submitting reply");
    transport
        .post_reply(review_id, &body.to_request())
        .await
        .map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingTransport {
        calls: Mutex<Vec<(String, ReplyRequest)>>,
        failure: Option<TransportError>,
    }

    #[async_trait]
    impl ReplyTransport for RecordingTransport {
        async fn post_reply(
            &self,
            review_id: &ReviewId,
            request: &ReplyRequest,
        ) -> Result<(), TransportError> {
            self.calls
                .lock()
                .expect("calls lock")
                .push((review_id.to_string(), request.clone()));
            self.failure.clone().map_or(Ok(()), Err)
        }
    }

    #[test]
    fn reply_body_enforces_length_bounds() {
        assert_eq!(
            ReplyBody::new("", true),
            Err(ReplyValidationError::EmptyText)
        );
        assert_eq!(
            ReplyBody::new("   \n\t", true),
            Err(ReplyValidationError::EmptyText)
        );
        assert!(ReplyBody::new("x".repeat(MAX_REPLY_CHARS), true).is_ok());
        assert_eq!(
            ReplyBody::new("x".repeat(MAX_REPLY_CHARS + 1), true),
            Err(ReplyValidationError::TextTooLong {
                length: MAX_REPLY_CHARS + 1,
                max: MAX_REPLY_CHARS,
            })
        );
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let text = "é".repeat(MAX_REPLY_CHARS);
        assert!(text.len() > MAX_REPLY_CHARS);
        assert!(ReplyBody::new(text, false).is_ok());
    }

    #[test]
    fn review_id_rejects_blank_values() {
        assert_eq!(ReviewId::new(""), Err(ReplyValidationError::EmptyReviewId));
        assert_eq!(
            " ".parse::<ReviewId>(),
            Err(ReplyValidationError::EmptyReviewId)
        );
        assert_eq!(ReviewId::new("r-1").map(|id| id.to_string()), Ok("r-1".into()));
    }

    #[tokio::test]
    async fn submit_reply_posts_wire_shape() -> anyhow::Result<()> {
        let transport = RecordingTransport::default();
        let review_id = ReviewId::new("r-42")?;
        let body = ReplyBody::new("Thanks for visiting!", false)?;

        submit_reply(&transport, &review_id, &body).await?;

        let calls = transport.calls.lock().expect("calls lock");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "r-42");
        assert_eq!(
            calls[0].1,
            ReplyRequest {
                text: "Thanks for visiting!".to_string(),
                is_public: false,
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn submit_reply_normalises_failures() -> anyhow::Result<()> {
        let transport = RecordingTransport {
            failure: Some(TransportError::Http {
                status: 429,
                message: None,
                code: Some("RATE_LIMITED".to_string()),
            }),
            ..RecordingTransport::default()
        };
        let review_id = ReviewId::new("r-1")?;
        let body = ReplyBody::new("Hello", true)?;

        let error = submit_reply(&transport, &review_id, &body)
            .await
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected failure"))?;
        assert!(error.is_rate_limited());
        assert_eq!(error.message, "An error occurred");
        Ok(())
    }
}

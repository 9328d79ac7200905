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

//! Reply submission primitives for the review desk.
//!
//! Layout: `error.rs` (normalised API failures), `reply.rs` (validated reply
//! inputs and the transport seam), `rate_limit.rs` (cooldown guard after HTTP
//! 429), `bulk.rs` (bounded worker pool for bulk replies).

pub mod bulk;
pub mod error;
pub mod rate_limit;
pub mod reply;

pub use bulk::{
    BulkReplyError, BulkReplyFailure, BulkReplyOrchestrator, BulkReplyProgress, BulkReplyReport,
    BulkReplyRequest, CancellationFlag, IgnoreProgress, ProgressObserver,
};
pub use error::{ApiError, ServiceEnvelope, ServiceResult, TransportError};
pub use rate_limit::RateLimitGuard;
pub use reply::{
    MAX_REPLY_CHARS, ReplyBody, ReplyTransport, ReplyValidationError, ReviewId, submit_reply,
};

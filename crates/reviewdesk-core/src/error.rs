//! Normalised failure shape for every backend call.
//!
//! # Design
//! - Transports report what they saw as a [`TransportError`]; conversion into
//!   [`ApiError`] is a pure function of that value.
//! - Callers never see panics, only `ServiceResult` values.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status assigned when a failure carries no HTTP status of its own.
pub const DEFAULT_ERROR_STATUS: u16 = 500;
/// Status the backend uses to signal rate limiting.
pub const RATE_LIMITED_STATUS: u16 = 429;

const DEFAULT_HTTP_MESSAGE: &str = "An error occurred";
const UNKNOWN_MESSAGE: &str = "An unknown error occurred";

/// Outcome of a backend call.
pub type ServiceResult<T> = Result<T, ApiError>;

/// Normalised backend failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message} (status {status})")]
pub struct ApiError {
    /// Human-readable description.
    pub message: String,
    /// HTTP status, or 500 when the failure never reached the backend.
    pub status: u16,
    /// Machine-readable code supplied by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ApiError {
    /// Build an error with an explicit status and no code.
    #[must_use]
    pub fn new(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status,
            code: None,
        }
    }

    /// Attach a machine-readable code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Whether the backend rejected the call for rate limiting.
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        self.status == RATE_LIMITED_STATUS
    }
}

/// Raw failure reported by a transport before normalisation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The backend answered with a non-success status.
    #[error("backend responded with status {status}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Message from the error body, if any.
        message: Option<String>,
        /// Code from the error body, if any.
        code: Option<String>,
    },
    /// The request failed without an HTTP response (connect, I/O, decode).
    #[error("request failed: {message}")]
    Network {
        /// Description of the failure.
        message: String,
    },
    /// Failure with nothing usable attached.
    #[error("unknown transport failure")]
    Unknown,
}

impl From<TransportError> for ApiError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Http {
                status,
                message,
                code,
            } => Self {
                message: message
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| DEFAULT_HTTP_MESSAGE.to_string()),
                status,
                code,
            },
            TransportError::Network { message } => Self::new(message, DEFAULT_ERROR_STATUS),
            TransportError::Unknown => Self::new(UNKNOWN_MESSAGE, DEFAULT_ERROR_STATUS),
        }
    }
}

/// Serializable `{success, data | error}` form of a [`ServiceResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEnvelope<T> {
    /// Whether the call succeeded.
    pub success: bool,
    /// Payload on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Failure on error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T> From<ServiceResult<T>> for ServiceEnvelope<T> {
    fn from(result: ServiceResult<T>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(error) => Self {
                success: false,
                data: None,
                error: Some(error),
            },
        }
    }
}

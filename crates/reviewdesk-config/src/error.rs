//! Error types for configuration loading.

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Value could not be parsed into the expected type.
    #[error("invalid configuration value")]
    InvalidValue {
        /// Environment key or setting name.
        key: &'static str,
        /// Offending raw value.
        value: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// Numeric value fell outside the accepted range.
    #[error("configuration value out of range")]
    OutOfRange {
        /// Environment key or setting name.
        key: &'static str,
        /// Offending value.
        value: u64,
        /// Inclusive lower bound.
        min: u64,
        /// Inclusive upper bound.
        max: u64,
    },
}

impl ConfigError {
    /// Render the error together with its structured context.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::InvalidValue { key, value, reason } => {
                format!("{key}: '{value}' is invalid ({reason})")
            }
            Self::OutOfRange {
                key,
                value,
                min,
                max,
            } => format!("{key}: {value} is outside {min}..={max}"),
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_includes_context() {
        let err = ConfigError::OutOfRange {
            key: "REVIEWDESK_BULK_CONCURRENCY",
            value: 99,
            min: 1,
            max: 32,
        };
        assert_eq!(err.to_string(), "configuration value out of range");
        assert_eq!(err.detail(), "REVIEWDESK_BULK_CONCURRENCY: 99 is outside 1..=32");

        let err = ConfigError::InvalidValue {
            key: "REVIEWDESK_LOG_FORMAT",
            value: "xml".to_string(),
            reason: "expected json or pretty",
        };
        assert!(err.detail().contains("'xml'"));
    }
}

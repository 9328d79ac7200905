//! Parsing and range checks for configuration values.

use crate::error::{ConfigError, ConfigResult};
use crate::model::LogOutput;

/// Parse an unsigned integer setting.
///
/// # Errors
/// Returns [`ConfigError::InvalidValue`] when `raw` is not a base-10 integer.
pub fn parse_u64(key: &'static str, raw: &str) -> ConfigResult<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: "expected a non-negative integer",
        })
}

/// Ensure `value` lies within `min..=max`.
///
/// # Errors
/// Returns [`ConfigError::OutOfRange`] when the value is outside the bounds.
pub fn ensure_range(key: &'static str, value: u64, min: u64, max: u64) -> ConfigResult<u64> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            key,
            value,
            min,
            max,
        });
    }
    Ok(value)
}

/// Parse and bound-check an unsigned integer setting in one step.
///
/// # Errors
/// Propagates failures from [`parse_u64`] and [`ensure_range`].
pub fn parse_bounded(key: &'static str, raw: &str, min: u64, max: u64) -> ConfigResult<u64> {
    ensure_range(key, parse_u64(key, raw)?, min, max)
}

/// Parse a log output format name.
///
/// # Errors
/// Returns [`ConfigError::InvalidValue`] for anything other than `json` or `pretty`.
pub fn parse_log_output(key: &'static str, raw: &str) -> ConfigResult<LogOutput> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "json" => Ok(LogOutput::Json),
        "pretty" => Ok(LogOutput::Pretty),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: "expected json or pretty",
        }),
    }
}

/// Validate a log level directive (non-empty, no whitespace).
///
/// # Errors
/// Returns [`ConfigError::InvalidValue`] when the directive is blank or contains spaces.
pub fn parse_log_level(key: &'static str, raw: &str) -> ConfigResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        return Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: "expected a level directive such as info or reviewdesk=debug",
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bounded_accepts_in_range_values() {
        assert_eq!(parse_bounded("K", " 7 ", 1, 10), Ok(7));
    }

    #[test]
    fn parse_bounded_rejects_garbage_and_range() {
        assert!(matches!(
            parse_bounded("K", "seven", 1, 10),
            Err(ConfigError::InvalidValue { key: "K", .. })
        ));
        assert_eq!(
            parse_bounded("K", "0", 1, 10),
            Err(ConfigError::OutOfRange {
                key: "K",
                value: 0,
                min: 1,
                max: 10
            })
        );
    }

    #[test]
    fn log_output_is_case_insensitive() {
        assert_eq!(parse_log_output("K", "JSON"), Ok(LogOutput::Json));
        assert_eq!(parse_log_output("K", "pretty"), Ok(LogOutput::Pretty));
        assert!(parse_log_output("K", "yaml").is_err());
    }

    #[test]
    fn log_level_rejects_blank_and_spaced_values() {
        assert_eq!(parse_log_level("K", " debug "), Ok("debug".to_string()));
        assert!(parse_log_level("K", "   ").is_err());
        assert!(parse_log_level("K", "info debug").is_err());
    }
}

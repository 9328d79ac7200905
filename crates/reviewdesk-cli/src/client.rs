//! Shared client utilities, error types, and telemetry wiring for the CLI.

use std::fmt::{self, Display, Formatter};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::anyhow;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use reviewdesk_client::ApiClient;
use reviewdesk_config::{ConfigError, DeskConfig};
use reviewdesk_core::ApiError;
use serde::Serialize;
use url::Url;

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";
pub(crate) const ENV_TELEMETRY_ENDPOINT: &str = "REVIEWDESK_TELEMETRY_ENDPOINT";

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ApiError> for CliError {
    fn from(error: ApiError) -> Self {
        if matches!(error.status, 400 | 409 | 422) {
            Self::validation(error.message)
        } else {
            Self::failure(anyhow!(error))
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        Self::validation(error.to_string())
    }
}

/// Dependencies constructed from environment flags and CLI options.
#[derive(Clone)]
pub(crate) struct CliDependencies {
    pub(crate) client: Client,
    pub(crate) telemetry: Option<TelemetryEmitter>,
}

impl CliDependencies {
    /// Construct a configured HTTP client and optional telemetry emitter.
    pub(crate) fn build(timeout_secs: u64, trace_id: &str) -> CliResult<Self> {
        let mut default_headers = HeaderMap::new();
        let request_id = HeaderValue::from_str(trace_id).map_err(|_| {
            CliError::failure(anyhow!("trace identifier contains invalid characters"))
        })?;
        default_headers.insert(HEADER_REQUEST_ID, request_id);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .default_headers(default_headers)
            .build()
            .map_err(|err| CliError::failure(anyhow!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            telemetry: TelemetryEmitter::from_env(),
        })
    }
}

/// Application context passed to command handlers.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) api: ApiClient,
    pub(crate) config: DeskConfig,
}

impl AppContext {
    pub(crate) fn new(
        client: Client,
        base_url: Url,
        api_key: Option<String>,
        config: DeskConfig,
    ) -> Self {
        let api = ApiClient::new(client, base_url);
        let api = match api_key {
            Some(key) => api.with_api_key(key),
            None => api,
        };
        Self { api, config }
    }
}

/// Telemetry emitter used to forward CLI outcomes.
#[derive(Clone)]
pub(crate) struct TelemetryEmitter {
    pub(crate) client: Client,
    pub(crate) endpoint: Url,
}

impl TelemetryEmitter {
    #[must_use]
    pub(crate) fn from_env() -> Option<Self> {
        let endpoint = std::env::var(ENV_TELEMETRY_ENDPOINT).ok()?;
        let endpoint = endpoint.parse().ok()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .ok()?;
        Some(Self { client, endpoint })
    }

    pub(crate) async fn emit(&self, event: &CommandOutcome<'_>) {
        let payload = TelemetryEvent {
            outcome: event,
            timestamp_ms: timestamp_now_ms(),
        };

        if let Err(err) = self
            .client
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await
        {
            tracing::debug!(error = %err, "telemetry emit failed");
        }
    }
}

/// Result of one CLI invocation as reported to telemetry.
#[derive(Debug, Serialize)]
pub(crate) struct CommandOutcome<'a> {
    pub(crate) trace_id: &'a str,
    pub(crate) command: &'a str,
    pub(crate) outcome: &'a str,
    pub(crate) exit_code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) message: Option<&'a str>,
}

#[derive(Serialize)]
struct TelemetryEvent<'a> {
    #[serde(flatten)]
    outcome: &'a CommandOutcome<'a>,
    timestamp_ms: u64,
}

/// Parse the API URL provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}

/// Treat blank API keys as absent.
#[must_use]
pub(crate) fn normalize_api_key(input: Option<String>) -> Option<String> {
    input
        .map(|raw| raw.trim().to_string())
        .filter(|key| !key.is_empty())
}

/// Millisecond timestamp helper for telemetry.
#[must_use]
pub(crate) fn timestamp_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use httpmock::MockServer;
    use httpmock::prelude::*;

    #[test]
    fn api_errors_split_into_validation_and_failure() {
        let validation = CliError::from(ApiError::new("text too long", 422));
        assert_eq!(validation.exit_code(), 2);
        assert_eq!(validation.display_message(), "text too long");

        let failure = CliError::from(ApiError::new("upstream down", 503));
        assert_eq!(failure.exit_code(), 3);
        assert!(failure.display_message().contains("upstream down"));
    }

    #[test]
    fn blank_api_keys_are_dropped() {
        assert_eq!(normalize_api_key(Some("  ".to_string())), None);
        assert_eq!(
            normalize_api_key(Some(" key ".to_string())),
            Some("key".to_string())
        );
        assert_eq!(normalize_api_key(None), None);
    }

    #[test]
    fn parse_url_reports_input() {
        assert!(parse_url("http://localhost:8080").is_ok());
        let err = parse_url("not a url").err().unwrap_or_default();
        assert!(err.contains("not a url"));
    }

    #[test]
    fn telemetry_event_flattens_outcome() -> Result<()> {
        let outcome = CommandOutcome {
            trace_id: "trace",
            command: "reviews_bulk_reply",
            outcome: "error",
            exit_code: 3,
            message: Some("boom"),
        };
        let value = serde_json::to_value(TelemetryEvent {
            outcome: &outcome,
            timestamp_ms: 1,
        })?;
        assert_eq!(value["command"], "reviews_bulk_reply");
        assert_eq!(value["exit_code"], 3);
        assert_eq!(value["timestamp_ms"], 1);
        Ok(())
    }

    #[test]
    fn timestamp_now_ms_returns_positive_value() {
        assert!(timestamp_now_ms() > 0);
    }

    #[tokio::test]
    async fn telemetry_emitter_emits_event() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/telemetry");
            then.status(200);
        });

        let emitter = TelemetryEmitter {
            client: Client::new(),
            endpoint: format!("{}/telemetry", server.base_url())
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid URL"))?,
        };

        emitter
            .emit(&CommandOutcome {
                trace_id: "trace",
                command: "reviews_ls",
                outcome: "success",
                exit_code: 0,
                message: None,
            })
            .await;

        mock.assert();
        Ok(())
    }
}

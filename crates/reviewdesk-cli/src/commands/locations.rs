use crate::cli::{LocationHealthArgs, OutputFormat};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::render_location_health;

pub(crate) async fn handle_location_health(
    ctx: &AppContext,
    args: LocationHealthArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let LocationHealthArgs { location_id } = args;
    let location_id = location_id.trim();
    if location_id.is_empty() {
        return Err(CliError::validation("location id must not be empty"));
    }
    let health = ctx.api.location_health(location_id).await?;
    render_location_health(&health, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use reqwest::Client;
    use reviewdesk_config::DeskConfig;
    use serde_json::json;

    fn context_with(server: &MockServer) -> AppContext {
        AppContext::new(
            Client::new(),
            server.base_url().parse().expect("valid URL"),
            None,
            DeskConfig::default(),
        )
    }

    #[tokio::test]
    async fn location_health_renders_report() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/locations/loc-1/health");
            then.status(200).json_body(json!({
                "locationId": "loc-1",
                "locationName": "Main Street",
                "hygieneScore": 64,
                "missingFields": ["phone", "hours"],
                "totalReviews": 10,
                "unrepliedReviews": 4
            }));
        });

        let args = LocationHealthArgs {
            location_id: " loc-1 ".to_string(),
        };
        handle_location_health(&context_with(&server), args, OutputFormat::Table)
            .await
            .expect("health should render");
        mock.assert();
    }

    #[tokio::test]
    async fn missing_location_is_an_operational_failure() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/locations/ghost/health");
            then.status(404)
                .json_body(json!({ "message": "Location not found" }));
        });

        let args = LocationHealthArgs {
            location_id: "ghost".to_string(),
        };
        let err = handle_location_health(&context_with(&server), args, OutputFormat::Json)
            .await
            .expect_err("unknown location");
        assert_eq!(err.exit_code(), 3);
        assert!(err.display_message().contains("Location not found"));
    }

    #[tokio::test]
    async fn blank_location_id_is_rejected() {
        let server = MockServer::start_async().await;
        let args = LocationHealthArgs {
            location_id: "  ".to_string(),
        };
        let err = handle_location_health(&context_with(&server), args, OutputFormat::Table)
            .await
            .expect_err("blank id");
        assert_eq!(err.exit_code(), 2);
    }
}

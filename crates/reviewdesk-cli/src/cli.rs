//! Command-line parsing and dispatch for the review desk CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};
use reviewdesk_config::{DeskConfig, LogOutput};
use reviewdesk_core::ReviewId;
use reviewdesk_state::ReplyStatusFilter;
use reviewdesk_telemetry::{LogFormat, LoggingConfig, init_logging};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::client::{
    AppContext, CliDependencies, CliError, CliResult, CommandOutcome, normalize_api_key, parse_url,
};
use crate::commands::locations::handle_location_health;
use crate::commands::reviews::{
    handle_bulk_reply, handle_reply, handle_review_list, handle_suggest,
};

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_API_URL: &str = "http://127.0.0.1:3000";

/// Parses CLI arguments, executes the requested command, and handles
/// user-facing telemetry emission. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let config = match DeskConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            let err = CliError::from(err);
            eprintln!("error: {}", err.display_message());
            return err.exit_code();
        }
    };
    install_logging(&config);
    log_loaded_config(&config);

    let command_name = command_label(&cli.command);
    let trace_id = Uuid::new_v4().to_string();
    let deps = match CliDependencies::build(cli.timeout, &trace_id) {
        Ok(deps) => deps,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            return err.exit_code();
        }
    };
    let telemetry = deps.telemetry.clone();

    let result = dispatch(cli, &deps, config).await;

    let (exit_code, message, outcome) = match result {
        Ok(()) => (0, None, "success"),
        Err(err) => {
            let exit_code = err.exit_code();
            let message = err.display_message();
            eprintln!("error: {message}");
            (exit_code, Some(message), "error")
        }
    };

    if let Some(emitter) = &telemetry {
        emitter
            .emit(&CommandOutcome {
                trace_id: &trace_id,
                command: command_name,
                outcome,
                exit_code,
                message: message.as_deref(),
            })
            .await;
    }

    exit_code
}

fn install_logging(config: &DeskConfig) {
    let format = LogFormat::or_infer(config.logging.format.map(|output| match output {
        LogOutput::Json => LogFormat::Json,
        LogOutput::Pretty => LogFormat::Pretty,
    }));
    let logging = LoggingConfig {
        level: &config.logging.level,
        format,
        build_sha: option_env!("REVIEWDESK_BUILD_SHA").unwrap_or("dev"),
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: logging disabled: {err}");
    }
}

fn log_loaded_config(config: &DeskConfig) {
    debug!(
        concurrency = config.bulk.concurrency,
        cooldown_ms = u64::try_from(config.bulk.cooldown.as_millis()).unwrap_or(u64::MAX),
        per_page = config.filters.per_page,
        log_level = %config.logging.level,
        "loaded desk configuration"
    );
}

async fn dispatch(cli: Cli, deps: &CliDependencies, config: DeskConfig) -> CliResult<()> {
    let ctx = AppContext::new(
        deps.client.clone(),
        cli.api_url,
        normalize_api_key(cli.api_key),
        config,
    );

    match cli.command {
        Command::Reviews(reviews) => match reviews {
            ReviewsCommand::Ls(args) => handle_review_list(&ctx, args, cli.output).await,
            ReviewsCommand::Reply(args) => handle_reply(&ctx, args).await,
            ReviewsCommand::BulkReply(args) => handle_bulk_reply(&ctx, args, cli.output).await,
            ReviewsCommand::Suggest(args) => handle_suggest(&ctx, args, cli.output).await,
        },
        Command::Locations(locations) => match locations {
            LocationsCommand::Health(args) => {
                handle_location_health(&ctx, args, cli.output).await
            }
        },
    }
}

#[derive(Parser)]
#[command(name = "reviewdesk", about = "Manage customer reviews and business replies")]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "REVIEWDESK_API_URL",
        value_parser = parse_url,
        default_value = DEFAULT_API_URL
    )]
    pub(crate) api_url: Url,
    #[arg(long, global = true, env = "REVIEWDESK_API_KEY")]
    pub(crate) api_key: Option<String>,
    #[arg(
        long,
        global = true,
        env = "REVIEWDESK_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub(crate) timeout: u64,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Browse and reply to reviews.
    #[command(subcommand)]
    Reviews(ReviewsCommand),
    /// Inspect business locations.
    #[command(subcommand)]
    Locations(LocationsCommand),
}

#[derive(Subcommand)]
pub(crate) enum ReviewsCommand {
    /// List one page of reviews.
    Ls(ReviewListArgs),
    /// Reply to a single review.
    Reply(ReplyArgs),
    /// Post the same reply to many reviews.
    BulkReply(BulkReplyArgs),
    /// Fetch an AI-drafted reply, optionally posting it.
    Suggest(SuggestArgs),
}

#[derive(Subcommand)]
pub(crate) enum LocationsCommand {
    /// Show profile health for a location.
    Health(LocationHealthArgs),
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ReviewListArgs {
    #[arg(long, default_value_t = 1)]
    pub(crate) page: u32,
    #[arg(long)]
    pub(crate) per_page: Option<u32>,
    #[arg(long, help = "Only show reviews with this star rating (1-5)")]
    pub(crate) stars: Option<u8>,
    #[arg(long, default_value = "all", help = "all, replied, or unreplied")]
    pub(crate) status: ReplyStatusFilter,
    #[arg(long, help = "Case-insensitive match on reviewer name or comment")]
    pub(crate) search: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct ReplyArgs {
    pub(crate) review_id: ReviewId,
    #[arg(long)]
    pub(crate) text: String,
    #[arg(long, help = "Keep the reply private")]
    pub(crate) private: bool,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct BulkReplyArgs {
    #[arg(required_unless_present = "all_new", conflicts_with = "all_new")]
    pub(crate) review_ids: Vec<String>,
    #[arg(long, help = "Reply to every new review on the first unreplied page")]
    pub(crate) all_new: bool,
    #[arg(long)]
    pub(crate) text: String,
    #[arg(long, help = "Keep the replies private")]
    pub(crate) private: bool,
    #[arg(long, help = "Replies in flight at once")]
    pub(crate) concurrency: Option<usize>,
    #[arg(long, help = "Pause after a rate-limit response, in milliseconds")]
    pub(crate) cooldown_ms: Option<u64>,
    #[arg(long, help = "Print reply metrics after the run")]
    pub(crate) show_metrics: bool,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct SuggestArgs {
    pub(crate) review_id: ReviewId,
    #[arg(long, help = "Post the suggestion as the reply")]
    pub(crate) apply: bool,
    #[arg(long, help = "Keep the posted reply private")]
    pub(crate) private: bool,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct LocationHealthArgs {
    pub(crate) location_id: String,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Reviews(ReviewsCommand::Ls(_)) => "reviews_ls",
        Command::Reviews(ReviewsCommand::Reply(_)) => "reviews_reply",
        Command::Reviews(ReviewsCommand::BulkReply(_)) => "reviews_bulk_reply",
        Command::Reviews(ReviewsCommand::Suggest(_)) => "reviews_suggest",
        Command::Locations(LocationsCommand::Health(_)) => "locations_health",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("reviewdesk").chain(args.iter().copied()))
    }

    #[test]
    fn bulk_reply_accepts_ids_and_overrides() -> Result<(), clap::Error> {
        let cli = parse(&[
            "reviews",
            "bulk-reply",
            "r-1",
            "r-2",
            "--text",
            "Thanks!",
            "--concurrency",
            "5",
            "--cooldown-ms",
            "1000",
            "--output",
            "json",
        ])?;
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(command_label(&cli.command), "reviews_bulk_reply");
        let Command::Reviews(ReviewsCommand::BulkReply(args)) = cli.command else {
            panic!("expected bulk-reply");
        };
        assert_eq!(args.review_ids, vec!["r-1".to_string(), "r-2".to_string()]);
        assert_eq!(args.concurrency, Some(5));
        assert_eq!(args.cooldown_ms, Some(1_000));
        assert!(!args.all_new);
        Ok(())
    }

    #[test]
    fn bulk_reply_requires_ids_or_all_new() {
        assert!(parse(&["reviews", "bulk-reply", "--text", "hi"]).is_err());
        assert!(parse(&["reviews", "bulk-reply", "--all-new", "--text", "hi"]).is_ok());
        assert!(parse(&["reviews", "bulk-reply", "r-1", "--all-new", "--text", "hi"]).is_err());
    }

    #[test]
    fn list_filters_parse_into_typed_values() -> Result<(), clap::Error> {
        let cli = parse(&[
            "reviews", "ls", "--status", "unreplied", "--stars", "4", "--page", "2",
        ])?;
        let Command::Reviews(ReviewsCommand::Ls(args)) = cli.command else {
            panic!("expected ls");
        };
        assert_eq!(args.status, ReplyStatusFilter::Unreplied);
        assert_eq!(args.stars, Some(4));
        assert_eq!(args.page, 2);
        assert!(parse(&["reviews", "ls", "--status", "pending"]).is_err());
        Ok(())
    }

    #[test]
    fn blank_review_ids_are_rejected_by_the_parser() {
        assert!(parse(&["reviews", "reply", "", "--text", "hi"]).is_err());
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("capture lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn loaded_config_is_logged_through_the_installed_subscriber() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let mut config = DeskConfig::default();
        config.bulk.concurrency = 4;
        tracing::subscriber::with_default(subscriber, || log_loaded_config(&config));

        let bytes = captured.0.lock().expect("capture lock").clone();
        let text = String::from_utf8(bytes).expect("utf8 log output");
        assert!(text.contains("loaded desk configuration"));
        assert!(text.contains("concurrency=4"));
    }

    #[test]
    fn command_labels_cover_locations() -> Result<(), clap::Error> {
        let cli = parse(&["locations", "health", "loc-1"])?;
        assert_eq!(command_label(&cli.command), "locations_health");
        assert_eq!(cli.api_url.as_str(), "http://127.0.0.1:3000/");
        Ok(())
    }
}

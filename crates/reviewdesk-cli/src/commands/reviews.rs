use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use reviewdesk_api_models::Review;
use reviewdesk_core::{
    ApiError, BulkReplyOrchestrator, BulkReplyRequest, CancellationFlag, RateLimitGuard,
    ReplyBody, submit_reply,
};
use reviewdesk_state::{
    ReplyStatusFilter, ReviewFilters, ReviewsState, StarRating, bulk_request, filter_rows,
    initial_selection, select_visible_rows, set_rows,
};
use reviewdesk_telemetry::Metrics;
use tracing::info;

use crate::cli::{BulkReplyArgs, OutputFormat, ReplyArgs, ReviewListArgs, SuggestArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{
    render_bulk_report, render_metrics, render_progress, render_review_list, render_suggestion,
};

pub(crate) async fn handle_review_list(
    ctx: &AppContext,
    args: ReviewListArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let filters = list_filters(ctx, args)?;
    let key = filters.query_key();
    let page = ctx.api.list_reviews(&key.query).await?;
    let rows: Vec<Review> = filter_rows(&page.reviews, &key.search)
        .into_iter()
        .cloned()
        .collect();
    render_review_list(&rows, &page, output)
}

/// The page is applied last; every other setter rewinds it.
fn list_filters(ctx: &AppContext, args: ReviewListArgs) -> CliResult<ReviewFilters> {
    let mut filters = ReviewFilters::from_settings(&ctx.config.filters);
    if let Some(per_page) = args.per_page {
        filters
            .set_per_page(per_page)
            .map_err(|err| CliError::validation(err.to_string()))?;
    }
    if let Some(stars) = args.stars {
        let rating = StarRating::new(stars).map_err(|err| CliError::validation(err.to_string()))?;
        filters.set_star_rating(Some(rating));
    }
    filters.set_reply_status(args.status);
    if let Some(search) = args.search {
        filters.set_search(search);
    }
    filters.set_page(args.page);
    Ok(filters)
}

pub(crate) async fn handle_reply(ctx: &AppContext, args: ReplyArgs) -> CliResult<()> {
    let body = reply_body(args.text, args.private)?;

    match submit_reply(&ctx.api, &args.review_id, &body).await {
        Ok(()) => {
            println!("reply posted to review {}", args.review_id);
            Ok(())
        }
        Err(error) => {
            if let Some(hint) = rate_limit_hint(&error, ctx.config.bulk.cooldown) {
                eprintln!("warning: {hint}");
            }
            Err(error.into())
        }
    }
}

/// Retry advice for a rate-limited reply, sized to the configured cooldown.
fn rate_limit_hint(error: &ApiError, cooldown: Duration) -> Option<String> {
    RateLimitGuard::is_rate_limited(error).then(|| {
        format!(
            "replies are rate limited; wait {}s before retrying",
            cooldown.as_secs()
        )
    })
}

pub(crate) async fn handle_bulk_reply(
    ctx: &AppContext,
    args: BulkReplyArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let settings = ctx
        .config
        .clone()
        .with_bulk_overrides(args.concurrency, args.cooldown_ms)?
        .bulk;

    let request = if args.all_new {
        let body = reply_body(args.text, args.private)?;
        match new_review_request(ctx, body).await? {
            Some(request) => request,
            None => {
                println!("no new reviews awaiting a reply");
                return Ok(());
            }
        }
    } else {
        BulkReplyRequest::parse(args.review_ids, args.text, !args.private)
            .map_err(|err| CliError::from(ApiError::from(err)))?
    };

    let metrics = if args.show_metrics {
        Some(
            Metrics::new().map_err(|err| {
                CliError::failure(anyhow!("failed to initialise metrics: {err}"))
            })?,
        )
    } else {
        None
    };

    let cancellation = CancellationFlag::new();
    let mut orchestrator =
        BulkReplyOrchestrator::from_settings(Arc::new(ctx.api.clone()), &settings)
            .with_cancellation(cancellation.clone());
    if let Some(metrics) = &metrics {
        orchestrator = orchestrator.with_metrics(metrics.clone());
    }

    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancellation.cancel();
        }
    });
    let result = orchestrator.run(request, render_progress).await;
    interrupt.abort();
    let report = result?;

    info!(
        succeeded = report.succeeded,
        failed = report.failed,
        "bulk reply finished"
    );
    render_bulk_report(&report, output)?;

    if report.cancelled {
        eprintln!("warning: run interrupted; remaining reviews were not attempted");
    }
    if report.is_degraded() {
        eprintln!(
            "warning: the review API looks degraded: {} of {} replies failed",
            report.failed, report.total
        );
    }
    let guard = orchestrator.guard();
    if guard.is_disabled() {
        eprintln!(
            "warning: replies are rate limited for another {}s",
            guard.remaining_cooldown().as_secs()
        );
    }
    if let Some(metrics) = &metrics {
        render_metrics(metrics)?;
    }
    Ok(())
}

/// Select every new review on the first unreplied page, the way the list
/// view pre-selects rows when it loads.
async fn new_review_request(
    ctx: &AppContext,
    body: ReplyBody,
) -> CliResult<Option<BulkReplyRequest>> {
    let mut filters = ReviewFilters::from_settings(&ctx.config.filters);
    filters.set_reply_status(ReplyStatusFilter::Unreplied);
    let page = ctx.api.list_reviews(&filters.to_query()).await?;

    let mut state = ReviewsState {
        filters,
        ..ReviewsState::default()
    };
    set_rows(&mut state, page.reviews);
    state.selected = initial_selection(&select_visible_rows(&state));
    Ok(bulk_request(&state, body))
}

pub(crate) async fn handle_suggest(
    ctx: &AppContext,
    args: SuggestArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let SuggestArgs {
        review_id,
        apply,
        private,
    } = args;
    let suggestion = ctx.api.suggest_reply(&review_id).await?;
    render_suggestion(&suggestion, output)?;

    if apply {
        let body = reply_body(suggestion.suggestion, private)?;
        submit_reply(&ctx.api, &review_id, &body).await?;
        println!("suggested reply posted to review {review_id}");
    }
    Ok(())
}

fn reply_body(text: String, private: bool) -> CliResult<ReplyBody> {
    ReplyBody::new(text, !private).map_err(|err| CliError::validation(err.to_string()))
}

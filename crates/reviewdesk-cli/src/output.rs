//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use reviewdesk_api_models::{
    LocationHealth, Pagination, ReplySuggestion, Review, ReviewListResponse, ReviewSummary,
};
use reviewdesk_core::{BulkReplyProgress, BulkReplyReport};
use reviewdesk_state::{
    has_next, has_prev, health_grade, item_range, page_window, reply_rate, total_pages,
};
use reviewdesk_telemetry::Metrics;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

const COMMENT_WIDTH: usize = 48;
const PAGER_WIDTH: u32 = 5;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewListView<'a> {
    reviews: &'a [Review],
    pagination: &'a Pagination,
    summary: &'a ReviewSummary,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LocationHealthView<'a> {
    #[serde(flatten)]
    health: &'a LocationHealth,
    grade: &'static str,
    reply_rate: Option<f64>,
}

pub(crate) fn render_review_list(
    rows: &[Review],
    page: &ReviewListResponse,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&ReviewListView {
            reviews: rows,
            pagination: &page.pagination,
            summary: &page.summary,
        })?,
        OutputFormat::Table => {
            println!(
                "{:<24} {:<5} {:<8} {:<20} COMMENT",
                "ID", "STARS", "STATUS", "REVIEWER"
            );
            for review in rows {
                println!("{}", format_review_row(review));
            }
            println!("{}", format_page_footer(&page.pagination));
            println!(
                "average rating: {:.1} across {} reviews",
                page.summary.average_rating, page.summary.total
            );
        }
    }
    Ok(())
}

pub(crate) fn render_bulk_report(report: &BulkReplyReport, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(report)?,
        OutputFormat::Table => {
            println!(
                "replied: {}/{} (failed {}, rate limited {})",
                report.succeeded, report.total, report.failed, report.rate_limited
            );
            for failure in &report.failures {
                println!(
                    "  {} -> {} ({})",
                    failure.review_id, failure.error.message, failure.error.status
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_location_health(
    health: &LocationHealth,
    format: OutputFormat,
) -> CliResult<()> {
    let grade = health_grade(health.hygiene_score);
    let rate = reply_rate(health);
    match format {
        OutputFormat::Json => print_json(&LocationHealthView {
            health,
            grade: grade.as_str(),
            reply_rate: rate,
        })?,
        OutputFormat::Table => {
            println!("location: {} ({})", health.location_name, health.location_id);
            println!("hygiene: {}/100 ({})", health.hygiene_score, grade.as_str());
            if !health.missing_fields.is_empty() {
                println!("missing: {}", health.missing_fields.join(", "));
            }
            println!(
                "reviews: {} total, {} awaiting reply, reply rate {}",
                health.total_reviews,
                health.unreplied_reviews,
                format_rate(rate)
            );
            if let Some(rating) = health.average_rating {
                println!("average rating: {rating:.1}");
            }
        }
    }
    Ok(())
}

pub(crate) fn render_suggestion(suggestion: &ReplySuggestion, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(suggestion)?,
        OutputFormat::Table => println!("{}", suggestion.suggestion),
    }
    Ok(())
}

pub(crate) fn render_metrics(metrics: &Metrics) -> CliResult<()> {
    let text = metrics
        .render()
        .map_err(|err| CliError::failure(anyhow!("failed to render metrics: {err}")))?;
    eprint!("{text}");
    Ok(())
}

/// Progress goes to stderr so JSON on stdout stays parseable.
pub(crate) fn render_progress(progress: &BulkReplyProgress) {
    eprintln!("{}", format_progress_line(progress));
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

pub(crate) fn format_review_row(review: &Review) -> String {
    let comment = review.comment.as_deref().unwrap_or("");
    format!(
        "{:<24} {:<5} {:<8} {:<20} {}",
        review.id,
        "*".repeat(usize::from(review.star_rating.min(5))),
        review.status.as_str(),
        truncate(&review.reviewer_name, 20),
        truncate(comment, COMMENT_WIDTH)
    )
}

pub(crate) fn format_page_footer(pagination: &Pagination) -> String {
    let pages = total_pages(pagination.total, pagination.limit);
    let Some((first, last)) = item_range(pagination.page, pagination.limit, pagination.total)
    else {
        return format!("no reviews on page {} of {pages}", pagination.page);
    };
    let mut links = Vec::new();
    if has_prev(pagination.page) {
        links.push("<".to_string());
    }
    links.extend(
        page_window(pagination.page, pages, PAGER_WIDTH)
            .into_iter()
            .map(|number| {
                if number == pagination.page {
                    format!("[{number}]")
                } else {
                    number.to_string()
                }
            }),
    );
    if has_next(pagination.page, pages) {
        links.push(">".to_string());
    }
    let pager = links.join(" ");
    format!(
        "showing {first}-{last} of {} | pages: {pager}",
        pagination.total
    )
}

pub(crate) fn format_progress_line(progress: &BulkReplyProgress) -> String {
    let current = progress
        .current_review
        .as_ref()
        .map_or_else(String::new, |id| format!(" {id}"));
    format!(
        "[{}/{}]{current} ok {} failed {}",
        progress.completed, progress.total, progress.succeeded, progress.failed
    )
}

pub(crate) fn format_rate(rate: Option<f64>) -> String {
    rate.map_or_else(|| "n/a".to_string(), |rate| format!("{:.0}%", rate * 100.0))
}

pub(crate) fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width.saturating_sub(3)).collect();
    short.push_str("...");
    short
}

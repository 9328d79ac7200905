//! Filter state for the review list.
//!
//! # Design
//! - Changing any filter other than the page sends the list back to page one.
//! - The search term stored here is the settled one; typing goes through
//!   [`crate::SearchDebouncer`] first.
//! - [`ReviewQueryKey`] identifies one fetched page, search included, so a
//!   caching layer can key on it directly.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use reviewdesk_api_models::ReviewListQuery;
use reviewdesk_config::FilterSettings;
use serde::Serialize;
use thiserror::Error;

/// Invalid filter input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// Star rating outside 1–5.
    #[error("star rating must be between 1 and 5, got {value}")]
    StarRatingOutOfRange {
        /// Rejected value.
        value: u8,
    },
    /// Unrecognised reply status label.
    #[error("unknown reply status '{value}'")]
    UnknownReplyStatus {
        /// Rejected label.
        value: String,
    },
    /// Page size of zero.
    #[error("page size must be at least 1")]
    EmptyPage,
}

/// Star rating in the range 1–5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StarRating(u8);

impl StarRating {
    /// Validate a raw rating.
    ///
    /// # Errors
    /// Returns [`FilterError::StarRatingOutOfRange`] outside 1–5.
    pub const fn new(value: u8) -> Result<Self, FilterError> {
        if matches!(value, 1..=5) {
            Ok(Self(value))
        } else {
            Err(FilterError::StarRatingOutOfRange { value })
        }
    }

    /// Raw rating.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

/// Reply status filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatusFilter {
    /// No restriction.
    #[default]
    All,
    /// Only reviews with a business reply.
    Replied,
    /// Only reviews still waiting for a reply.
    Unreplied,
}

impl ReplyStatusFilter {
    /// Value of the backend's `has_reply` parameter.
    #[must_use]
    pub const fn has_reply(self) -> Option<bool> {
        match self {
            Self::All => None,
            Self::Replied => Some(true),
            Self::Unreplied => Some(false),
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Replied => "replied",
            Self::Unreplied => "unreplied",
        }
    }
}

impl Display for ReplyStatusFilter {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

impl FromStr for ReplyStatusFilter {
    type Err = FilterError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "replied" => Ok(Self::Replied),
            "unreplied" => Ok(Self::Unreplied),
            _ => Err(FilterError::UnknownReplyStatus {
                value: raw.to_string(),
            }),
        }
    }
}

/// Active filters for the review list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewFilters {
    search: String,
    star_rating: Option<StarRating>,
    reply_status: ReplyStatusFilter,
    page: u32,
    per_page: u32,
}

/// Identity of one fetched review page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReviewQueryKey {
    /// Wire query sent to the backend.
    pub query: ReviewListQuery,
    /// Normalised search term applied to the fetched rows.
    pub search: String,
}

impl Default for ReviewFilters {
    fn default() -> Self {
        Self::from_settings(&FilterSettings::default())
    }
}

impl ReviewFilters {
    /// Fresh filters using the configured page size.
    #[must_use]
    pub const fn from_settings(settings: &FilterSettings) -> Self {
        Self {
            search: String::new(),
            star_rating: None,
            reply_status: ReplyStatusFilter::All,
            page: 1,
            per_page: settings.per_page,
        }
    }

    /// Settled search term.
    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Star rating restriction.
    #[must_use]
    pub const fn star_rating(&self) -> Option<StarRating> {
        self.star_rating
    }

    /// Reply status restriction.
    #[must_use]
    pub const fn reply_status(&self) -> ReplyStatusFilter {
        self.reply_status
    }

    /// Current page, 1-based.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Page size.
    #[must_use]
    pub const fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Apply a settled search term.
    pub fn set_search(&mut self, term: impl Into<String>) {
        let term = term.into();
        if term != self.search {
            self.search = term;
            self.page = 1;
        }
    }

    /// Restrict to one star rating, or clear with `None`.
    pub fn set_star_rating(&mut self, rating: Option<StarRating>) {
        if rating != self.star_rating {
            self.star_rating = rating;
            self.page = 1;
        }
    }

    /// Restrict by reply status.
    pub fn set_reply_status(&mut self, status: ReplyStatusFilter) {
        if status != self.reply_status {
            self.reply_status = status;
            self.page = 1;
        }
    }

    /// Change the page size.
    ///
    /// # Errors
    /// Returns [`FilterError::EmptyPage`] for zero.
    pub fn set_per_page(&mut self, per_page: u32) -> Result<(), FilterError> {
        if per_page == 0 {
            return Err(FilterError::EmptyPage);
        }
        if per_page != self.per_page {
            self.per_page = per_page;
            self.page = 1;
        }
        Ok(())
    }

    /// Jump to a page; zero is treated as the first page.
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Restore every filter except the page size.
    pub fn clear(&mut self) {
        self.search.clear();
        self.star_rating = None;
        self.reply_status = ReplyStatusFilter::All;
        self.page = 1;
    }

    /// Wire query for the backend list endpoint.
    #[must_use]
    pub fn to_query(&self) -> ReviewListQuery {
        ReviewListQuery {
            page: self.page,
            per_page: self.per_page,
            star_rating: self.star_rating.map(StarRating::get),
            has_reply: self.reply_status.has_reply(),
            is_deleted: None,
        }
    }

    /// Cache key for the page these filters describe.
    #[must_use]
    pub fn query_key(&self) -> ReviewQueryKey {
        ReviewQueryKey {
            query: self.to_query(),
            search: self.search.trim().to_lowercase(),
        }
    }
}

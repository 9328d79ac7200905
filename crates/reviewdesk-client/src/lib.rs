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

//! HTTP client for the review management API.
//!
//! # Design
//! - Thin typed wrappers over one `reqwest::Client`; every call returns a
//!   [`ServiceResult`] built through [`TransportError`].
//! - Path segments are percent-encoded through `url` so review ids are opaque.
//! - Implements [`ReplyTransport`] so the bulk orchestrator can drive it.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response};
use reviewdesk_api_models::{
    ErrorBody, LocationHealth, ReplyRequest, ReplySuggestion, ReviewListQuery, ReviewListResponse,
};
use reviewdesk_core::{ReplyTransport, ReviewId, ServiceResult, TransportError};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

/// Typed client for the review backend.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl ApiClient {
    /// Wrap a configured HTTP client.
    #[must_use]
    pub const fn new(http: Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            api_key: None,
        }
    }

    /// Send `key` as a bearer token on every request.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetch one page of reviews.
    ///
    /// # Errors
    /// Returns an `ApiError` for transport failures, non-2xx responses, or
    /// undecodable bodies.
    pub async fn list_reviews(&self, query: &ReviewListQuery) -> ServiceResult<ReviewListResponse> {
        let url = self.endpoint(&["api", "reviews"])?;
        let request = self.http.get(url).query(&query.query_pairs());
        Ok(decode(self.send(request).await?).await?)
    }

    /// Fetch profile health figures for a location.
    ///
    /// # Errors
    /// Returns an `ApiError` for transport failures, non-2xx responses, or
    /// undecodable bodies.
    pub async fn location_health(&self, location_id: &str) -> ServiceResult<LocationHealth> {
        let url = self.endpoint(&["api", "locations", location_id, "health"])?;
        Ok(decode(self.send(self.http.get(url)).await?).await?)
    }

    /// Ask the backend for an AI-drafted reply.
    ///
    /// # Errors
    /// Returns an `ApiError` for transport failures, non-2xx responses, or
    /// undecodable bodies.
    pub async fn suggest_reply(&self, review_id: &ReviewId) -> ServiceResult<ReplySuggestion> {
        let url = self.endpoint(&["api", "reviews", review_id.as_str(), "reply-suggestion"])?;
        Ok(decode(self.send(self.http.post(url)).await?).await?)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| TransportError::Network {
                message: format!("base URL '{}' cannot carry a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, TransportError> {
        let request = match &self.api_key {
            Some(key) => request.header(AUTHORIZATION, format!("Bearer {key}")),
            None => request,
        };
        let response = request
            .send()
            .await
            .map_err(|err| TransportError::Network {
                message: format!("request failed: {err}"),
            })?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(classify_problem(response).await)
        }
    }
}

#[async_trait]
impl ReplyTransport for ApiClient {
    async fn post_reply(
        &self,
        review_id: &ReviewId,
        request: &ReplyRequest,
    ) -> Result<(), TransportError> {
        let url = self.endpoint(&["api", "reviews", review_id.as_str(), "reply"])?;
        self.send(self.http.post(url).json(request)).await?;
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    response
        .json::<T>()
        .await
        .map_err(|err| TransportError::Network {
            message: format!("failed to decode response: {err}"),
        })
}

/// Turn a non-2xx response into a [`TransportError::Http`].
///
/// The JSON error body is optional; a plain-text body becomes the message.
async fn classify_problem(response: Response) -> TransportError {
    let status = response.status().as_u16();
    let bytes = response.bytes().await.unwrap_or_default();
    let body = serde_json::from_slice::<ErrorBody>(&bytes).ok();
    let text = String::from_utf8_lossy(&bytes).trim().to_string();
    debug!(status, "backend returned an error response");

    match body {
        Some(body) => TransportError::Http {
            status,
            message: body.message,
            code: body.code,
        },
        None => TransportError::Http {
            status,
            message: (!text.is_empty()).then_some(text),
            code: None,
        },
    }
}

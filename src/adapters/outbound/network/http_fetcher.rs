use crate::shared::error::AnalysisError;
use crate::shared::Result;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, CONTENT_LENGTH, CONTENT_RANGE, LAST_MODIFIED, RANGE};
use reqwest::{RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

/// Body and metadata of a (possibly partial) GET response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeResponse {
    pub body: Vec<u8>,
    /// Size of the whole resource, not just the returned part
    pub total_size: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Metadata returned by a HEAD request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadResponse {
    pub content_length: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// How a response status is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusClass {
    Success,
    NotFound,
    Retryable,
    Terminal,
}

/// HttpFetcher shared by all repository adapters
///
/// Wraps one `reqwest::Client` with a per-request timeout and a fixed retry
/// budget. Rate limiting (429), server errors and transport failures are
/// retried with linear back-off. A 404 becomes `AnalysisError::NotFound`,
/// any other client error `AnalysisError::Invalid`, and an exhausted budget
/// `AnalysisError::Transient`.
pub struct HttpFetcher {
    client: reqwest::Client,
    max_retries: u32,
}

impl HttpFetcher {
    /// Creates a fetcher with the given per-request timeout and attempt budget
    pub fn new(timeout: Duration, max_retries: u32) -> Result<Self> {
        let version = env!("CARGO_PKG_VERSION");
        let user_agent = format!("artifact-graph/{}", version);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            max_retries: max_retries.max(1),
        })
    }

    pub async fn get_text(&self, url: &str) -> Result<String> {
        let response = self.send_with_retry(url, || self.client.get(url)).await?;
        response
            .text()
            .await
            .map_err(|e| AnalysisError::invalid(url, format!("Failed to read body: {}", e)).into())
    }

    /// Like `get_text`, but a missing resource yields `None`
    pub async fn get_text_if_exists(&self, url: &str) -> Result<Option<String>> {
        match self.get_text(url).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Fetches bytes `0..=last_byte` of `url`.
    ///
    /// Servers ignoring the range header answer with the whole body, which
    /// is accepted as well.
    pub async fn get_prefix(&self, url: &str, last_byte: u64) -> Result<RangeResponse> {
        let range = format!("bytes=0-{}", last_byte);
        let response = self
            .send_with_retry(url, || self.client.get(url).header(RANGE, range.as_str()))
            .await?;

        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| AnalysisError::invalid(url, format!("Failed to read body: {}", e)))?
            .to_vec();

        let total_size = header_str(&headers, CONTENT_RANGE.as_str())
            .and_then(parse_content_range_total)
            .or_else(|| header_u64(&headers, CONTENT_LENGTH.as_str()))
            .or(Some(body.len() as u64));

        Ok(RangeResponse {
            body,
            total_size,
            last_modified: last_modified(&headers),
        })
    }

    pub async fn head(&self, url: &str) -> Result<HeadResponse> {
        let response = self.send_with_retry(url, || self.client.head(url)).await?;
        let headers = response.headers();

        Ok(HeadResponse {
            content_length: header_u64(headers, CONTENT_LENGTH.as_str()),
            last_modified: last_modified(headers),
        })
    }

    async fn send_with_retry<F>(&self, url: &str, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut last_error = String::new();

        for attempt in 1..=self.max_retries {
            match build().send().await {
                Ok(response) => match classify_status(response.status()) {
                    StatusClass::Success => return Ok(response),
                    StatusClass::NotFound => return Err(AnalysisError::not_found(url).into()),
                    StatusClass::Terminal => {
                        return Err(AnalysisError::invalid(
                            url,
                            format!("HTTP status {}", response.status()),
                        )
                        .into())
                    }
                    StatusClass::Retryable => {
                        last_error = format!("HTTP status {}", response.status());
                    }
                },
                Err(e) if e.is_timeout() || e.is_connect() || e.is_request() => {
                    last_error = e.to_string();
                }
                Err(e) => {
                    return Err(AnalysisError::invalid(url, e.to_string()).into());
                }
            }

            if attempt < self.max_retries {
                debug!(url, attempt, error = %last_error, "Retrying request");
                // Retry after a short wait
                tokio::time::sleep(Duration::from_millis(100 * attempt as u64)).await;
            }
        }

        warn!(url, attempts = self.max_retries, error = %last_error, "Request failed");
        Err(AnalysisError::Transient {
            subject: url.to_string(),
            attempts: self.max_retries,
            details: last_error,
        }
        .into())
    }
}

/// Returns true if `error` wraps `AnalysisError::NotFound`
pub fn is_not_found(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<AnalysisError>(),
        Some(AnalysisError::NotFound { .. })
    )
}

fn classify_status(status: StatusCode) -> StatusClass {
    if status.is_success() {
        StatusClass::Success
    } else if status == StatusCode::NOT_FOUND {
        StatusClass::NotFound
    } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        StatusClass::Retryable
    } else {
        StatusClass::Terminal
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    header_str(headers, name).and_then(|value| value.trim().parse().ok())
}

fn last_modified(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    header_str(headers, LAST_MODIFIED.as_str()).and_then(parse_http_date)
}

/// Total length from `Content-Range: bytes 0-8095/123456`
fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse().ok()
}

/// Parses an RFC 1123 date such as `Wed, 21 Oct 2015 07:28:00 GMT`
fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

//! Page fetching over a reusable browser-like HTTP session

use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CONNECTION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT,
    UPGRADE_INSECURE_REQUESTS,
};
use reqwest::{Client, StatusCode, redirect};
use tracing::{debug, instrument};
use url::Url;

use crate::crawler::CrawlerConfig;
use crate::crawler::error::CrawlError;

/// Normalize a user-supplied URL.
///
/// Trims whitespace, adds `https://` when no http(s) scheme is present and
/// strips trailing slashes. The result must have a host.
pub fn normalize_url(raw: &str) -> Result<Url, CrawlError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CrawlError::InvalidUrl("empty URL".to_string()));
    }

    let lower = trimmed.to_ascii_lowercase();
    let with_scheme = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let cleaned = with_scheme.trim_end_matches(['/', ' ']);
    let url = Url::parse(cleaned)?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(CrawlError::InvalidUrl(raw.to_string()));
    }
    Ok(url)
}

/// Coarse classification of an HTTP status code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 2xx
    Success,
    /// 404
    NotFound,
    /// 403
    Forbidden,
    /// Anything else
    OtherError(u16),
}

impl From<StatusCode> for StatusClass {
    fn from(status: StatusCode) -> Self {
        match status {
            s if s.is_success() => StatusClass::Success,
            StatusCode::NOT_FOUND => StatusClass::NotFound,
            StatusCode::FORBIDDEN => StatusClass::Forbidden,
            s => StatusClass::OtherError(s.as_u16()),
        }
    }
}

/// Result of one fetch attempt
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// URL after redirects
    pub final_url: Url,

    /// Status class of the response
    pub status: StatusClass,

    /// Lowercased Content-Type header, empty when absent
    pub content_type: String,

    /// Raw body; only read for successful HTML responses
    pub body: Option<Vec<u8>>,
}

impl FetchResult {
    /// Whether the content type is HTML
    pub fn is_html(&self) -> bool {
        self.content_type.contains("text/html") || self.content_type.contains("application/xhtml+xml")
    }
}

/// What the crawl loop should do with a fetch attempt
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// 2xx HTML response with a body
    Success(FetchResult),

    /// 404
    NotFound,

    /// 403
    Forbidden,

    /// Any other unsuccessful status
    HttpStatus(u16),

    /// Successful response that is not HTML
    WrongContentType(String),

    /// Network failure or timeout
    Failed(String),
}

impl From<FetchResult> for FetchOutcome {
    fn from(result: FetchResult) -> Self {
        match result.status {
            StatusClass::NotFound => FetchOutcome::NotFound,
            StatusClass::Forbidden => FetchOutcome::Forbidden,
            StatusClass::OtherError(code) => FetchOutcome::HttpStatus(code),
            StatusClass::Success if !result.is_html() => {
                FetchOutcome::WrongContentType(result.content_type)
            }
            StatusClass::Success => FetchOutcome::Success(result),
        }
    }
}

/// HTTP session shared by every request of a crawler
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Build the session with browser-emulating default headers
    pub fn new(config: &CrawlerConfig) -> Result<Self, CrawlError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value(&config.user_agent)?);
        headers.insert(ACCEPT, header_value(&config.accept)?);
        headers.insert(ACCEPT_LANGUAGE, header_value(&config.accept_language)?);
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

        // Accept-Encoding is added by the client along with transparent decoding
        let client = Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .redirect(redirect::Policy::limited(config.max_redirects))
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { client })
    }

    /// Fetch a page once. Never fails; errors become `FetchOutcome::Failed`.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch(&self, url: &Url) -> FetchOutcome {
        match self.get(url).await {
            Ok(result) => {
                debug!(status = ?result.status, content_type = %result.content_type, "Fetched {}", url);
                FetchOutcome::from(result)
            }
            Err(e) => {
                let reason = if e.is_timeout() {
                    "timed out".to_string()
                } else {
                    e.to_string()
                };
                debug!("Failed to fetch {}: {}", url, reason);
                FetchOutcome::Failed(reason)
            }
        }
    }

    async fn get(&self, url: &Url) -> Result<FetchResult, reqwest::Error> {
        let response = self.client.get(url.clone()).send().await?;

        let status = StatusClass::from(response.status());
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let mut result = FetchResult {
            final_url,
            status,
            content_type,
            body: None,
        };

        if result.status == StatusClass::Success && result.is_html() {
            let bytes = response.bytes().await?;
            debug!("Fetched {} bytes from {}", bytes.len(), result.final_url);
            result.body = Some(bytes.to_vec());
        }

        Ok(result)
    }
}

fn header_value(value: &str) -> Result<HeaderValue, CrawlError> {
    HeaderValue::from_str(value)
        .map_err(|e| CrawlError::Other(format!("invalid header value '{}': {}", value, e)))
}

//! HTTP utilities for GitLab REST API calls

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::auth::Credentials;
use super::pagination::ListPage;
use super::query::Query;
use crate::error::{is_transient_status, GitlabError, Result};

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.chars().count() > MAX_LOG_BODY_LENGTH {
        let head: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
        format!("{}... [truncated, {} bytes total]", head, body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Retry behaviour for failed requests
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Upper bound on retries; `None` retries forever
    pub max_retries: Option<u32>,
    /// Retry 429 responses, waiting as instructed by the server
    pub obey_rate_limit: bool,
    /// Retry 5xx, Cloudflare 52x, "Resource lock" 409 and connection errors
    pub retry_transient_errors: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: Some(10),
            obey_rate_limit: true,
            retry_transient_errors: false,
        }
    }
}

impl RetryConfig {
    fn allows(&self, attempt: u32) -> bool {
        self.max_retries.map_or(true, |max| attempt < max)
    }

    fn should_retry(&self, status: u16, body: &str) -> bool {
        if status == StatusCode::TOO_MANY_REQUESTS.as_u16() && self.obey_rate_limit {
            return true;
        }
        if !self.retry_transient_errors {
            return false;
        }
        is_transient_status(status, body)
    }

    /// Delay before the next attempt.
    ///
    /// `Retry-After` wins, then `RateLimit-Reset` (epoch seconds), then an
    /// exponential `0.1s * 2^attempt`.
    pub fn wait_time(&self, attempt: u32, headers: &HeaderMap) -> Duration {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<i64>().ok())
        };

        if let Some(secs) = header("retry-after") {
            return Duration::from_secs(secs.max(0).unsigned_abs());
        }
        if let Some(reset) = header("ratelimit-reset") {
            let delta = reset - chrono::Utc::now().timestamp();
            return Duration::from_secs(delta.max(0).unsigned_abs());
        }
        Duration::from_secs_f64(0.1 * 2f64.powi(attempt.min(16) as i32))
    }
}

/// HTTP client wrapper for GitLab API calls
#[derive(Clone)]
pub struct GitlabHttpClient {
    client: Client,
    api_url: String,
    credentials: Credentials,
    retry: RetryConfig,
}

impl GitlabHttpClient {
    /// Create a new HTTP client rooted at `api_url` (e.g. `https://gitlab.com/api/v4`)
    pub fn new(
        api_url: &str,
        credentials: Credentials,
        timeout: Option<Duration>,
        retry: RetryConfig,
    ) -> Result<Self> {
        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            api_url: api_url.trim_end_matches('/').to_string(),
            credentials,
            retry,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Absolute URLs (pagination links) pass through untouched
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.api_url, path)
        }
    }

    /// Send a request, retrying as configured, and fail on non-2xx statuses
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &Query,
        body: Option<&Value>,
    ) -> Result<Response> {
        let url = self.build_url(path);
        let mut attempt: u32 = 0;

        loop {
            tracing::debug!("{} {}", method, url);

            let mut request = self.client.request(method.clone(), &url).query(query);
            if let Some(body) = body {
                request = request.json(body);
            }
            request = self.credentials.apply(request);

            let response = match request.send().await {
                Ok(response) => response,
                Err(err) if self.retry.retry_transient_errors && self.retry.allows(attempt) => {
                    let wait = self.retry.wait_time(attempt, &HeaderMap::new());
                    tracing::warn!("{} {} failed ({}), retrying in {:?}", method, url, err, wait);
                    attempt += 1;
                    tokio::time::sleep(wait).await;
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();

            if self.retry.should_retry(status.as_u16(), &text) && self.retry.allows(attempt) {
                let wait = self.retry.wait_time(attempt, &headers);
                tracing::warn!("{} {} returned {}, retrying in {:?}", method, url, status, wait);
                attempt += 1;
                tokio::time::sleep(wait).await;
                continue;
            }

            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&text));
            return Err(error_from_response(status, text));
        }
    }

    /// GET and parse a JSON body
    pub async fn get_json(&self, path: &str, query: &Query) -> Result<Value> {
        let response = self.request(Method::GET, path, query, None).await?;
        parse_json(response).await
    }

    /// GET without interpreting the body (raw files, artifacts, traces)
    pub async fn get_raw(&self, path: &str, query: &Query) -> Result<Response> {
        self.request(Method::GET, path, query, None).await
    }

    /// HEAD, returning only the response headers
    pub async fn head(&self, path: &str, query: &Query) -> Result<HeaderMap> {
        let response = self.request(Method::HEAD, path, query, None).await?;
        Ok(response.headers().clone())
    }

    /// GET a binary payload into memory
    pub async fn get_bytes(&self, path: &str, query: &Query) -> Result<Vec<u8>> {
        let response = self.get_raw(path, query).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// GET a binary payload, writing it chunk by chunk to `writer`.
    /// Returns the number of bytes written.
    pub async fn download<W>(&self, path: &str, query: &Query, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin + Send + ?Sized,
    {
        let mut response = self.get_raw(path, query).await?;
        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;
        tracing::debug!("downloaded {} bytes from {}", written, path);
        Ok(written)
    }

    /// POST; non-JSON replies come back as `null`
    pub async fn post(&self, path: &str, query: &Query, body: Option<&Value>) -> Result<Value> {
        let response = self.request(Method::POST, path, query, body).await?;
        parse_json_reply(response).await
    }

    /// PUT; non-JSON replies come back as `null`
    pub async fn put(&self, path: &str, query: &Query, body: Option<&Value>) -> Result<Value> {
        let response = self.request(Method::PUT, path, query, body).await?;
        parse_json_reply(response).await
    }

    /// DELETE; the response body is never read
    pub async fn delete(&self, path: &str, query: &Query) -> Result<()> {
        self.request(Method::DELETE, path, query, None).await?;
        Ok(())
    }

    /// GET one page of a list endpoint
    pub async fn list(&self, path: &str, query: &Query) -> Result<ListPage<Value>> {
        let response = self.request(Method::GET, path, query, None).await?;
        let headers = response.headers().clone();

        match parse_json(response).await? {
            Value::Array(items) => Ok(ListPage::from_headers(items, &headers)),
            other => Err(GitlabError::Parsing(format!(
                "expected a JSON array from {path}, got {}",
                json_type(&other)
            ))),
        }
    }
}

/// Parse a response body as JSON; an empty body is `null`
async fn parse_json(response: Response) -> Result<Value> {
    let body = response.text().await?;
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body).map_err(|e| GitlabError::Parsing(e.to_string()))
}

/// Parse the body only when the server labels it as JSON
async fn parse_json_reply(response: Response) -> Result<Value> {
    if is_json(response.headers()) {
        parse_json(response).await
    } else {
        Ok(Value::Null)
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Build the error for a failed response.
///
/// The message is the JSON `message` or `error` field when the body carries
/// one, the raw body otherwise.
pub fn error_from_response(status: StatusCode, body: String) -> GitlabError {
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|json| {
            ["message", "error"].iter().find_map(|key| match json.get(key) {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Null) | None => None,
                Some(other) => Some(other.to_string()),
            })
        })
        .unwrap_or_else(|| {
            if body.is_empty() {
                status.to_string()
            } else {
                body.clone()
            }
        });

    if status == StatusCode::UNAUTHORIZED {
        GitlabError::Authentication {
            status: status.as_u16(),
            message,
            body,
        }
    } else {
        GitlabError::Http {
            status: status.as_u16(),
            message,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.starts_with(&"x".repeat(MAX_LOG_BODY_LENGTH)));
        assert!(sanitized.contains("500 bytes total"));
    }

    #[test]
    fn test_sanitize_handles_multibyte_boundary() {
        let body = "é".repeat(300);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.contains("truncated"));
    }

    #[test]
    fn test_error_message_from_json_message() {
        let err = error_from_response(
            StatusCode::BAD_REQUEST,
            r#"{"message": {"title": ["can't be blank"]}}"#.to_string(),
        );
        match err {
            GitlabError::Http { status, message, .. } => {
                assert_eq!(status, 400);
                assert!(message.contains("can't be blank"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_message_from_json_error() {
        let err = error_from_response(
            StatusCode::FORBIDDEN,
            r#"{"error": "insufficient_scope"}"#.to_string(),
        );
        assert_eq!(err.to_string(), "HTTP 403: insufficient_scope");
    }

    #[test]
    fn test_401_is_authentication_error() {
        let err = error_from_response(StatusCode::UNAUTHORIZED, "{\"message\":\"401 Unauthorized\"}".into());
        assert!(matches!(err, GitlabError::Authentication { status: 401, .. }));
    }

    #[test]
    fn test_plain_body_is_message() {
        let err = error_from_response(StatusCode::BAD_GATEWAY, "upstream down".into());
        assert_eq!(err.to_string(), "HTTP 502: upstream down");
    }

    #[test]
    fn test_should_retry_rate_limit_only_by_default() {
        let retry = RetryConfig::default();
        assert!(retry.should_retry(429, ""));
        assert!(!retry.should_retry(500, ""));
        assert!(!retry.should_retry(409, "Resource lock"));
    }

    #[test]
    fn test_should_retry_transient_when_enabled() {
        let retry = RetryConfig {
            retry_transient_errors: true,
            ..Default::default()
        };
        assert!(retry.should_retry(502, ""));
        assert!(retry.should_retry(524, ""));
        assert!(retry.should_retry(409, "{\"message\":\"Resource lock\"}"));
        assert!(!retry.should_retry(409, "{\"message\":\"exists\"}"));
        assert!(!retry.should_retry(404, ""));
    }

    #[test]
    fn test_allows_respects_max_retries() {
        let retry = RetryConfig {
            max_retries: Some(2),
            ..Default::default()
        };
        assert!(retry.allows(0));
        assert!(retry.allows(1));
        assert!(!retry.allows(2));

        let unbounded = RetryConfig {
            max_retries: None,
            ..Default::default()
        };
        assert!(unbounded.allows(1_000));
    }

    #[test]
    fn test_wait_time_prefers_retry_after() {
        let retry = RetryConfig::default();
        let mut headers = HeaderMap::new();
        headers.insert("Retry-After", HeaderValue::from_static("7"));
        assert_eq!(retry.wait_time(3, &headers), Duration::from_secs(7));
    }

    #[test]
    fn test_wait_time_exponential_backoff() {
        let retry = RetryConfig::default();
        let headers = HeaderMap::new();
        assert_eq!(retry.wait_time(0, &headers), Duration::from_millis(100));
        assert_eq!(retry.wait_time(2, &headers), Duration::from_millis(400));
    }

    #[test]
    fn test_wait_time_rate_limit_reset_in_past_is_zero() {
        let retry = RetryConfig::default();
        let mut headers = HeaderMap::new();
        headers.insert("RateLimit-Reset", HeaderValue::from_static("1"));
        assert_eq!(retry.wait_time(0, &headers), Duration::ZERO);
    }

    #[test]
    fn test_build_url() {
        let client = GitlabHttpClient::new(
            "https://gitlab.example.com/api/v4/",
            Credentials::None,
            None,
            RetryConfig::default(),
        )
        .unwrap();
        assert_eq!(
            client.build_url("/projects/1/jobs"),
            "https://gitlab.example.com/api/v4/projects/1/jobs"
        );
        assert_eq!(
            client.build_url("https://gitlab.example.com/api/v4/projects/1/jobs?page=2"),
            "https://gitlab.example.com/api/v4/projects/1/jobs?page=2"
        );
    }

    #[test]
    fn test_is_json_content_type() {
        let mut headers = HeaderMap::new();
        assert!(!is_json(&headers));

        headers.insert("content-type", HeaderValue::from_static("text/plain; charset=utf-8"));
        assert!(!is_json(&headers));

        headers.insert("content-type", HeaderValue::from_static("application/json"));
        assert!(is_json(&headers));
    }
}

//! Rate-limited, retrying REST transport shared by both platform clients.
//!
//! Policy: a configurable inter-request delay enforces platform rate limits;
//! 429 and 5xx responses are retried with exponential backoff (honoring
//! `Retry-After`) up to `max_retries` extra attempts, then surface as
//! [`MigrateError::Transient`]. 401/403 surface as [`MigrateError::Auth`]
//! and abort the run. Other 4xx are rejected without retry.

use crate::error::{MigrateError, Result};
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode, Url};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry policy for transient failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure.
    pub max_retries: u32,
    /// Base backoff delay; doubles per attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry `attempt` (0-based): `base * 2^attempt`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// True if the error is worth another attempt.
fn is_retryable(err: &MigrateError) -> bool {
    match err {
        MigrateError::Transient { .. } => true,
        MigrateError::Http(e) => e.is_connect() || e.is_timeout(),
        _ => false,
    }
}

/// Run `op` with retries per `policy`.
///
/// The operation is attempted at most `max_retries + 1` times. Only
/// transient-classed errors are retried; anything else propagates
/// immediately. When the budget is exhausted the last error is surfaced
/// as [`MigrateError::Transient`] with the attempt count.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.max_retries + 1;
    let mut last_message = String::new();

    for attempt in 0..attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if is_retryable(&err) => {
                last_message = err.to_string();
                if attempt + 1 < attempts {
                    // Prefer the server's Retry-After over our own backoff.
                    let wait = match &err {
                        MigrateError::Transient {
                            retry_after: Some(ra),
                            ..
                        } => (*ra).max(policy.backoff_delay(attempt)),
                        _ => policy.backoff_delay(attempt),
                    };
                    warn!(
                        "Request failed (attempt {}/{}), retrying in {:?}: {}",
                        attempt + 1,
                        attempts,
                        wait,
                        last_message
                    );
                    tokio::time::sleep(wait).await;
                }
            }
            Err(err) => return Err(err),
        }
    }

    Err(MigrateError::Transient {
        message: last_message,
        attempts,
        retry_after: None,
    })
}

/// Authentication scheme for a platform API.
#[derive(Clone)]
pub enum Auth {
    /// Bearer-style token sent in a named header (Shopify).
    Header {
        name: &'static str,
        token: String,
    },
    /// HTTP basic auth with key/secret (WooCommerce).
    Basic { user: String, password: String },
}

/// A page of raw items plus the cursor for the next page, if any.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub items: Vec<Value>,
    pub next_cursor: Option<String>,
}

/// Low-level JSON REST client with delay, retry and status classification.
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    base_url: Url,
    auth: Auth,
    request_delay: Duration,
    policy: RetryPolicy,
}

impl RestClient {
    pub fn new(
        base_url: &str,
        auth: Auth,
        request_delay: Duration,
        policy: RetryPolicy,
    ) -> Result<Self> {
        // A trailing slash keeps Url::join appending instead of replacing
        // the last path segment.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| MigrateError::Config(format!("invalid base URL '{}': {}", normalized, e)))?;
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("shopify-wc-migrate")
            .build()?;
        Ok(Self {
            http,
            base_url,
            auth,
            request_delay,
            policy,
        })
    }

    /// GET a JSON document, returning the body and response headers.
    pub async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<(Value, HeaderMap)> {
        with_retry(&self.policy, || self.execute(Method::GET, path, query, None)).await
    }

    /// Send a JSON body (POST/PUT), returning the response body.
    pub async fn send_json(&self, method: Method, path: &str, body: &Value) -> Result<Value> {
        let (value, _) =
            with_retry(&self.policy, || {
                self.execute(method.clone(), path, &[], Some(body))
            })
            .await?;
        Ok(value)
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<(Value, HeaderMap)> {
        // Inter-request delay enforces the platform rate limit.
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }

        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| MigrateError::Config(format!("invalid path '{}': {}", path, e)))?;

        let mut request = self.http.request(method.clone(), url);
        request = match &self.auth {
            Auth::Header { name, token } => request.header(*name, token.clone()),
            Auth::Basic { user, password } => request.basic_auth(user, Some(password)),
        };
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!("{} {}", method, path);
        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();

        if status.is_success() {
            let value = if headers
                .get(reqwest::header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                == Some("0")
            {
                Value::Null
            } else {
                response.json().await.unwrap_or(Value::Null)
            };
            return Ok((value, headers));
        }

        let retry_after = parse_retry_after(&headers);
        let message = response.text().await.unwrap_or_default();
        Err(classify_status(status, retry_after, message))
    }
}

/// Map a non-success HTTP status to the engine error taxonomy.
pub fn classify_status(
    status: StatusCode,
    retry_after: Option<Duration>,
    message: String,
) -> MigrateError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            MigrateError::auth(status.as_u16(), message)
        }
        StatusCode::TOO_MANY_REQUESTS => MigrateError::Transient {
            message: format!("rate limited: {}", message),
            attempts: 1,
            retry_after,
        },
        s if s.is_server_error() => MigrateError::Transient {
            message: format!("server error {}: {}", s.as_u16(), message),
            attempts: 1,
            retry_after: None,
        },
        s => MigrateError::rejected(s.as_u16(), message),
    }
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Extract the `page_info` cursor from a `Link` response header, if the
/// header advertises a next page.
///
/// Shopify paginates with `Link: <https://...?page_info=abc&limit=50>;
/// rel="next"` (optionally alongside a `rel="previous"` entry).
pub fn next_page_cursor(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(reqwest::header::LINK)?.to_str().ok()?;
    for part in link.split(',') {
        if !part.contains("rel=\"next\"") {
            continue;
        }
        let url = part.split('<').nth(1)?.split('>').next()?;
        let parsed = Url::parse(url).ok()?;
        for (key, value) in parsed.query_pairs() {
            if key == "page_info" {
                return Some(value.into_owned());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, LINK, RETRY_AFTER};
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_backoff_schedule_doubles() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(policy.backoff_delay(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_bound_is_max_retries_plus_one() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(10),
        };
        let calls = AtomicU32::new(0);

        let result: Result<()> = with_retry(&policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(MigrateError::Transient {
                    message: "always down".into(),
                    attempts: 1,
                    retry_after: None,
                })
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match result {
            Err(MigrateError::Transient { attempts, .. }) => assert_eq!(attempts, 4),
            other => panic!("expected transient exhaustion, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_non_retryable_error_propagates_immediately() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);

        let result: Result<()> = with_retry(&policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(MigrateError::rejected(422, "bad sku")) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(MigrateError::Rejected { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_succeeds_after_transient_failures() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(10),
        };
        let calls = AtomicU32::new(0);

        let result = with_retry(&policy, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(MigrateError::Transient {
                        message: "blip".into(),
                        attempts: 1,
                        retry_after: None,
                    })
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_classify_statuses() {
        let auth = classify_status(StatusCode::UNAUTHORIZED, None, "no".into());
        assert!(matches!(auth, MigrateError::Auth { status: 401, .. }));

        let limited = classify_status(
            StatusCode::TOO_MANY_REQUESTS,
            Some(Duration::from_secs(30)),
            "slow down".into(),
        );
        assert!(matches!(
            limited,
            MigrateError::Transient {
                retry_after: Some(_),
                ..
            }
        ));

        let server = classify_status(StatusCode::BAD_GATEWAY, None, "".into());
        assert!(matches!(server, MigrateError::Transient { .. }));

        let rejected = classify_status(StatusCode::UNPROCESSABLE_ENTITY, None, "dup".into());
        assert!(matches!(rejected, MigrateError::Rejected { status: 422, .. }));
    }

    #[test]
    fn test_retry_after_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("17"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(17)));
        headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn test_next_page_cursor_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            LINK,
            HeaderValue::from_static(
                "<https://x.myshopify.com/admin/api/2023-10/products.json?page_info=prev123&limit=50>; rel=\"previous\", \
                 <https://x.myshopify.com/admin/api/2023-10/products.json?page_info=next456&limit=50>; rel=\"next\"",
            ),
        );
        assert_eq!(next_page_cursor(&headers).as_deref(), Some("next456"));
    }

    #[test]
    fn test_no_next_page_cursor_on_last_page() {
        let mut headers = HeaderMap::new();
        headers.insert(
            LINK,
            HeaderValue::from_static(
                "<https://x.myshopify.com/admin/api/2023-10/products.json?page_info=prev123>; rel=\"previous\"",
            ),
        );
        assert_eq!(next_page_cursor(&headers), None);
        assert_eq!(next_page_cursor(&HeaderMap::new()), None);
    }
}

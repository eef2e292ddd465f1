use crate::config::Config;
use crate::error::FetchError;
use crate::types::RateMeta;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

pub const KEY_STATUS_PATH: &str = "/key";
const MAX_BACKOFF_MS: u64 = 5_000;

#[derive(Debug, Clone)]
pub struct KeyStatusResponse {
    pub value: Value,
    pub status: StatusCode,
    pub rate: RateMeta,
}

pub fn build_client(cfg: &Config) -> Result<Client, FetchError> {
    let mut default_headers = HeaderMap::new();
    if let Ok(ua) = HeaderValue::from_str(&cfg.user_agent) {
        default_headers.insert(USER_AGENT, ua);
    } else {
        warn!("Ignoring user agent with invalid header characters");
    }
    // Authorization header is injected per request.
    let mut builder = Client::builder()
        .default_headers(default_headers)
        .use_rustls_tls();
    // 0 disables the request timeout.
    if cfg.timeout_secs > 0 {
        builder = builder.timeout(Duration::from_secs(cfg.timeout_secs));
    }
    builder.build().map_err(FetchError::Client)
}

pub fn key_status_url(cfg: &Config) -> String {
    format!("{}{}", cfg.api_url.trim_end_matches('/'), KEY_STATUS_PATH)
}

pub fn auth_header(token: &str) -> Result<HeaderValue, FetchError> {
    let mut value =
        HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| FetchError::InvalidToken)?;
    value.set_sensitive(true);
    Ok(value)
}

pub fn map_status_to_error(status: StatusCode, body: String) -> FetchError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FetchError::Unauthorized { status, body },
        _ => FetchError::Status { status, body },
    }
}

pub fn extract_rate_meta(headers: &HeaderMap) -> RateMeta {
    let header_i64 = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<i64>().ok())
    };
    // Reset arrives as an epoch; values past 10^11 are milliseconds.
    let reset_at = header_i64("x-ratelimit-reset").and_then(|epoch| {
        let secs = if epoch > 100_000_000_000 { epoch / 1000 } else { epoch };
        chrono::DateTime::<chrono::Utc>::from_timestamp(secs, 0).map(|dt| dt.to_rfc3339())
    });
    RateMeta {
        limit: header_i64("x-ratelimit-limit"),
        remaining: header_i64("x-ratelimit-remaining"),
        reset_at,
    }
}

fn compute_backoff(attempt: u32, retry_after: Option<Duration>) -> Duration {
    if let Some(d) = retry_after {
        return d.min(Duration::from_millis(MAX_BACKOFF_MS));
    }
    // Exponential backoff with jitter: base 200ms * 2^attempt, max 5s.
    let base = 200u64.saturating_mul(1u64 << attempt.min(5));
    let max = MAX_BACKOFF_MS.min(base);
    let jitter = fastrand::u64(0..=max / 2);
    Duration::from_millis(max / 2 + jitter)
}

/// GET the key-status endpoint and decode the body as opaque JSON.
///
/// One attempt unless `cfg.max_retries > 0`, in which case transport
/// errors (including a body cut short), 429 and 5xx are retried with backoff.
pub async fn fetch_key_status(
    client: &Client,
    cfg: &Config,
) -> Result<KeyStatusResponse, FetchError> {
    let url = key_status_url(cfg);
    let auth = auth_header(&cfg.token)?;
    let mut attempt: u32 = 0;
    loop {
        debug!("GET {} (attempt {})", url, attempt + 1);
        let res = client
            .get(&url)
            .header(AUTHORIZATION, auth.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await;

        let res = match res {
            Ok(r) => r,
            Err(e) => {
                if attempt < cfg.max_retries {
                    let backoff = compute_backoff(attempt, None);
                    warn!("GET {} failed: {}; retrying in {:?}", url, e, backoff);
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                    continue;
                }
                return Err(FetchError::Network(e));
            }
        };

        let status = res.status();
        let headers = res.headers().clone();
        let rate = extract_rate_meta(&headers);
        if !rate.is_empty() {
            debug!(
                "Rate limit: limit={:?} remaining={:?} reset_at={:?}",
                rate.limit, rate.remaining, rate.reset_at
            );
        }
        let retry_after = headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs);

        let text = match res.text().await {
            Ok(t) => t,
            Err(e) => {
                if attempt < cfg.max_retries {
                    let backoff = compute_backoff(attempt, retry_after);
                    warn!(
                        "GET {} body read failed (status {}): {}; retrying in {:?}",
                        url, status, e, backoff
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                    continue;
                }
                return Err(FetchError::Network(e));
            }
        };

        if status.is_success() {
            return match serde_json::from_str::<Value>(&text) {
                Ok(value) => Ok(KeyStatusResponse {
                    value,
                    status,
                    rate,
                }),
                Err(source) => Err(FetchError::Parse { source, body: text }),
            };
        }

        let err = map_status_to_error(status, text);
        if err.retriable() && attempt < cfg.max_retries {
            let backoff = compute_backoff(attempt, retry_after);
            warn!(
                "GET {} retrying (status {}), backoff {:?}",
                url, status, backoff
            );
            tokio::time::sleep(backoff).await;
            attempt += 1;
            continue;
        }
        return Err(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(api_url: &str) -> Config {
        Config {
            token: "t".into(),
            api_url: api_url.into(),
            user_agent: "test".into(),
            timeout_secs: 5,
            max_retries: 0,
        }
    }

    #[test]
    fn zero_timeout_still_builds_a_client() {
        let mut c = cfg("https://openrouter.ai/api/v1");
        c.timeout_secs = 0;
        assert!(build_client(&c).is_ok());
    }

    #[test]
    fn url_is_fixed_key_path() {
        assert_eq!(
            key_status_url(&cfg("https://openrouter.ai/api/v1")),
            "https://openrouter.ai/api/v1/key"
        );
        assert_eq!(
            key_status_url(&cfg("https://openrouter.ai/api/v1/")),
            "https://openrouter.ai/api/v1/key"
        );
    }

    #[test]
    fn auth_header_has_bearer_prefix() {
        let h = auth_header("sk-or-abc").unwrap();
        assert_eq!(h.to_str().unwrap(), "Bearer sk-or-abc");
        assert!(h.is_sensitive());
        assert!(matches!(auth_header("bad\ntoken"), Err(FetchError::InvalidToken)));
    }

    #[test]
    fn error_mapping_matrix() {
        let e = map_status_to_error(StatusCode::UNAUTHORIZED, "".into());
        assert_eq!(e.code(), "unauthorized");
        assert!(!e.retriable());
        assert_eq!(map_status_to_error(StatusCode::FORBIDDEN, "".into()).code(), "unauthorized");
        assert_eq!(map_status_to_error(StatusCode::BAD_REQUEST, "".into()).code(), "bad_request");
        assert_eq!(map_status_to_error(StatusCode::NOT_FOUND, "".into()).code(), "not_found");
        let rl = map_status_to_error(StatusCode::TOO_MANY_REQUESTS, "".into());
        assert_eq!(rl.code(), "rate_limited");
        assert!(rl.retriable());
        let s5 = map_status_to_error(StatusCode::BAD_GATEWAY, "".into());
        assert_eq!(s5.code(), "upstream_error");
        assert!(s5.retriable());
    }

    #[test]
    fn rate_headers_seconds_and_millis() {
        let mut h = HeaderMap::new();
        h.insert("x-ratelimit-limit", "20".parse().unwrap());
        h.insert("x-ratelimit-remaining", "19".parse().unwrap());
        h.insert("x-ratelimit-reset", "0".parse().unwrap());
        let rate = extract_rate_meta(&h);
        assert_eq!(rate.limit, Some(20));
        assert_eq!(rate.remaining, Some(19));
        assert_eq!(rate.reset_at.as_deref(), Some("1970-01-01T00:00:00+00:00"));

        let mut ms = HeaderMap::new();
        ms.insert("x-ratelimit-reset", "1700000000000".parse().unwrap());
        let secs = {
            let mut s = HeaderMap::new();
            s.insert("x-ratelimit-reset", "1700000000".parse().unwrap());
            extract_rate_meta(&s)
        };
        assert_eq!(extract_rate_meta(&ms).reset_at, secs.reset_at);

        assert!(extract_rate_meta(&HeaderMap::new()).is_empty());
    }

    #[test]
    fn backoff_honors_retry_after_and_caps() {
        assert_eq!(
            compute_backoff(0, Some(Duration::from_secs(3))),
            Duration::from_secs(3)
        );
        assert_eq!(
            compute_backoff(0, Some(Duration::from_secs(86_400))),
            Duration::from_secs(5)
        );
        for attempt in 0..10 {
            let d = compute_backoff(attempt, None);
            assert!(d <= Duration::from_millis(5_000));
            assert!(d >= Duration::from_millis(100));
        }
    }
}

//! Shared HTTP layer for the market data clients
//!
//! Sliding-window rate limiting, rotating user agents, a per-client cookie
//! jar and retry with exponential backoff.

use isahc::{config::Configurable, prelude::*, AsyncBody, HttpClient};
use rand::seq::SliceRandom;
use serde_json::Value;
use std::time::{Duration as StdDuration, SystemTime};
use tokio::time::sleep;

use super::provider::ProviderError;

const MAX_RETRIES: u32 = 4;
const REQUEST_TIMEOUT_SECS: u64 = 30;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.3 Safari/605.1.15",
];

/// Sliding-window limiter: at most `per_minute` requests in any 60s window
#[derive(Debug)]
pub struct RateLimiter {
    request_timestamps: Vec<SystemTime>,
    per_minute: u32,
}

impl RateLimiter {
    pub fn new(per_minute: u32) -> Self {
        Self {
            request_timestamps: Vec::new(),
            per_minute: per_minute.max(1),
        }
    }

    /// How long the next request has to wait, given the current time
    fn wait_time(&mut self, now: SystemTime) -> StdDuration {
        let window = StdDuration::from_secs(60);

        self.request_timestamps.retain(|&timestamp| {
            now.duration_since(timestamp)
                .unwrap_or(StdDuration::from_secs(0))
                < window
        });

        if self.request_timestamps.len() < self.per_minute as usize {
            return StdDuration::ZERO;
        }

        match self.request_timestamps.first() {
            Some(&oldest) => {
                window.saturating_sub(now.duration_since(oldest).unwrap_or(StdDuration::ZERO))
            }
            None => StdDuration::ZERO,
        }
    }

    pub async fn acquire(&mut self) {
        let wait = self.wait_time(SystemTime::now());
        if !wait.is_zero() {
            tracing::debug!("Rate limit reached, waiting {:.1}s", wait.as_secs_f64());
            sleep(wait + StdDuration::from_millis(100)).await;
        }
        self.request_timestamps.push(SystemTime::now());
    }
}

/// Outcome of a single attempt, deciding whether to retry
enum Attempt {
    Done(String),
    Retry(String),
    RateLimited(String),
}

pub struct HttpFetcher {
    client: HttpClient,
    limiter: RateLimiter,
    label: &'static str,
}

impl HttpFetcher {
    pub fn new(label: &'static str, rate_limit_per_minute: u32) -> Result<Self, ProviderError> {
        let client = HttpClient::builder()
            .timeout(StdDuration::from_secs(REQUEST_TIMEOUT_SECS))
            .cookies()
            .build()?;

        Ok(Self {
            client,
            limiter: RateLimiter::new(rate_limit_per_minute),
            label,
        })
    }

    fn user_agent() -> &'static str {
        USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENTS[0])
    }

    pub async fn get_json(&mut self, url: &str) -> Result<Value, ProviderError> {
        self.request("GET", url, None, &[], decode_json).await
    }

    /// GET a plain-text body, with the same retry policy as JSON requests
    pub async fn get_text(&mut self, url: &str) -> Result<String, ProviderError> {
        self.request("GET", url, None, &[], Ok).await
    }

    /// Single GET whose only purpose is the cookies it sets. The status is
    /// ignored; a failure is logged and left to surface on the next request.
    pub async fn prime_cookies(&mut self, url: &str) {
        self.limiter.acquire().await;
        tracing::debug!("{} priming cookies from {}", self.label, url);

        let request = match isahc::Request::get(url)
            .header("User-Agent", Self::user_agent())
            .body(AsyncBody::empty())
        {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("{} cookie request build error: {}", self.label, e);
                return;
            }
        };

        match self.client.send_async(request).await {
            Ok(resp) => tracing::debug!("{} cookie response: {}", self.label, resp.status()),
            Err(e) => tracing::warn!("{} cookie request failed: {}", self.label, e),
        }
    }

    pub async fn post_json(
        &mut self,
        url: &str,
        payload: &Value,
        headers: &[(&str, &str)],
    ) -> Result<Value, ProviderError> {
        let body = serde_json::to_string(payload)?;
        self.request("POST", url, Some(body), headers, decode_json).await
    }

    /// Send with retries. A body that `decode` rejects is retried like a
    /// transient server error.
    async fn request<T>(
        &mut self,
        method: &str,
        url: &str,
        body: Option<String>,
        headers: &[(&str, &str)],
        decode: fn(String) -> Result<T, String>,
    ) -> Result<T, ProviderError> {
        let mut last_error: Option<String> = None;
        let mut rate_limited = false;

        for attempt in 0..MAX_RETRIES {
            self.limiter.acquire().await;

            if attempt > 0 {
                let delay = backoff_delay(attempt, rand::random::<f64>());
                tracing::info!(
                    "{} retry backoff: attempt {}/{} - reason: {}, waiting {:.1}s",
                    self.label,
                    attempt + 1,
                    MAX_RETRIES,
                    last_error.as_deref().unwrap_or("unknown error"),
                    delay.as_secs_f64()
                );
                sleep(delay).await;
            }

            tracing::debug!("{} {} {} (attempt {})", self.label, method, url, attempt + 1);

            match self.attempt(method, url, body.clone(), headers).await? {
                Attempt::Done(text) => match decode(text) {
                    Ok(value) => return Ok(value),
                    Err(reason) => {
                        rate_limited = false;
                        last_error = Some(reason);
                    }
                },
                Attempt::Retry(reason) => {
                    rate_limited = false;
                    last_error = Some(reason);
                }
                Attempt::RateLimited(reason) => {
                    rate_limited = true;
                    last_error = Some(reason);
                }
            }
        }

        if rate_limited {
            return Err(ProviderError::RateLimit);
        }
        Err(ProviderError::InvalidResponse(format!(
            "Max retries exceeded: {}",
            last_error.as_deref().unwrap_or("unknown error")
        )))
    }

    async fn attempt(
        &self,
        method: &str,
        url: &str,
        body: Option<String>,
        headers: &[(&str, &str)],
    ) -> Result<Attempt, ProviderError> {
        let mut builder = isahc::Request::builder()
            .uri(url)
            .method(method)
            .header("Accept", "application/json, text/plain, */*")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Cache-Control", "no-cache")
            .header("User-Agent", Self::user_agent());

        if body.is_some() {
            builder = builder.header("Content-Type", "application/json");
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = match body {
            Some(b) => AsyncBody::from(b),
            None => AsyncBody::empty(),
        };
        let request = builder
            .body(body)
            .map_err(|e| ProviderError::InvalidResponse(format!("Request build error: {}", e)))?;

        let mut resp = match self.client.send_async(request).await {
            Ok(resp) => resp,
            Err(e) => return Ok(Attempt::Retry(format!("Network error: {}", e))),
        };

        let status = resp.status();
        if status.is_success() {
            return match resp.text().await {
                Ok(text) => Ok(Attempt::Done(text)),
                Err(e) => Ok(Attempt::Retry(format!("Response body error: {}", e))),
            };
        }

        let status_text = status.canonical_reason().unwrap_or("Unknown");
        if status == 401 {
            Err(ProviderError::Unauthorized)
        } else if status == 403 {
            Ok(Attempt::Retry("Forbidden (403) - rate limit or auth issue".to_string()))
        } else if status == 429 {
            Ok(Attempt::RateLimited("Too Many Requests (429) - rate limited".to_string()))
        } else if status.is_server_error() {
            Ok(Attempt::Retry(format!(
                "Server error ({}) - {}",
                status.as_u16(),
                status_text
            )))
        } else if status.is_client_error() {
            // Request problem; retrying will not help
            Err(ProviderError::InvalidResponse(format!(
                "Client error ({}) - {} - not retryable",
                status.as_u16(),
                status_text
            )))
        } else {
            Ok(Attempt::Retry(format!(
                "HTTP error ({}) - {}",
                status.as_u16(),
                status_text
            )))
        }
    }
}

fn decode_json(text: String) -> Result<Value, String> {
    serde_json::from_str::<Value>(&text).map_err(|e| format!("JSON parse error: {}", e))
}

/// Exponential backoff with jitter, capped at 60s
fn backoff_delay(attempt: u32, jitter: f64) -> StdDuration {
    let base = 2.0_f64.powi(attempt.saturating_sub(1) as i32);
    StdDuration::from_secs_f64(base + jitter.clamp(0.0, 1.0)).min(StdDuration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_delay_grows_and_caps() {
        assert_eq!(backoff_delay(1, 0.0), StdDuration::from_secs(1));
        assert_eq!(backoff_delay(2, 0.0), StdDuration::from_secs(2));
        assert_eq!(backoff_delay(3, 0.5), StdDuration::from_secs_f64(4.5));
        assert_eq!(backoff_delay(10, 0.0), StdDuration::from_secs(60));
    }

    #[test]
    fn test_rate_limiter_window() {
        let mut limiter = RateLimiter::new(2);
        let start = SystemTime::UNIX_EPOCH + StdDuration::from_secs(1_000);

        assert!(limiter.wait_time(start).is_zero());
        limiter.request_timestamps.push(start);
        assert!(limiter.wait_time(start).is_zero());
        limiter.request_timestamps.push(start);

        // Third request inside the window must wait for the oldest to expire
        let later = start + StdDuration::from_secs(20);
        assert_eq!(limiter.wait_time(later), StdDuration::from_secs(40));

        // Once the window has passed the old timestamps are dropped
        let after = start + StdDuration::from_secs(61);
        assert!(limiter.wait_time(after).is_zero());
        assert!(limiter.request_timestamps.is_empty());
    }

    #[test]
    fn test_decode_json() {
        assert_eq!(decode_json("{\"a\": 1}".to_string()).unwrap()["a"], 1);

        let err = decode_json("<html>Will be right back</html>".to_string()).unwrap_err();
        assert!(err.starts_with("JSON parse error"));
    }

    #[test]
    fn test_fetcher_creation() {
        assert!(HttpFetcher::new("test", 60).is_ok());
    }
}

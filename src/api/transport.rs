//! Purpose: Fetch result documents over HTTP with bounded, backoff-based retries.
//! Exports: `Fetch`, `Fetcher`, `RetryPolicy`.
//! Role: Transport used to download finished task payloads.
//! Invariants: Only GET requests are retried; retries are bounded by `RetryPolicy::max_retries`.
//! Invariants: Retries happen only on transport errors and the policy's transient status codes.

use std::io::Read;
use std::thread::sleep;
use std::time::Duration;

use crate::core::error::{Error, ErrorKind};

type ApiResult<T> = Result<T, Error>;

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_RETRY_AFTER: Duration = Duration::from_secs(120);

/// Source of raw response text for a result URL.
pub trait Fetch {
    fn get_text(&self, url: &str) -> ApiResult<String>;
}

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_factor: Duration,
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_factor: Duration::from_millis(600),
            retry_statuses: vec![429, 500, 502, 503, 504],
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based): `factor * 2^(retry - 1)`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.backoff_factor.saturating_mul(1u32 << exponent)
    }

    pub fn retries_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }
}

#[derive(Clone)]
pub struct Fetcher {
    agent: ureq::Agent,
    policy: RetryPolicy,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new(FETCH_TIMEOUT)
    }
}

impl Fetcher {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

impl Fetch for Fetcher {
    fn get_text(&self, url: &str) -> ApiResult<String> {
        let mut retry = 0u32;
        loop {
            let response = self.agent.get(url).call();
            let delay = match response {
                Ok(resp) => return read_body(resp),
                Err(ureq::Error::Status(code, resp)) => {
                    if retry >= self.policy.max_retries || !self.policy.retries_status(code) {
                        return Err(status_error(code, resp));
                    }
                    retry += 1;
                    let backoff = self.policy.backoff(retry);
                    tracing::warn!(status = code, retry, "transient status fetching result");
                    retry_after(&resp).map_or(backoff, |wait| wait.max(backoff))
                }
                Err(ureq::Error::Transport(err)) => {
                    if retry >= self.policy.max_retries {
                        return Err(Error::new(ErrorKind::Io)
                            .with_message(format!("request failed after {retry} retries"))
                            .with_source(err));
                    }
                    retry += 1;
                    tracing::warn!(error = %err, retry, "transport error fetching result");
                    self.policy.backoff(retry)
                }
            };
            sleep(delay);
        }
    }
}

fn retry_after(response: &ureq::Response) -> Option<Duration> {
    response
        .header("Retry-After")
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .map(|wait| wait.min(MAX_RETRY_AFTER))
}

fn read_body(response: ureq::Response) -> ApiResult<String> {
    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read response body")
                .with_source(err)
        })?;
    Ok(lossy_text(bytes))
}

/// Invalid UTF-8 sequences become U+FFFD so the rest of the body still decodes.
fn lossy_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            let text = String::from_utf8_lossy(err.as_bytes()).into_owned();
            tracing::warn!(
                valid_up_to = err.utf8_error().valid_up_to(),
                "response body is not valid UTF-8; replacing invalid bytes"
            );
            text
        }
    }
}

fn status_error(status: u16, response: ureq::Response) -> Error {
    let reason = response.status_text().to_string();
    Error::new(ErrorKind::Remote)
        .with_message(format!("HTTP {status} {reason} for {}", response.get_url()))
        .with_status(status)
}

#[cfg(test)]
mod tests {
    use super::{RetryPolicy, lossy_text};
    use std::time::Duration;

    #[test]
    fn invalid_utf8_is_replaced_not_rejected() {
        let text = lossy_text(b"{\"a\":\"x\xffy\"}".to_vec());
        assert_eq!(text, "{\"a\":\"x\u{fffd}y\"}");
        assert_eq!(lossy_text(b"plain".to_vec()), "plain");
    }

    #[test]
    fn backoff_doubles_from_factor() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(600));
        assert_eq!(policy.backoff(2), Duration::from_millis(1200));
        assert_eq!(policy.backoff(5), Duration::from_millis(9600));
    }

    #[test]
    fn backoff_saturates_on_large_retry_counts() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(100), policy.backoff(17));
    }

    #[test]
    fn only_transient_statuses_are_retried() {
        let policy = RetryPolicy::default();
        for status in [429, 500, 502, 503, 504] {
            assert!(policy.retries_status(status), "{status}");
        }
        for status in [400, 401, 403, 404, 501] {
            assert!(!policy.retries_status(status), "{status}");
        }
    }
}

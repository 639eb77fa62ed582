//! Configuration for share creation and conversion polling.
//!
//! All behaviour is controlled through [`ShareConfig`], built via its
//! [`ShareConfigBuilder`]. The polling budget lives here rather than in the
//! coordinator so deployments can tune cadence without code changes; the only
//! hard rule is that the budget is bounded.

use crate::error::ShareError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::time::Duration;

/// Upper limit on [`ShareConfig::poll_timeout_secs`] (one day).
pub const MAX_POLL_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Upper limit on [`ShareConfig::request_timeout_secs`] (one hour).
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 60 * 60;

/// Shortest delay between two polls of the same job.
const MIN_POLL_DELAY: Duration = Duration::from_millis(1);

/// Configuration for share creation.
///
/// Built via [`ShareConfig::builder()`] or using [`ShareConfig::default()`].
///
/// # Example
/// ```rust
/// use share_convert::ShareConfig;
///
/// let config = ShareConfig::builder()
///     .conversion_api_url("http://conversions.internal:3001")
///     .poll_interval_ms(250)
///     .max_poll_attempts(20)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ShareConfig {
    /// Base URL of the Conversion API. Default: `http://localhost:3001`.
    pub conversion_api_url: String,

    /// Timeout for each individual HTTP call, in seconds. Default: 30.
    pub request_timeout_secs: u64,

    /// Delay before the second poll, in milliseconds. Default: 500.
    ///
    /// The first poll runs right after submission. Later delays double up to
    /// [`Self::poll_max_interval_ms`].
    pub poll_interval_ms: u64,

    /// Upper bound on the delay between two polls, in milliseconds. Default: 5000.
    pub poll_max_interval_ms: u64,

    /// Maximum number of status fetches per job. Default: 60.
    pub max_poll_attempts: u32,

    /// Wall-clock limit on the polling phase, in seconds. Default: 120.
    pub poll_timeout_secs: u64,

    /// Optional observer for submission and polling events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            conversion_api_url: "http://localhost:3001".to_string(),
            request_timeout_secs: 30,
            poll_interval_ms: 500,
            poll_max_interval_ms: 5000,
            max_poll_attempts: 60,
            poll_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ShareConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareConfig")
            .field("conversion_api_url", &self.conversion_api_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("poll_max_interval_ms", &self.poll_max_interval_ms)
            .field("max_poll_attempts", &self.max_poll_attempts)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ShareProgressCallback>"),
            )
            .finish()
    }
}

impl ShareConfig {
    /// Create a new builder for `ShareConfig`.
    pub fn builder() -> ShareConfigBuilder {
        ShareConfigBuilder {
            config: Self::default(),
        }
    }

    /// The polling budget described by this configuration.
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            initial_interval: Duration::from_millis(self.poll_interval_ms),
            max_interval: Duration::from_millis(self.poll_max_interval_ms),
            max_attempts: self.max_poll_attempts,
            timeout: Duration::from_secs(self.poll_timeout_secs),
        }
    }
}

/// Builder for [`ShareConfig`].
#[derive(Debug)]
pub struct ShareConfigBuilder {
    config: ShareConfig,
}

impl ShareConfigBuilder {
    pub fn conversion_api_url(mut self, url: impl Into<String>) -> Self {
        self.config.conversion_api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    pub fn poll_max_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_max_interval_ms = ms;
        self
    }

    pub fn max_poll_attempts(mut self, n: u32) -> Self {
        self.config.max_poll_attempts = n;
        self
    }

    pub fn poll_timeout_secs(mut self, secs: u64) -> Self {
        self.config.poll_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ShareConfig, ShareError> {
        let c = &self.config;
        if !(c.conversion_api_url.starts_with("http://")
            || c.conversion_api_url.starts_with("https://"))
        {
            return Err(ShareError::InvalidConfig(format!(
                "Conversion API URL must be http(s), got '{}'",
                c.conversion_api_url
            )));
        }
        if c.max_poll_attempts == 0 {
            return Err(ShareError::InvalidConfig(
                "max_poll_attempts must be ≥ 1".into(),
            ));
        }
        if c.poll_timeout_secs == 0 || c.poll_timeout_secs > MAX_POLL_TIMEOUT_SECS {
            return Err(ShareError::InvalidConfig(format!(
                "poll_timeout_secs must be between 1 and {MAX_POLL_TIMEOUT_SECS}, got {}",
                c.poll_timeout_secs
            )));
        }
        if c.request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS {
            return Err(ShareError::InvalidConfig(format!(
                "request_timeout_secs must be at most {MAX_REQUEST_TIMEOUT_SECS}, got {}",
                c.request_timeout_secs
            )));
        }
        if c.poll_interval_ms == 0 {
            return Err(ShareError::InvalidConfig(
                "poll_interval_ms must be ≥ 1".into(),
            ));
        }
        if c.poll_max_interval_ms < c.poll_interval_ms {
            return Err(ShareError::InvalidConfig(format!(
                "poll_max_interval_ms ({}) is below poll_interval_ms ({})",
                c.poll_max_interval_ms, c.poll_interval_ms
            )));
        }
        if c.poll_max_interval_ms > c.poll_timeout_secs.saturating_mul(1000) {
            return Err(ShareError::InvalidConfig(format!(
                "poll_max_interval_ms ({}) exceeds the poll timeout ({}s)",
                c.poll_max_interval_ms, c.poll_timeout_secs
            )));
        }
        Ok(self.config)
    }
}

/// Bounded polling budget for one conversion job.
///
/// Attempt 1 runs immediately. Attempt `n > 1` waits
/// `min(initial_interval * 2^(n-2), max_interval)` first. Polling stops at
/// `max_attempts` fetches or once `timeout` has elapsed, whichever comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub max_attempts: u32,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        ShareConfig::default().poll_policy()
    }
}

impl PollPolicy {
    /// Delay to wait before the given 1-indexed attempt.
    ///
    /// Never zero after the first attempt, even for a hand-built policy.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(attempt - 2);
        self.initial_interval
            .saturating_mul(factor)
            .min(self.max_interval)
            .max(MIN_POLL_DELAY)
    }

    /// Total sleep if every attempt is used, before the wall-clock cap.
    pub fn worst_case_wait(&self) -> Duration {
        (1..=self.max_attempts)
            .map(|a| self.delay_before(a))
            .fold(Duration::ZERO, Duration::saturating_add)
            .min(self.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ShareConfig::builder().build().unwrap();
        assert_eq!(config.conversion_api_url, "http://localhost:3001");
        assert_eq!(config.max_poll_attempts, 60);
        assert!(config.progress_callback.is_none());
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = ShareConfig::builder()
            .conversion_api_url("https://api.example.com/")
            .build()
            .unwrap();
        assert_eq!(config.conversion_api_url, "https://api.example.com");
    }

    #[test]
    fn rejects_non_http_url() {
        let err = ShareConfig::builder()
            .conversion_api_url("ftp://files")
            .build()
            .unwrap_err();
        assert!(matches!(err, ShareError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_unbounded_polling() {
        assert!(ShareConfig::builder().max_poll_attempts(0).build().is_err());
        assert!(ShareConfig::builder().poll_timeout_secs(0).build().is_err());
    }

    #[test]
    fn rejects_zero_interval() {
        let err = ShareConfig::builder()
            .poll_interval_ms(0)
            .poll_max_interval_ms(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("poll_interval_ms"));
    }

    #[test]
    fn zero_interval_policy_still_waits() {
        let policy = PollPolicy {
            initial_interval: Duration::ZERO,
            max_interval: Duration::ZERO,
            max_attempts: 3,
            timeout: Duration::from_secs(1),
        };
        assert_eq!(policy.delay_before(1), Duration::ZERO);
        assert_eq!(policy.delay_before(2), Duration::from_millis(1));
        assert_eq!(policy.delay_before(3), Duration::from_millis(1));
    }

    #[test]
    fn rejects_oversized_timeouts() {
        let err = ShareConfig::builder()
            .poll_timeout_secs(u64::MAX)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("poll_timeout_secs"));
        assert!(ShareConfig::builder()
            .poll_timeout_secs(MAX_POLL_TIMEOUT_SECS)
            .build()
            .is_ok());
        assert!(ShareConfig::builder()
            .request_timeout_secs(u64::MAX)
            .build()
            .is_err());
    }

    #[test]
    fn rejects_interval_longer_than_timeout() {
        let err = ShareConfig::builder()
            .poll_timeout_secs(2)
            .poll_max_interval_ms(u64::MAX)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("exceeds the poll timeout"));
    }

    #[test]
    fn rejects_inverted_intervals() {
        let err = ShareConfig::builder()
            .poll_interval_ms(2000)
            .poll_max_interval_ms(100)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("poll_max_interval_ms"));
    }

    #[test]
    fn backoff_doubles_then_caps() {
        let policy = ShareConfig::builder()
            .poll_interval_ms(100)
            .poll_max_interval_ms(500)
            .build()
            .unwrap()
            .poll_policy();
        let delays: Vec<u128> = (1..=6)
            .map(|a| policy.delay_before(a).as_millis())
            .collect();
        assert_eq!(delays, vec![0, 100, 200, 400, 500, 500]);
    }

    #[test]
    fn worst_case_wait_is_bounded() {
        let policy = PollPolicy {
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_millis(100),
            max_attempts: 4,
            timeout: Duration::from_secs(10),
        };
        assert_eq!(policy.worst_case_wait(), Duration::from_millis(300));

        let capped = PollPolicy {
            timeout: Duration::from_millis(150),
            ..policy
        };
        assert_eq!(capped.worst_case_wait(), Duration::from_millis(150));
    }

    #[test]
    fn large_attempt_numbers_do_not_overflow() {
        let policy = PollPolicy::default();
        assert_eq!(policy.delay_before(500), policy.max_interval);
    }
}

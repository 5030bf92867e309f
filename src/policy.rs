//! Retry policy for send attempts.
//!
//! A clean abstraction over retry configuration: the dispatcher asks the
//! policy whether a failure is worth retrying, the policy carries no mutable
//! state, and every send gets a fresh attempt counter.

use std::{collections::HashSet, time::Duration};

use serde::Deserialize;

use crate::{
    error::{default_retryable_kinds, ErrorKind, TransportError},
    settings::Settings,
};

/// Retry policy for transport failures.
///
/// Only error kinds in `retryable` are eligible; the delay between attempts
/// is fixed, not exponential. Build failures never reach this policy.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryPolicy {
    /// Error kinds considered transient and worth retrying.
    ///
    /// Default: connection and timeout failures. Authentication and
    /// permanent rejections are excluded - retrying them spends the whole
    /// delay budget on certain failure.
    #[serde(default = "default_retryable_kinds")]
    pub retryable: HashSet<ErrorKind>,

    /// Fixed delay between attempts (in seconds).
    pub delay_secs: u64,

    /// Maximum number of retries after the initial attempt. A policy with
    /// `max_retries = k` allows `k + 1` attempts in total.
    pub max_retries: u32,
}

impl RetryPolicy {
    /// Derive the policy from settings, or `None` when retries are disabled.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        settings.retry_on_failure.then(|| Self {
            retryable: default_retryable_kinds(),
            delay_secs: settings.retry_delay_secs,
            max_retries: settings.retry_count,
        })
    }

    /// Whether another attempt should be made after a failure.
    ///
    /// `retries_so_far` counts retries already performed (0 after the first
    /// failed attempt). Returns `true` iff the error kind is retryable and
    /// the retry budget is not exhausted.
    #[must_use]
    pub fn should_retry(&self, error: &TransportError, retries_so_far: u32) -> bool {
        self.retryable.contains(&error.kind()) && retries_so_far < self.max_retries
    }

    /// The fixed delay between attempts.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            retryable: default_retryable_kinds(),
            delay_secs: 0,
            max_retries,
        }
    }

    #[test]
    fn retries_transient_kinds_within_budget() {
        let policy = policy(3);
        let error = TransportError::Connection("refused".to_string());

        assert!(policy.should_retry(&error, 0));
        assert!(policy.should_retry(&error, 2));
        assert!(!policy.should_retry(&error, 3));
        assert!(!policy.should_retry(&error, 10));
    }

    #[test]
    fn never_retries_non_retryable_kinds() {
        let policy = policy(3);

        let auth = TransportError::Authentication("535".to_string());
        assert!(!policy.should_retry(&auth, 0));

        let rejected = TransportError::Rejected("550".to_string());
        assert!(!policy.should_retry(&rejected, 0));
    }

    #[test]
    fn retryable_set_is_the_point_of_control() {
        let mut policy = policy(3);
        policy.retryable = HashSet::from([ErrorKind::Rejected]);

        let rejected = TransportError::Rejected("550".to_string());
        assert!(policy.should_retry(&rejected, 0));

        let connection = TransportError::Connection("refused".to_string());
        assert!(!policy.should_retry(&connection, 0));
    }

    #[test]
    fn derived_from_settings() {
        let settings = Settings {
            host: "smtp.example.com".to_string(),
            retry_count: 7,
            retry_delay_secs: 2,
            ..Settings::default()
        };

        let policy = RetryPolicy::from_settings(&settings).expect("retries enabled by default");
        assert_eq!(policy.max_retries, 7);
        assert_eq!(policy.delay(), Duration::from_secs(2));

        let disabled = Settings {
            retry_on_failure: false,
            ..settings
        };
        assert!(RetryPolicy::from_settings(&disabled).is_none());
    }
}

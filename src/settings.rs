//! Dispatcher configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::SettingsError;

const fn default_port() -> u16 {
    25
}

const fn default_worker_count() -> usize {
    1
}

const fn default_retry_on_failure() -> bool {
    true
}

const fn default_retry_count() -> u32 {
    5
}

const fn default_retry_delay_secs() -> u64 {
    5
}

fn default_template_root() -> PathBuf {
    PathBuf::from("templates")
}

/// Configuration for a [`Dispatcher`](crate::Dispatcher).
///
/// Immutable after construction and shared read-only across all workers.
/// Validated when the dispatcher is built: an invalid value is a
/// construction-time error, never a send-time one.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// SMTP relay hostname. Required.
    pub host: String,

    /// SMTP relay port.
    ///
    /// Default: 25
    #[serde(default = "default_port")]
    pub port: u16,

    /// Username for SMTP authentication. Leave empty for unauthenticated
    /// relays (e.g., a local test server).
    #[serde(default)]
    pub username: String,

    /// Password for SMTP authentication.
    #[serde(default)]
    pub password: String,

    /// Bounce address, used as the envelope sender when present.
    #[serde(default)]
    pub bounce_address: Option<String>,

    /// Require STARTTLS on the connection.
    ///
    /// Default: `false`
    #[serde(default)]
    pub start_tls_required: bool,

    /// Verify that the server's certificate matches the connected hostname.
    /// Disabling skips only the identity check; certificate-chain validation
    /// still applies.
    ///
    /// Default: `false`
    #[serde(default)]
    pub ssl_check_server_identity: bool,

    /// Accept certificates that fail chain validation (self-signed or
    /// untrusted roots). Testing only; requires an explicit opt-in.
    ///
    /// Default: `false`
    #[serde(default)]
    pub ssl_accept_invalid_certs: bool,

    /// Use implicit TLS from the first byte (SMTPS).
    ///
    /// Default: `false`
    #[serde(default)]
    pub ssl_on_connect: bool,

    /// Number of dispatch workers. Each email is processed start-to-finish
    /// by one worker, and retry waits occupy that worker, so size the pool
    /// for the worst-case retry duration times concurrent failing sends.
    ///
    /// Default: 1
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    /// Retry transient transport failures.
    ///
    /// Default: `true`
    #[serde(default = "default_retry_on_failure")]
    pub retry_on_failure: bool,

    /// Maximum number of retries after the initial attempt.
    ///
    /// Default: 5
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Fixed delay between retry attempts (in seconds).
    ///
    /// Default: 5 seconds
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Directory that template filenames are resolved against.
    ///
    /// Default: `templates`
    #[serde(default = "default_template_root")]
    pub template_root: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            username: String::new(),
            password: String::new(),
            bounce_address: None,
            start_tls_required: false,
            ssl_check_server_identity: false,
            ssl_accept_invalid_certs: false,
            ssl_on_connect: false,
            worker_count: default_worker_count(),
            retry_on_failure: default_retry_on_failure(),
            retry_count: default_retry_count(),
            retry_delay_secs: default_retry_delay_secs(),
            template_root: default_template_root(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Check that all required fields are present and in range.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] for an empty host, a zero worker
    /// count, or a zero retry count while retries are enabled.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.host.is_empty() {
            return Err(SettingsError::Invalid("host must not be empty".to_string()));
        }

        if self.worker_count == 0 {
            return Err(SettingsError::Invalid(
                "worker_count must be at least 1".to_string(),
            ));
        }

        if self.retry_on_failure && self.retry_count == 0 {
            return Err(SettingsError::Invalid(
                "retry_count must be at least 1 when retry_on_failure is enabled".to_string(),
            ));
        }

        Ok(())
    }
}

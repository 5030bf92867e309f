//! Typed error handling for dispatch operations.
//!
//! This module distinguishes between:
//! - Build failures (bad input or configuration) - never retried
//! - Transport failures - classified by kind, retried when transient
//! - Dispatch failures - submitting work to a closed dispatcher

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration problems detected before the dispatcher is usable.
///
/// These are construction-time errors: an invalid [`Settings`](crate::Settings)
/// value never produces a receipt, it fails the dispatcher constructor.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A required field is missing or out of range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Failed to read a configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a configuration file.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Failures while turning an [`Email`](crate::Email) into a transport message.
///
/// Build failures are input problems, not transport conditions: they are
/// reported as an immediate failure receipt and never engage the retry policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The template could not be read or rendered. No partial message is sent.
    #[error("Template rendering failed: {0}")]
    TemplateFailure(String),

    /// Structural validation failed (e.g., malformed address, no recipients).
    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}

impl From<handlebars::RenderError> for BuildError {
    fn from(error: handlebars::RenderError) -> Self {
        Self::TemplateFailure(error.to_string())
    }
}

impl From<lettre::address::AddressError> for BuildError {
    fn from(error: lettre::address::AddressError) -> Self {
        Self::InvalidMessage(error.to_string())
    }
}

impl From<lettre::error::Error> for BuildError {
    fn from(error: lettre::error::Error) -> Self {
        Self::InvalidMessage(error.to_string())
    }
}

/// Classification of a transport failure.
///
/// The retryable-kind set on [`RetryPolicy`](crate::RetryPolicy) is the single
/// point of control for retry eligibility; only kinds in that set are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// Failed to establish or keep a connection to the server.
    Connection,
    /// The operation timed out.
    Timeout,
    /// The server rejected the configured credentials.
    Authentication,
    /// The server rejected the message (policy violation, unknown user, ...).
    Rejected,
    /// Protocol-level or internal client error.
    Protocol,
}

/// A classified failure raised by the transport collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Transient connectivity failure; eligible for retry by default.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The send attempt timed out; eligible for retry by default.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Authentication failed. Retrying with the same credentials cannot succeed.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Permanent rejection by the server.
    #[error("Message rejected: {0}")]
    Rejected(String),

    /// Protocol violation or internal client error.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl TransportError {
    /// The kind used by the retry policy to decide eligibility.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Connection(_) => ErrorKind::Connection,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::Rejected(_) => ErrorKind::Rejected,
            Self::Protocol(_) => ErrorKind::Protocol,
        }
    }

    /// Returns `true` if this failure is transient and worth retrying
    /// under the default policy.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }
}

/// Convert from the SMTP transport's error into a classified failure.
///
/// Classification follows the transport's own predicates:
///
/// - timeouts -> `Timeout` (retryable)
/// - 4xx SMTP responses -> `Connection` (transient server condition, retryable)
/// - 5xx SMTP responses -> `Rejected` (do not retry)
/// - TLS and client-side errors -> `Protocol`
/// - everything else (network, I/O) -> `Connection`
impl From<lettre::transport::smtp::Error> for TransportError {
    fn from(error: lettre::transport::smtp::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else if error.is_permanent() {
            Self::Rejected(error.to_string())
        } else if error.is_transient() {
            Self::Connection(error.to_string())
        } else if error.is_tls() || error.is_client() || error.is_response() {
            Self::Protocol(error.to_string())
        } else {
            Self::Connection(error.to_string())
        }
    }
}

/// Terminal failure carried by a failure [`Receipt`](crate::Receipt).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// The message could not be built. Bypassed the retry loop entirely.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// The transport refused the message (after exhausting retries, if any).
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Failures submitting work to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// `send` was called after `close`. The email was not enqueued.
    #[error("Dispatcher is closed")]
    Closed,
}

/// The default set of retryable kinds: transient connectivity only.
///
/// Authentication and permanent rejections are excluded because retrying
/// them spends the full delay budget on certain failure.
#[must_use]
pub fn default_retryable_kinds() -> HashSet<ErrorKind> {
    HashSet::from([ErrorKind::Connection, ErrorKind::Timeout])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_kinds() {
        let error = TransportError::Connection("connection refused".to_string());
        assert_eq!(error.kind(), ErrorKind::Connection);
        assert!(error.is_transient());

        let error = TransportError::Timeout("read timed out".to_string());
        assert_eq!(error.kind(), ErrorKind::Timeout);
        assert!(error.is_transient());

        let error = TransportError::Authentication("535 bad credentials".to_string());
        assert_eq!(error.kind(), ErrorKind::Authentication);
        assert!(!error.is_transient());

        let error = TransportError::Rejected("550 user unknown".to_string());
        assert_eq!(error.kind(), ErrorKind::Rejected);
        assert!(!error.is_transient());

        let error = TransportError::Protocol("unexpected response".to_string());
        assert_eq!(error.kind(), ErrorKind::Protocol);
        assert!(!error.is_transient());
    }

    #[test]
    fn default_retryable_set_is_transient_only() {
        let kinds = default_retryable_kinds();
        assert!(kinds.contains(&ErrorKind::Connection));
        assert!(kinds.contains(&ErrorKind::Timeout));
        assert!(!kinds.contains(&ErrorKind::Authentication));
        assert!(!kinds.contains(&ErrorKind::Rejected));
        assert!(!kinds.contains(&ErrorKind::Protocol));
    }

    #[test]
    fn build_error_from_address_error() {
        let error: BuildError = "not-an-address"
            .parse::<lettre::Address>()
            .expect_err("parse should fail")
            .into();
        assert!(matches!(error, BuildError::InvalidMessage(_)));
    }

    #[test]
    fn send_error_display_is_transparent() {
        let error = SendError::Build(BuildError::TemplateFailure("welcome.hbs".to_string()));
        assert_eq!(error.to_string(), "Template rendering failed: welcome.hbs");

        let error = SendError::Transport(TransportError::Rejected("550".to_string()));
        assert_eq!(error.to_string(), "Message rejected: 550");
    }
}

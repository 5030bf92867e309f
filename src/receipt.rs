//! Terminal-outcome records.

use crate::{email::Email, error::SendError};

/// The immutable record of a send's terminal outcome.
///
/// Exactly one of the message id (on success) or the failure (on failure)
/// is populated. Each receipt is created once and consumed by exactly one
/// callback invocation; the originating email rides along so callbacks can
/// correlate outcomes through its metadata.
#[derive(Debug, Clone)]
pub struct Receipt {
    email: Email,
    message_id: Option<String>,
    failure: Option<SendError>,
}

impl Receipt {
    pub(crate) fn delivered(email: Email, message_id: String) -> Self {
        Self {
            email,
            message_id: Some(message_id),
            failure: None,
        }
    }

    pub(crate) fn failed(email: Email, failure: SendError) -> Self {
        Self {
            email,
            message_id: None,
            failure: Some(failure),
        }
    }

    /// Whether the send was delivered.
    #[must_use]
    pub fn success(&self) -> bool {
        self.failure.is_none()
    }

    /// The email this receipt reports on, metadata included.
    #[must_use]
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// The transport-assigned message identifier, on success.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    /// The terminal failure, on failure.
    #[must_use]
    pub fn failure(&self) -> Option<&SendError> {
        self.failure.as_ref()
    }
}

//! The transport collaborator.

use async_trait::async_trait;
use lettre::{
    message::Message,
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};
use tracing::debug;

use crate::{
    error::{SettingsError, TransportError},
    settings::Settings,
};

/// Submits a fully-built message for delivery.
///
/// Implementations return the transport-assigned message identifier on
/// success or a classified [`TransportError`] on failure. Implementations
/// must be safe for concurrent use: every dispatch worker holds the same
/// transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one delivery attempt.
    async fn send(&self, message: &Message) -> Result<String, TransportError>;

    /// A short name for logging.
    fn name(&self) -> &'static str;
}

/// SMTP transport over an asynchronous connection pool.
///
/// Connection configuration (host, port, credentials, TLS posture) comes
/// from [`Settings`] at construction time and is shared read-only by all
/// workers.
pub struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpSender {
    /// Build the SMTP transport described by `settings`.
    ///
    /// TLS posture: `ssl_on_connect` selects implicit TLS, otherwise
    /// `start_tls_required` selects mandatory STARTTLS, otherwise STARTTLS
    /// is used opportunistically. Disabling `ssl_check_server_identity`
    /// skips only the hostname-identity check; chain validation stays on
    /// unless `ssl_accept_invalid_certs` is explicitly set. Credentials are
    /// attached when a username is configured.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] when TLS parameters cannot be
    /// constructed for the configured host.
    pub fn new(settings: &Settings) -> Result<Self, SettingsError> {
        let mut tls_builder = TlsParameters::builder(settings.host.clone());
        if !settings.ssl_check_server_identity {
            tls_builder = tls_builder.dangerous_accept_invalid_hostnames(true);
        }
        if settings.ssl_accept_invalid_certs {
            tls_builder = tls_builder.dangerous_accept_invalid_certs(true);
        }
        let tls_parameters = tls_builder
            .build()
            .map_err(|e| SettingsError::Invalid(format!("TLS parameters: {e}")))?;

        let tls = if settings.ssl_on_connect {
            Tls::Wrapper(tls_parameters)
        } else if settings.start_tls_required {
            Tls::Required(tls_parameters)
        } else {
            Tls::Opportunistic(tls_parameters)
        };

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(settings.host.as_str())
                .port(settings.port)
                .tls(tls);

        if !settings.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl Transport for SmtpSender {
    async fn send(&self, message: &Message) -> Result<String, TransportError> {
        let response = self.transport.send(message.clone()).await?;

        // The server's reply line doubles as the message identifier,
        // e.g. "2.0.0 OK queued as 4XyZ..."
        let message_id = response
            .message()
            .next()
            .map(str::to_owned)
            .unwrap_or_default();

        debug!(message_id = %message_id, "Transport accepted message");
        Ok(message_id)
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

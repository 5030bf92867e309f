//! Transport message assembly.

use std::sync::Arc;

use lettre::message::{Mailbox, Message, MultiPart, SinglePart};
use tracing::debug;

use crate::{
    email::Email, error::BuildError, render::TemplateEngine, settings::Settings,
};

/// The shape of the outgoing message, chosen once per build.
///
/// Selection precedence: a fully specified template wins, then attachments,
/// then plain text. Every variant carries the plain body, and attachments
/// survive in either of the variants that can hold them.
#[derive(Debug)]
pub enum MessageVariant {
    /// Plain text only.
    Plain,
    /// HTML body rendered from a template, with the plain body as the
    /// `multipart/alternative` fallback. With attachments, the alternative
    /// pair is wrapped in `multipart/mixed`.
    Html {
        /// The rendered HTML.
        body: String,
        /// Resolved attachment parts. Unresolvable attachments have already
        /// been skipped.
        attachments: Vec<SinglePart>,
    },
    /// `multipart/mixed` with the plain body followed by the resolvable
    /// attachments, in input order.
    Multipart {
        /// Resolved attachment parts. Unresolvable attachments have already
        /// been skipped.
        attachments: Vec<SinglePart>,
    },
}

/// Builds transport messages from emails.
///
/// Building is a pure transformation apart from reading template and
/// attachment bytes; building the same email twice against the same settings
/// yields structurally identical messages.
pub struct MessageBuilder {
    settings: Arc<Settings>,
    templates: TemplateEngine,
}

impl MessageBuilder {
    /// A builder resolving templates against `settings.template_root`.
    #[must_use]
    pub fn new(settings: Arc<Settings>) -> Self {
        let templates = TemplateEngine::new(settings.template_root.clone());
        Self {
            settings,
            templates,
        }
    }

    /// Assemble the transport message for `email`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::TemplateFailure`] when a requested template
    /// cannot be rendered, and [`BuildError::InvalidMessage`] when an address
    /// is malformed or final message assembly fails. A build failure means
    /// the email is not sent; it is reported as an immediate failure receipt
    /// and never reaches the retry loop.
    pub async fn build(&self, email: &Email) -> Result<Message, BuildError> {
        let variant = self.select_variant(email).await?;

        let mut builder = Message::builder()
            .from(email.from().mailbox()?)
            .subject(email.subject());

        // The bounce address becomes the envelope sender via the Sender
        // header; the transport derives MAIL FROM from it.
        if let Some(bounce) = &self.settings.bounce_address {
            let mailbox = bounce
                .parse::<Mailbox>()
                .map_err(|e| BuildError::InvalidMessage(format!("bounce address: {e}")))?;
            builder = builder.sender(mailbox);
        }

        for contact in email.recipients() {
            builder = builder.to(contact.mailbox()?);
        }
        for contact in email.carbon_copies() {
            builder = builder.cc(contact.mailbox()?);
        }
        for contact in email.blind_carbon_copies() {
            builder = builder.bcc(contact.mailbox()?);
        }

        let plain = email.plain_body().to_owned();
        let message = match variant {
            MessageVariant::Plain => builder.singlepart(SinglePart::plain(plain))?,
            MessageVariant::Html { body, attachments } => {
                let alternative = MultiPart::alternative_plain_html(plain, body);
                if attachments.is_empty() {
                    builder.multipart(alternative)?
                } else {
                    let mut mixed = MultiPart::mixed().multipart(alternative);
                    for part in attachments {
                        mixed = mixed.singlepart(part);
                    }
                    builder.multipart(mixed)?
                }
            }
            MessageVariant::Multipart { attachments } => {
                let mut mixed = MultiPart::mixed().singlepart(SinglePart::plain(plain));
                for part in attachments {
                    mixed = mixed.singlepart(part);
                }
                builder.multipart(mixed)?
            }
        };

        Ok(message)
    }

    /// Decide which message variant to build, first match wins. Resolvable
    /// attachments ride along with whichever variant is chosen.
    async fn select_variant(&self, email: &Email) -> Result<MessageVariant, BuildError> {
        let attachments = resolve_attachments(email).await;

        if let Some((filename, view)) = email.template() {
            let body = self.templates.render(filename, view).await?;
            debug!(template = %filename, "Rendered HTML body");
            return Ok(MessageVariant::Html { body, attachments });
        }

        if !attachments.is_empty() {
            return Ok(MessageVariant::Multipart { attachments });
        }

        Ok(MessageVariant::Plain)
    }
}

async fn resolve_attachments(email: &Email) -> Vec<SinglePart> {
    let mut parts = Vec::with_capacity(email.attachments().len());
    for attachment in email.attachments() {
        if let Some(part) = attachment.resolve().await {
            parts.push(part);
        }
    }
    parts
}

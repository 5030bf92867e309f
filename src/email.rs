//! The unit of work submitted to the dispatcher.

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use crate::{attachment::Attachment, contact::Contact};

/// An immutable description of an outbound email.
///
/// Constructed through [`Email::builder`]; the sender is a constructor
/// argument, so an `Email` without one cannot exist. A template filename and
/// view must both be present for an HTML body to be rendered - a partially
/// specified template is treated as absent and the email goes out as plain
/// text (or multipart, if it carries attachments).
#[derive(Debug, Clone)]
pub struct Email {
    recipients: BTreeSet<Contact>,
    carbon_copies: BTreeSet<Contact>,
    blind_carbon_copies: BTreeSet<Contact>,
    from: Contact,
    subject: String,
    plain_body: String,
    template_filename: Option<String>,
    template_view: Option<Value>,
    attachments: Vec<Attachment>,
    metadata: HashMap<String, Value>,
}

impl Email {
    /// Start building an email from the given sender.
    #[must_use]
    pub fn builder(from: Contact) -> EmailBuilder {
        EmailBuilder {
            email: Self {
                recipients: BTreeSet::new(),
                carbon_copies: BTreeSet::new(),
                blind_carbon_copies: BTreeSet::new(),
                from,
                subject: String::new(),
                plain_body: String::new(),
                template_filename: None,
                template_view: None,
                attachments: Vec::new(),
                metadata: HashMap::new(),
            },
        }
    }

    /// The primary recipients.
    #[must_use]
    pub fn recipients(&self) -> &BTreeSet<Contact> {
        &self.recipients
    }

    /// The carbon-copy recipients.
    #[must_use]
    pub fn carbon_copies(&self) -> &BTreeSet<Contact> {
        &self.carbon_copies
    }

    /// The blind-carbon-copy recipients.
    #[must_use]
    pub fn blind_carbon_copies(&self) -> &BTreeSet<Contact> {
        &self.blind_carbon_copies
    }

    /// The sender.
    #[must_use]
    pub fn from(&self) -> &Contact {
        &self.from
    }

    /// The subject line.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// The plain-text body. Always attached to the outgoing message, as a
    /// fallback for non-HTML clients when a template is also rendered.
    #[must_use]
    pub fn plain_body(&self) -> &str {
        &self.plain_body
    }

    /// The template filename and view model, when both are present.
    ///
    /// A filename without a view (or the reverse) yields `None`.
    #[must_use]
    pub fn template(&self) -> Option<(&str, &Value)> {
        match (&self.template_filename, &self.template_view) {
            (Some(filename), Some(view)) => Some((filename.as_str(), view)),
            _ => None,
        }
    }

    /// The attachments, in the order they were added.
    #[must_use]
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Caller-supplied metadata. Never interpreted during dispatch; it rides
    /// along into the [`Receipt`](crate::Receipt) for use by callbacks.
    #[must_use]
    pub fn metadata(&self) -> &HashMap<String, Value> {
        &self.metadata
    }
}

/// Builder for [`Email`].
#[derive(Debug)]
pub struct EmailBuilder {
    email: Email,
}

impl EmailBuilder {
    /// Add a primary recipient.
    #[must_use]
    pub fn recipient(mut self, contact: Contact) -> Self {
        self.email.recipients.insert(contact);
        self
    }

    /// Add several primary recipients.
    #[must_use]
    pub fn recipients(mut self, contacts: impl IntoIterator<Item = Contact>) -> Self {
        self.email.recipients.extend(contacts);
        self
    }

    /// Add a carbon-copy recipient.
    #[must_use]
    pub fn carbon_copy(mut self, contact: Contact) -> Self {
        self.email.carbon_copies.insert(contact);
        self
    }

    /// Add a blind-carbon-copy recipient.
    #[must_use]
    pub fn blind_carbon_copy(mut self, contact: Contact) -> Self {
        self.email.blind_carbon_copies.insert(contact);
        self
    }

    /// Set the subject line.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.email.subject = subject.into();
        self
    }

    /// Set the plain-text body.
    #[must_use]
    pub fn plain_body(mut self, body: impl Into<String>) -> Self {
        self.email.plain_body = body.into();
        self
    }

    /// Request an HTML body rendered from the named template and view model.
    #[must_use]
    pub fn template(mut self, filename: impl Into<String>, view: Value) -> Self {
        self.email.template_filename = Some(filename.into());
        self.email.template_view = Some(view);
        self
    }

    /// Set only the template filename. Without a matching view model the
    /// template is ignored.
    #[must_use]
    pub fn template_filename(mut self, filename: impl Into<String>) -> Self {
        self.email.template_filename = Some(filename.into());
        self
    }

    /// Set only the template view model. Without a matching filename the
    /// template is ignored.
    #[must_use]
    pub fn template_view(mut self, view: Value) -> Self {
        self.email.template_view = Some(view);
        self
    }

    /// Add an attachment. Order is preserved in the outgoing message.
    #[must_use]
    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.email.attachments.push(attachment);
        self
    }

    /// Attach a metadata entry for receipt handling.
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.email.metadata.insert(key.into(), value);
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> Email {
        self.email
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn recipients_deduplicate_by_address() {
        let email = Email::builder(Contact::new("sender@example.com"))
            .recipient(Contact::new("user@example.com"))
            .recipient(Contact::with_display_name("USER@example.com", "Dup"))
            .recipient(Contact::new("other@example.com"))
            .build();
        assert_eq!(email.recipients().len(), 2);
    }

    #[test]
    fn partial_template_is_treated_as_absent() {
        let filename_only = Email::builder(Contact::new("sender@example.com"))
            .template_filename("welcome.hbs")
            .build();
        assert!(filename_only.template().is_none());

        let view_only = Email::builder(Contact::new("sender@example.com"))
            .template_view(json!({"name": "Ada"}))
            .build();
        assert!(view_only.template().is_none());

        let both = Email::builder(Contact::new("sender@example.com"))
            .template("welcome.hbs", json!({"name": "Ada"}))
            .build();
        assert!(both.template().is_some());
    }

    #[test]
    fn metadata_is_round_tripped() {
        let email = Email::builder(Contact::new("sender@example.com"))
            .metadata("order-id", json!(42))
            .build();
        assert_eq!(email.metadata().get("order-id"), Some(&json!(42)));
    }

    #[test]
    fn attachment_order_is_preserved() {
        let email = Email::builder(Contact::new("sender@example.com"))
            .attachment(Attachment::new(
                "first.txt",
                crate::AttachmentSource::Bytes(vec![1]),
            ))
            .attachment(Attachment::new(
                "second.txt",
                crate::AttachmentSource::Bytes(vec![2]),
            ))
            .build();
        let names: Vec<_> = email.attachments().iter().map(Attachment::name).collect();
        assert_eq!(names, ["first.txt", "second.txt"]);
    }
}

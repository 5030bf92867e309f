//! Asynchronous outbound-email dispatch.
//!
//! Describe an email - recipients, a plain body, optionally a
//! handlebars-templated HTML body and attachments - hand it to a
//! [`Dispatcher`], and observe the terminal outcome through optional
//! success/failure callbacks receiving an immutable [`Receipt`].
//!
//! The dispatch pipeline per email:
//! - [`MessageBuilder`] picks the message variant (plain text,
//!   HTML-with-fallback, or multipart-with-attachments) and assembles the
//!   transport message
//! - a worker performs the send through the [`Transport`], retrying
//!   transient failures under the configured [`RetryPolicy`]
//! - the terminal outcome becomes a [`Receipt`] delivered to the matching
//!   callback, exactly once per send
//!
//! ```no_run
//! use postage::{Contact, Dispatcher, Email, Settings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings {
//!     host: "smtp.example.com".to_string(),
//!     port: 587,
//!     start_tls_required: true,
//!     ..Settings::default()
//! };
//!
//! let dispatcher = Dispatcher::builder()
//!     .on_failure(|receipt| eprintln!("delivery failed: {:?}", receipt.failure()))
//!     .build(settings)?;
//!
//! let email = Email::builder(Contact::new("noreply@example.com"))
//!     .recipient(Contact::new("user@example.com"))
//!     .subject("Welcome")
//!     .plain_body("Hello!")
//!     .build();
//!
//! dispatcher.send(email)?;
//! dispatcher.close().await;
//! # Ok(())
//! # }
//! ```

pub mod attachment;
pub mod contact;
pub mod dispatcher;
pub mod email;
pub mod error;
pub mod logging;
pub mod message;
pub mod policy;
pub mod receipt;
pub mod render;
pub mod settings;
pub mod transport;

pub use attachment::{Attachment, AttachmentSource};
pub use contact::Contact;
pub use dispatcher::{Callback, Dispatcher, DispatcherBuilder};
pub use email::{Email, EmailBuilder};
pub use error::{
    BuildError, DispatchError, ErrorKind, SendError, SettingsError, TransportError,
};
pub use message::{MessageBuilder, MessageVariant};
pub use policy::RetryPolicy;
pub use receipt::Receipt;
pub use render::TemplateEngine;
pub use settings::Settings;
pub use transport::{SmtpSender, Transport};

pub use lettre;

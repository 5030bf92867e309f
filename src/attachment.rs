//! Attachments and their byte sources.

use std::path::PathBuf;

use lettre::message::{
    header::{ContentDisposition, ContentType},
    SinglePart,
};
use tracing::warn;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Where an attachment's bytes come from.
#[derive(Debug, Clone)]
pub enum AttachmentSource {
    /// A file on the local filesystem, read at build time.
    FilesystemPath(PathBuf),
    /// A URL fetched over HTTP(S) at build time.
    Url(String),
    /// Bytes already held in memory.
    Bytes(Vec<u8>),
}

/// A named attachment for an email.
///
/// A name and a source are required for the attachment to be usable. An
/// attachment that is missing either, or whose bytes cannot be acquired, is
/// skipped with a warning rather than failing the send - attachment handling
/// is deliberately best-effort.
#[derive(Debug, Clone, Default)]
pub struct Attachment {
    name: String,
    description: Option<String>,
    content_type: Option<String>,
    source: Option<AttachmentSource>,
}

impl Attachment {
    /// An attachment with a name and a byte source.
    pub fn new(name: impl Into<String>, source: AttachmentSource) -> Self {
        Self {
            name: name.into(),
            description: None,
            content_type: None,
            source: Some(source),
        }
    }

    /// An informational description. Not emitted on the wire.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The MIME content type. Defaults to `application/octet-stream`.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// The attachment name, used as the filename in the message.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The informational description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The byte source, if any.
    #[must_use]
    pub fn source(&self) -> Option<&AttachmentSource> {
        self.source.as_ref()
    }

    /// Resolve this attachment to a transport part.
    ///
    /// Returns `None` when the attachment is unusable: empty name, no source,
    /// or the bytes could not be acquired. Callers skip `None` and continue.
    pub(crate) async fn resolve(&self) -> Option<SinglePart> {
        if self.name.is_empty() {
            warn!("Skipping attachment with no name");
            return None;
        }

        let Some(source) = &self.source else {
            warn!(name = %self.name, "Skipping attachment with no source");
            return None;
        };

        let bytes = match source {
            AttachmentSource::FilesystemPath(path) => match tokio::fs::read(path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(
                        name = %self.name,
                        path = %path.display(),
                        error = %e,
                        "Skipping unreadable attachment"
                    );
                    return None;
                }
            },
            AttachmentSource::Url(url) => match fetch_url(url).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(
                        name = %self.name,
                        url = %url,
                        error = %e,
                        "Skipping unfetchable attachment"
                    );
                    return None;
                }
            },
            AttachmentSource::Bytes(bytes) => bytes.clone(),
        };

        let content_type = self
            .content_type
            .as_deref()
            .and_then(|ct| ContentType::parse(ct).ok())
            .unwrap_or_else(|| {
                ContentType::parse(DEFAULT_CONTENT_TYPE).expect("static content type is valid")
            });

        Some(
            SinglePart::builder()
                .header(content_type)
                .header(ContentDisposition::attachment(&self.name))
                .body(bytes),
        )
    }
}

async fn fetch_url(url: &str) -> Result<Vec<u8>, reqwest::Error> {
    let response = reqwest::get(url).await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

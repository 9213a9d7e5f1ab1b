//! Notification channels that carry a finished report to hotel staff.

pub mod email;
pub mod whatsapp;

use std::fmt;

use async_trait::async_trait;

use crate::report::delivery::ReportMetadata;
use crate::report::renderer::ReportArtifact;

pub use email::{Attachment, EmailChannel};
pub use whatsapp::WhatsAppChannel;

const MAX_ERROR_BODY: usize = 500;

#[derive(Debug)]
pub enum ChannelError {
    Http(reqwest::Error),
    Rejected { status: u16, body: String },
    Malformed(String),
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelError::Http(e) => write!(f, "HTTP error: {e}"),
            ChannelError::Rejected { status, body } => {
                write!(f, "Rejected with status {status}: {body}")
            }
            ChannelError::Malformed(e) => write!(f, "Unexpected response: {e}"),
        }
    }
}

impl std::error::Error for ChannelError {}

impl From<reqwest::Error> for ChannelError {
    fn from(e: reqwest::Error) -> Self {
        ChannelError::Http(e)
    }
}

/// One delivery medium. Implementations must not retry on their own.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn name(&self) -> &str;

    async fn deliver(&self, artifact: &ReportArtifact, metadata: &ReportMetadata) -> Result<(), ChannelError>;
}

/// Pass 2xx responses through; turn anything else into `Rejected`.
pub(crate) async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ChannelError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    Err(ChannelError::Rejected { status: status.as_u16(), body })
}

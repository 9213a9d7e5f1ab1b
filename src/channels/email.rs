use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};

use super::{ChannelError, NotificationChannel, ensure_success};
use crate::config::EmailSettings;
use crate::report::delivery::ReportMetadata;
use crate::report::renderer::ReportArtifact;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
}

/// Email through an HTTP API that takes a JSON message with base64
/// attachments and a bearer key.
pub struct EmailChannel {
    client: reqwest::Client,
    settings: EmailSettings,
}

impl EmailChannel {
    pub fn new(client: reqwest::Client, settings: EmailSettings) -> Self {
        Self { client, settings }
    }

    pub fn payload(&self, subject: &str, html_body: &str, attachments: &[Attachment]) -> Value {
        json!({
            "from": self.settings.from,
            "to": self.settings.to,
            "subject": subject,
            "html": html_body,
            "attachments": attachments
                .iter()
                .map(|a| json!({
                    "filename": a.filename,
                    "content": STANDARD.encode(&a.content),
                }))
                .collect::<Vec<_>>(),
        })
    }

    pub async fn send(
        &self,
        subject: &str,
        html_body: &str,
        attachments: &[Attachment],
    ) -> Result<(), ChannelError> {
        let response = self
            .client
            .post(&self.settings.api_url)
            .bearer_auth(&self.settings.api_key)
            .json(&self.payload(subject, html_body, attachments))
            .send()
            .await?;
        ensure_success(response).await?;
        log::info!("Report email accepted for {} recipient(s)", self.settings.to.len());
        Ok(())
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn name(&self) -> &str {
        "email"
    }

    async fn deliver(&self, artifact: &ReportArtifact, metadata: &ReportMetadata) -> Result<(), ChannelError> {
        let attachment = Attachment {
            filename: metadata.attachment_name.clone(),
            content: artifact.pdf.clone(),
        };
        self.send(&metadata.subject, &artifact.html, &[attachment]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_carries_base64_attachment() {
        let channel = EmailChannel::new(
            reqwest::Client::new(),
            EmailSettings {
                api_url: "https://mail.example.com/emails".to_string(),
                api_key: "key".to_string(),
                from: "reports@example.com".to_string(),
                to: vec!["gm@example.com".to_string()],
            },
        );
        let payload = channel.payload(
            "Report (3 reviews)",
            "<p>3</p>",
            &[Attachment { filename: "Hotel-Report.pdf".to_string(), content: b"%PDF".to_vec() }],
        );
        assert_eq!(payload["to"][0], "gm@example.com");
        assert_eq!(payload["subject"], "Report (3 reviews)");
        assert_eq!(payload["attachments"][0]["filename"], "Hotel-Report.pdf");
        assert_eq!(payload["attachments"][0]["content"], "JVBERg==");
    }
}

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ChannelError, NotificationChannel, ensure_success};
use crate::config::WhatsAppSettings;
use crate::report::delivery::ReportMetadata;
use crate::report::renderer::ReportArtifact;

#[derive(Deserialize)]
struct MediaUpload {
    id: String,
}

/// WhatsApp Cloud API: upload the PDF as media, then send it as a document
/// message with a caption.
pub struct WhatsAppChannel {
    client: reqwest::Client,
    settings: WhatsAppSettings,
}

impl WhatsAppChannel {
    pub fn new(client: reqwest::Client, settings: WhatsAppSettings) -> Self {
        Self { client, settings }
    }

    fn endpoint(&self, resource: &str) -> String {
        format!(
            "{}/{}/{}",
            self.settings.api_url.trim_end_matches('/'),
            self.settings.phone_number_id,
            resource
        )
    }

    pub fn message_payload(&self, media_id: &str, caption: &str, filename: &str) -> Value {
        json!({
            "messaging_product": "whatsapp",
            "to": self.settings.recipient,
            "type": "document",
            "document": {
                "id": media_id,
                "caption": caption,
                "filename": filename,
            },
        })
    }

    async fn upload(&self, document: &[u8], filename: &str) -> Result<String, ChannelError> {
        let file = Part::bytes(document.to_vec())
            .file_name(filename.to_string())
            .mime_str("application/pdf")?;
        let form = Form::new()
            .text("messaging_product", "whatsapp")
            .text("type", "application/pdf")
            .part("file", file);

        let response = self
            .client
            .post(self.endpoint("media"))
            .bearer_auth(&self.settings.token)
            .multipart(form)
            .send()
            .await?;
        let upload: MediaUpload = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| ChannelError::Malformed(format!("media upload: {e}")))?;
        Ok(upload.id)
    }

    pub async fn send(&self, document: &[u8], caption: &str, filename: &str) -> Result<(), ChannelError> {
        let media_id = self.upload(document, filename).await?;
        let response = self
            .client
            .post(self.endpoint("messages"))
            .bearer_auth(&self.settings.token)
            .json(&self.message_payload(&media_id, caption, filename))
            .send()
            .await?;
        ensure_success(response).await?;
        log::info!("Report document sent to WhatsApp recipient {}", self.settings.recipient);
        Ok(())
    }
}

#[async_trait]
impl NotificationChannel for WhatsAppChannel {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn deliver(&self, artifact: &ReportArtifact, metadata: &ReportMetadata) -> Result<(), ChannelError> {
        self.send(&artifact.pdf, &metadata.caption, &metadata.attachment_name).await
    }
}

use std::sync::Arc;

use futures::future::join_all;

use crate::channels::{ChannelError, NotificationChannel};
use super::ReportSettings;
use super::renderer::ReportArtifact;

/// Subject and caption lines that accompany one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportMetadata {
    pub subject: String,
    pub caption: String,
    pub attachment_name: String,
}

impl ReportMetadata {
    pub fn for_report(settings: &ReportSettings, total: i64) -> Self {
        Self {
            subject: format!("📊 {} survey report ({} reviews)", settings.hotel_name, total),
            caption: format!(
                "*{} survey report*\n\nTotal reviews so far: {}",
                settings.hotel_name, total
            ),
            attachment_name: settings.attachment_name.clone(),
        }
    }
}

#[derive(Debug)]
pub struct ChannelResult {
    pub channel: String,
    pub result: Result<(), ChannelError>,
}

/// Settled results of one fan-out, in channel registration order.
#[derive(Debug, Default)]
pub struct DeliveryOutcome {
    pub results: Vec<ChannelResult>,
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        self.results.iter().all(|r| r.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ChannelResult> {
        self.results.iter().filter(|r| r.result.is_err())
    }

    pub fn delivered(&self) -> impl Iterator<Item = &ChannelResult> {
        self.results.iter().filter(|r| r.result.is_ok())
    }
}

/// Sends one artifact to every channel at once and waits for all of them.
#[derive(Clone, Default)]
pub struct DeliveryCoordinator {
    channels: Vec<Arc<dyn NotificationChannel>>,
}

impl DeliveryCoordinator {
    pub fn new(channels: Vec<Arc<dyn NotificationChannel>>) -> Self {
        Self { channels }
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// A failing channel never cancels or undoes its siblings, and nothing is
    /// retried.
    pub async fn deliver(&self, artifact: &ReportArtifact, metadata: &ReportMetadata) -> DeliveryOutcome {
        if self.channels.is_empty() {
            log::warn!("No notification channels configured; report was not sent anywhere");
            return DeliveryOutcome::default();
        }

        let attempts = self.channels.iter().map(|channel| async move {
            let result = channel.deliver(artifact, metadata).await;
            match &result {
                Ok(()) => log::info!("Report delivered via {}", channel.name()),
                Err(e) => log::error!("Report delivery via {} failed: {}", channel.name(), e),
            }
            ChannelResult {
                channel: channel.name().to_string(),
                result,
            }
        });

        DeliveryOutcome {
            results: join_all(attempts).await,
        }
    }
}

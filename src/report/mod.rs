//! Cumulative survey report: aggregate, render, deliver.

pub mod aggregator;
pub mod delivery;
pub mod document;
pub mod engine;
pub mod renderer;
pub mod tier;
pub mod trigger;

use std::fmt;
use std::sync::Arc;

use crate::models::review::ReviewStore;
use aggregator::ReportData;
use delivery::{DeliveryCoordinator, DeliveryOutcome, ReportMetadata};
use engine::RenderEngine;
use tier::TierThresholds;

pub use trigger::TriggerController;

/// Knobs that shape a report.
#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub hotel_name: String,
    pub recent_limit: i64,
    pub tiers: TierThresholds,
    pub attachment_name: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            hotel_name: "Panorama Hotel".to_string(),
            recent_limit: 5,
            tiers: TierThresholds::default(),
            attachment_name: "Hotel-Report.pdf".to_string(),
        }
    }
}

/// The rendering engine could not produce the report.
#[derive(Debug)]
pub enum RenderError {
    Template(askama::Error),
    Launch(String),
    Load(String),
    Export(String),
    Font(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Template(e) => write!(f, "Template error: {e}"),
            RenderError::Launch(e) => write!(f, "Render engine failed to start: {e}"),
            RenderError::Load(e) => write!(f, "Render engine failed to load content: {e}"),
            RenderError::Export(e) => write!(f, "Render engine failed to export PDF: {e}"),
            RenderError::Font(e) => write!(f, "PDF font unusable: {e}"),
        }
    }
}

impl std::error::Error for RenderError {}

impl From<askama::Error> for RenderError {
    fn from(e: askama::Error) -> Self {
        RenderError::Template(e)
    }
}

/// A run that stopped before delivery.
#[derive(Debug)]
pub enum PipelineError {
    Store(sqlx::Error),
    Render(RenderError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Store(e) => write!(f, "Store query failed: {e}"),
            PipelineError::Render(e) => write!(f, "Rendering failed: {e}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<sqlx::Error> for PipelineError {
    fn from(e: sqlx::Error) -> Self {
        PipelineError::Store(e)
    }
}

impl From<RenderError> for PipelineError {
    fn from(e: RenderError) -> Self {
        PipelineError::Render(e)
    }
}

/// How a run ended when it did not fail outright.
#[derive(Debug)]
pub enum PipelineRun {
    /// No submissions yet; nothing was rendered or sent.
    Skipped,
    Delivered(DeliveryOutcome),
}

pub struct ReportPipeline {
    store: Arc<dyn ReviewStore>,
    engine: Arc<dyn RenderEngine>,
    coordinator: DeliveryCoordinator,
    settings: ReportSettings,
}

impl ReportPipeline {
    pub fn new(
        store: Arc<dyn ReviewStore>,
        engine: Arc<dyn RenderEngine>,
        coordinator: DeliveryCoordinator,
        settings: ReportSettings,
    ) -> Self {
        Self { store, engine, coordinator, settings }
    }

    /// Aggregate, then render, then deliver. Each stage starts only after the
    /// previous one finished.
    pub async fn run(&self) -> Result<PipelineRun, PipelineError> {
        let (stats, recent) =
            match aggregator::compute_report(self.store.as_ref(), self.settings.recent_limit).await? {
                ReportData::Ready(stats, recent) => (stats, recent),
                ReportData::InsufficientData => return Ok(PipelineRun::Skipped),
            };

        let artifact = renderer::render(self.engine.as_ref(), &stats, &recent, &self.settings).await?;
        let metadata = ReportMetadata::for_report(&self.settings, artifact.total);
        let outcome = self.coordinator.deliver(&artifact, &metadata).await;

        Ok(PipelineRun::Delivered(outcome))
    }

    /// `run` with every outcome logged. This is the boundary of a spawned
    /// run: nothing here panics, and errors go no further than the log.
    pub async fn run_logged(&self) -> Result<PipelineRun, PipelineError> {
        log::info!("Starting survey report run");
        let result = self.run().await;
        match &result {
            Ok(PipelineRun::Skipped) => {
                log::info!("No reviews stored yet, report skipped");
            }
            Ok(PipelineRun::Delivered(outcome)) if outcome.is_success() => {
                log::info!(
                    "Survey report delivered via {} channel(s)",
                    outcome.results.len()
                );
            }
            Ok(PipelineRun::Delivered(outcome)) => {
                let failed: Vec<&str> = outcome.failures().map(|r| r.channel.as_str()).collect();
                let delivered: Vec<&str> = outcome.delivered().map(|r| r.channel.as_str()).collect();
                log::error!(
                    "Survey report partially failed: failed={:?} delivered={:?}",
                    failed,
                    delivered
                );
            }
            Err(e) => {
                log::error!("Survey report run aborted: {}", e);
            }
        }
        result
    }
}

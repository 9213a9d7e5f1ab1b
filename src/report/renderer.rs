use askama::Template;
use chrono::Utc;

use crate::models::review::Review;
use crate::templates_structs::{ReportEmailTemplate, ReportPrintTemplate};
use super::aggregator::ReportStatistics;
use super::document::ReportDocument;
use super::engine::{PrintJob, RenderEngine, RenderSession};
use super::{RenderError, ReportSettings};

/// Output of one render: the PDF attachment and the inline email body, both
/// produced from the same `ReportDocument`.
#[derive(Debug, Clone)]
pub struct ReportArtifact {
    pub pdf: Vec<u8>,
    pub html: String,
    pub total: i64,
}

/// Build the report document and export it through `engine`.
///
/// The engine session is closed whether or not loading and exporting succeed.
pub async fn render(
    engine: &dyn RenderEngine,
    stats: &ReportStatistics,
    recent: &[Review],
    settings: &ReportSettings,
) -> Result<ReportArtifact, RenderError> {
    let document = ReportDocument::build(stats, recent, settings, Utc::now());
    let html = ReportEmailTemplate { doc: &document }.render()?;
    let print_html = ReportPrintTemplate { doc: &document }.render()?;

    let mut session = engine.launch().await?;
    let job = PrintJob { document: &document, html: &print_html };
    let exported = export(session.as_mut(), &job).await;

    if let Err(e) = session.close().await {
        log::warn!("Render engine '{}' did not close cleanly: {}", engine.name(), e);
    }

    let pdf = exported?;
    log::info!("Rendered report PDF ({} bytes) with '{}'", pdf.len(), engine.name());

    Ok(ReportArtifact { pdf, html, total: document.total })
}

async fn export(session: &mut dyn RenderSession, job: &PrintJob<'_>) -> Result<Vec<u8>, RenderError> {
    session.load(job).await?;
    session.export().await
}

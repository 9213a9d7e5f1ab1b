//! PDF rendering engines.
//!
//! An engine hands out one `RenderSession` per render call. The caller must
//! `close()` the session on every path; sessions also release what they hold
//! when dropped.

pub mod builtin;
pub mod chromium;

use async_trait::async_trait;

use super::RenderError;
use super::document::ReportDocument;

pub use builtin::BuiltinPdfEngine;
pub use chromium::ChromiumEngine;

/// Everything an engine may need to lay out the report: the semantic model
/// and the print HTML rendered from it.
pub struct PrintJob<'a> {
    pub document: &'a ReportDocument,
    pub html: &'a str,
}

#[async_trait]
pub trait RenderEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// Acquire a session for exactly one render.
    async fn launch(&self) -> Result<Box<dyn RenderSession>, RenderError>;
}

#[async_trait]
pub trait RenderSession: Send {
    async fn load(&mut self, job: &PrintJob<'_>) -> Result<(), RenderError>;

    async fn export(&mut self) -> Result<Vec<u8>, RenderError>;

    /// Release the session. Safe to call after a failed load or export.
    async fn close(&mut self) -> Result<(), RenderError>;
}

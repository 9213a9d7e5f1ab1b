//! Headless Chromium print-to-PDF.
//!
//! Each session owns a scratch directory holding the page and the exported
//! file. The browser child is spawned with `kill_on_drop`, and `close()` kills
//! it if it is still running before removing the directory.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::{Child, Command};

use super::{PrintJob, RenderEngine, RenderSession};
use crate::report::RenderError;

const PAGE_FILE: &str = "report.html";
const PDF_FILE: &str = "report.pdf";

#[derive(Debug, Clone)]
pub struct ChromiumEngine {
    executable: String,
}

impl ChromiumEngine {
    pub fn new(executable: impl Into<String>) -> Self {
        Self { executable: executable.into() }
    }

    /// Open a session without boxing it.
    pub fn open_session(&self) -> Result<ChromiumSession, RenderError> {
        let workdir = tempfile::Builder::new()
            .prefix("survey-report-")
            .tempdir()
            .map_err(|e| RenderError::Launch(format!("scratch directory: {e}")))?;
        Ok(ChromiumSession {
            executable: self.executable.clone(),
            workdir: Some(workdir),
            child: None,
            loaded: false,
        })
    }
}

#[async_trait]
impl RenderEngine for ChromiumEngine {
    fn name(&self) -> &'static str {
        "chromium"
    }

    async fn launch(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        Ok(Box::new(self.open_session()?))
    }
}

pub struct ChromiumSession {
    executable: String,
    workdir: Option<TempDir>,
    child: Option<Child>,
    loaded: bool,
}

impl ChromiumSession {
    pub fn workdir(&self) -> Option<&Path> {
        self.workdir.as_ref().map(|d| d.path())
    }

    fn path_of(&self, file: &str) -> Result<PathBuf, RenderError> {
        self.workdir()
            .map(|d| d.join(file))
            .ok_or_else(|| RenderError::Load("session already closed".to_string()))
    }
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn load(&mut self, job: &PrintJob<'_>) -> Result<(), RenderError> {
        let page = self.path_of(PAGE_FILE)?;
        tokio::fs::write(&page, job.html)
            .await
            .map_err(|e| RenderError::Load(format!("write {}: {e}", page.display())))?;
        self.loaded = true;
        Ok(())
    }

    async fn export(&mut self) -> Result<Vec<u8>, RenderError> {
        if !self.loaded {
            return Err(RenderError::Export("no content loaded".to_string()));
        }
        let page = self.path_of(PAGE_FILE)?;
        let pdf = self.path_of(PDF_FILE)?;

        let child = Command::new(&self.executable)
            .arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--no-pdf-header-footer")
            .arg(format!("--print-to-pdf={}", pdf.display()))
            .arg(format!("file://{}", page.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RenderError::Launch(format!("{}: {e}", self.executable)))?;

        let status = self
            .child
            .insert(child)
            .wait()
            .await
            .map_err(|e| RenderError::Export(format!("waiting for browser: {e}")))?;
        self.child = None;

        if !status.success() {
            return Err(RenderError::Export(format!("browser exited with {status}")));
        }

        let bytes = tokio::fs::read(&pdf)
            .await
            .map_err(|e| RenderError::Export(format!("browser produced no PDF: {e}")))?;
        if bytes.is_empty() {
            return Err(RenderError::Export("browser produced an empty PDF".to_string()));
        }
        Ok(bytes)
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                log::warn!("Failed to kill browser process: {}", e);
            }
        }
        if let Some(dir) = self.workdir.take() {
            dir.close()
                .map_err(|e| RenderError::Export(format!("remove scratch directory: {e}")))?;
        }
        Ok(())
    }
}

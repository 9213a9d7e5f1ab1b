use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;

use super::{PipelineError, PipelineRun, ReportPipeline};

/// Counts persisted submissions and starts a report run every `threshold`
/// submissions.
///
/// The counter lives in process memory: it restarts at zero with the process,
/// and it resets when a run is started, not when delivery succeeds. Runs may
/// overlap if submissions arrive faster than reports are produced.
pub struct TriggerController {
    threshold: u32,
    counter: Mutex<u32>,
    pipeline: Arc<ReportPipeline>,
}

impl TriggerController {
    /// `threshold` of zero is treated as one.
    pub fn new(threshold: u32, pipeline: Arc<ReportPipeline>) -> Self {
        Self {
            threshold: threshold.max(1),
            counter: Mutex::new(0),
            pipeline,
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Submissions counted since the last run was started.
    pub fn pending(&self) -> u32 {
        *self.counter.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record one persisted submission. When the threshold is reached the
    /// counter resets and a pipeline run is spawned; the caller may drop the
    /// returned handle without waiting for it.
    pub fn on_submission_persisted(&self) -> Option<JoinHandle<Result<PipelineRun, PipelineError>>> {
        let fire = {
            let mut counter = self.counter.lock().unwrap_or_else(PoisonError::into_inner);
            *counter += 1;
            log::info!("New review recorded ({}/{})", *counter, self.threshold);
            if *counter >= self.threshold {
                *counter = 0;
                true
            } else {
                false
            }
        };

        if !fire {
            return None;
        }

        let pipeline = Arc::clone(&self.pipeline);
        Some(tokio::spawn(async move { pipeline.run_logged().await }))
    }
}

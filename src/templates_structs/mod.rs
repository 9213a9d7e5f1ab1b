// Template and response structures, organized by domain.

mod api;
mod report;

pub use self::api::{HealthResponse, SubmitResponse};
pub use self::report::{ReportEmailTemplate, ReportPrintTemplate};

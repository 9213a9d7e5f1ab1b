use askama::Template;

use crate::report::document::ReportDocument;

/// Full A4 page handed to the PDF engine.
#[derive(Template)]
#[template(path = "report/print.html")]
pub struct ReportPrintTemplate<'a> {
    pub doc: &'a ReportDocument,
}

/// Inline body for the report email.
#[derive(Template)]
#[template(path = "report/email.html")]
pub struct ReportEmailTemplate<'a> {
    pub doc: &'a ReportDocument,
}

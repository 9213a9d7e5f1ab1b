use crate::models::review::{RatingAverages, Review, ReviewStore};

/// Cumulative statistics over every stored submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportStatistics {
    pub total: i64,
    pub averages: RatingAverages,
}

/// The newest submissions, newest first.
pub type RecentWindow = Vec<Review>;

/// What the aggregator found. Having nothing to report is not an error.
#[derive(Debug, Clone)]
pub enum ReportData {
    Ready(ReportStatistics, RecentWindow),
    InsufficientData,
}

/// Read the store and shape the data for one report run.
///
/// Issues the aggregate query first; the recency query is only issued when
/// there is at least one submission.
pub async fn compute_report(
    store: &dyn ReviewStore,
    recent_limit: i64,
) -> Result<ReportData, sqlx::Error> {
    let summary = store.summary().await?;
    if summary.total <= 0 {
        return Ok(ReportData::InsufficientData);
    }

    let recent = store.most_recent(recent_limit).await?;

    Ok(ReportData::Ready(
        ReportStatistics {
            total: summary.total,
            averages: summary.averages,
        },
        recent,
    ))
}

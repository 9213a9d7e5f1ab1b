use async_trait::async_trait;
use sqlx::PgPool;

use super::queries;
use super::types::{NewReview, Review, ReviewSummary};

/// Durable, append-only record of survey submissions.
///
/// The report pipeline only reads through this trait; the intake handler is
/// the only writer.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn insert(&self, review: &NewReview) -> Result<i64, sqlx::Error>;

    async fn count_all(&self) -> Result<i64, sqlx::Error>;

    /// Total count plus per-dimension means over every stored submission.
    async fn summary(&self) -> Result<ReviewSummary, sqlx::Error>;

    /// At most `limit` submissions, newest first.
    async fn most_recent(&self, limit: i64) -> Result<Vec<Review>, sqlx::Error>;
}

#[async_trait]
impl ReviewStore for PgPool {
    async fn insert(&self, review: &NewReview) -> Result<i64, sqlx::Error> {
        queries::create(self, review).await
    }

    async fn count_all(&self) -> Result<i64, sqlx::Error> {
        queries::count_all(self).await
    }

    async fn summary(&self) -> Result<ReviewSummary, sqlx::Error> {
        queries::summary(self).await
    }

    async fn most_recent(&self, limit: i64) -> Result<Vec<Review>, sqlx::Error> {
        queries::find_recent(self, limit).await
    }
}

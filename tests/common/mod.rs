//! Shared test infrastructure for the report pipeline tests.
//!
//! # Fakes
//! - `MemoryStore` - in-memory `ReviewStore` with call counters and a failure switch
//! - `ScriptedEngine` - render engine that can fail at a chosen step and counts closes
//! - `RecordingChannel` - notification channel that records, fails, waits or hangs
//!
//! # Postgres
//! - `setup_test_db()` - isolated schema on `DATABASE_URL`, or `None` when unset

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::Barrier;

use hotel_survey::channels::{ChannelError, NotificationChannel};
use hotel_survey::models::review::{
    Dimension, NewReview, RatingAverages, Review, ReviewStore, ReviewSummary,
};
use hotel_survey::report::delivery::{DeliveryCoordinator, ReportMetadata};
use hotel_survey::report::engine::{PrintJob, RenderEngine, RenderSession};
use hotel_survey::report::renderer::ReportArtifact;
use hotel_survey::report::{RenderError, ReportPipeline, ReportSettings};

// ============================================================================
// FIXTURES
// ============================================================================

/// A submission that only rates the internet.
pub fn review_with_internet(score: Option<i32>) -> NewReview {
    let mut review = NewReview {
        guest_name: Some("Test Guest".to_string()),
        floor: Some(2),
        room_number: Some(204),
        ..Default::default()
    };
    review.ratings.set(Dimension::Internet, score);
    review
}

/// A submission that gives every service the same score.
pub fn review_with_all(score: i32) -> NewReview {
    let mut review = NewReview::default();
    for dimension in Dimension::ALL {
        review.ratings.set(dimension, Some(score));
    }
    review
}

pub fn artifact(total: i64) -> ReportArtifact {
    ReportArtifact {
        pdf: b"%PDF-1.5 test".to_vec(),
        html: format!("<p>{total}</p>"),
        total,
    }
}

pub fn metadata(total: i64) -> ReportMetadata {
    ReportMetadata::for_report(&ReportSettings::default(), total)
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Review>>,
    pub fail: AtomicBool,
    pub summary_calls: AtomicUsize,
    pub recent_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn seed(&self, reviews: &[NewReview]) {
        for review in reviews {
            self.insert(review).await.expect("seed insert");
        }
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn created_at(id: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::minutes(id)
    }

    fn check(&self) -> Result<(), sqlx::Error> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn insert(&self, review: &NewReview) -> Result<i64, sqlx::Error> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let id = rows.len() as i64 + 1;
        rows.push(Review {
            id,
            date: review.date.clone(),
            floor: review.floor,
            room_number: review.room_number,
            guest_name: review.guest_name.clone(),
            guest_phone: review.mobile_number.clone(),
            email: review.email.clone(),
            ratings: review.ratings.clone(),
            how_did_you_hear: review.how_did_you_hear.clone(),
            suggestions: review.comments.clone(),
            created_at: Self::created_at(id),
        });
        Ok(id)
    }

    async fn count_all(&self) -> Result<i64, sqlx::Error> {
        self.check()?;
        Ok(self.rows.lock().unwrap().len() as i64)
    }

    async fn summary(&self) -> Result<ReviewSummary, sqlx::Error> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let rows = self.rows.lock().unwrap();
        let mut averages = RatingAverages::default();
        for dimension in Dimension::ALL {
            let values: Vec<i32> = rows.iter().filter_map(|r| r.ratings.get(dimension)).collect();
            let mean = if values.is_empty() {
                None
            } else {
                Some(values.iter().map(|v| *v as f64).sum::<f64>() / values.len() as f64)
            };
            averages.set(dimension, mean);
        }
        Ok(ReviewSummary {
            total: rows.len() as i64,
            averages,
        })
    }

    async fn most_recent(&self, limit: i64) -> Result<Vec<Review>, sqlx::Error> {
        self.recent_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }
}

// ============================================================================
// SCRIPTED RENDER ENGINE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineScript {
    Succeed,
    FailLaunch,
    FailLoad,
    FailExport,
}

#[derive(Default)]
pub struct EngineLog {
    pub launches: AtomicUsize,
    pub closes: AtomicUsize,
    pub loaded_html: Mutex<Option<String>>,
    pub loaded_total: Mutex<Option<i64>>,
}

pub struct ScriptedEngine {
    script: EngineScript,
    pub log: Arc<EngineLog>,
}

impl ScriptedEngine {
    pub fn new(script: EngineScript) -> Arc<Self> {
        Arc::new(Self {
            script,
            log: Arc::new(EngineLog::default()),
        })
    }

    pub fn launches(&self) -> usize {
        self.log.launches.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.log.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RenderEngine for ScriptedEngine {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn launch(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        self.log.launches.fetch_add(1, Ordering::SeqCst);
        if self.script == EngineScript::FailLaunch {
            return Err(RenderError::Launch("engine binary missing".to_string()));
        }
        Ok(Box::new(ScriptedSession {
            script: self.script,
            log: Arc::clone(&self.log),
        }))
    }
}

struct ScriptedSession {
    script: EngineScript,
    log: Arc<EngineLog>,
}

#[async_trait]
impl RenderSession for ScriptedSession {
    async fn load(&mut self, job: &PrintJob<'_>) -> Result<(), RenderError> {
        if self.script == EngineScript::FailLoad {
            return Err(RenderError::Load("page crashed".to_string()));
        }
        *self.log.loaded_html.lock().unwrap() = Some(job.html.to_string());
        *self.log.loaded_total.lock().unwrap() = Some(job.document.total);
        Ok(())
    }

    async fn export(&mut self) -> Result<Vec<u8>, RenderError> {
        if self.script == EngineScript::FailExport {
            return Err(RenderError::Export("print failed".to_string()));
        }
        Ok(b"%PDF-scripted".to_vec())
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        self.log.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// RECORDING CHANNEL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    Succeed,
    Fail,
    Hang,
    Delay(Duration),
}

#[derive(Debug, Clone)]
pub struct Delivery {
    pub subject: String,
    pub caption: String,
    pub html: String,
    pub pdf: Vec<u8>,
}

pub struct RecordingChannel {
    name: String,
    mode: ChannelMode,
    barrier: Option<Arc<Barrier>>,
    pub attempts: AtomicUsize,
    pub deliveries: Mutex<Vec<Delivery>>,
}

impl RecordingChannel {
    pub fn new(name: &str, mode: ChannelMode) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            mode,
            barrier: None,
            attempts: AtomicUsize::new(0),
            deliveries: Mutex::new(Vec::new()),
        })
    }

    /// A channel that only proceeds once every channel sharing `barrier` has started.
    pub fn gated(name: &str, barrier: Arc<Barrier>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            mode: ChannelMode::Succeed,
            barrier: Some(barrier),
            attempts: AtomicUsize::new(0),
            deliveries: Mutex::new(Vec::new()),
        })
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn delivered(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, artifact: &ReportArtifact, metadata: &ReportMetadata) -> Result<(), ChannelError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        match self.mode {
            ChannelMode::Fail => {
                return Err(ChannelError::Rejected {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            ChannelMode::Hang => std::future::pending::<()>().await,
            ChannelMode::Delay(d) => tokio::time::sleep(d).await,
            ChannelMode::Succeed => {}
        }
        self.deliveries.lock().unwrap().push(Delivery {
            subject: metadata.subject.clone(),
            caption: metadata.caption.clone(),
            html: artifact.html.clone(),
            pdf: artifact.pdf.clone(),
        });
        Ok(())
    }
}

pub fn coordinator(channels: &[Arc<RecordingChannel>]) -> DeliveryCoordinator {
    DeliveryCoordinator::new(
        channels
            .iter()
            .map(|c| Arc::clone(c) as Arc<dyn NotificationChannel>)
            .collect(),
    )
}

pub fn pipeline(
    store: &Arc<MemoryStore>,
    engine: Arc<dyn RenderEngine>,
    channels: &[Arc<RecordingChannel>],
) -> Arc<ReportPipeline> {
    Arc::new(ReportPipeline::new(
        Arc::clone(store) as Arc<dyn ReviewStore>,
        engine,
        coordinator(channels),
        ReportSettings::default(),
    ))
}

/// Poll `check` until it holds or two seconds pass.
pub async fn eventually<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

// ============================================================================
// DATABASE SETUP
// ============================================================================

/// A throwaway schema on the database named by `DATABASE_URL`.
pub struct TestDb {
    pool: PgPool,
    admin: PgPool,
    schema: String,
}

impl TestDb {
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn teardown(self) {
        self.pool.close().await;
        let _ = sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.schema))
            .execute(&self.admin)
            .await;
    }
}

/// Returns `None` (and the calling test should return early) when no
/// database is configured.
pub async fn setup_test_db() -> Option<TestDb> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres test");
        return None;
    };

    let admin = PgPool::connect(&url).await.expect("Failed to connect to test DB");
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    let schema = format!("survey_test_{}_{}", std::process::id(), nanos);
    sqlx::query(&format!("CREATE SCHEMA {schema}"))
        .execute(&admin)
        .await
        .expect("Failed to create test schema");

    let search_path = schema.clone();
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .after_connect(move |conn, _meta| {
            let sql = format!("SET search_path TO {search_path}");
            Box::pin(async move {
                sqlx::query(&sql).execute(conn).await?;
                Ok(())
            })
        })
        .connect(&url)
        .await
        .expect("Failed to open test pool");

    hotel_survey::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    Some(TestDb { pool, admin, schema })
}

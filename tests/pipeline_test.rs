mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::*;
use hotel_survey::report::engine::BuiltinPdfEngine;
use hotel_survey::report::{PipelineError, PipelineRun, RenderError};

#[tokio::test]
async fn test_end_to_end_with_builtin_engine() {
    let store = MemoryStore::new();
    store
        .seed(&[
            review_with_internet(Some(5)),
            review_with_internet(Some(4)),
            review_with_internet(None),
        ])
        .await;
    let email = RecordingChannel::new("email", ChannelMode::Succeed);
    let whatsapp = RecordingChannel::new("whatsapp", ChannelMode::Succeed);
    let pipeline = pipeline(&store, Arc::new(BuiltinPdfEngine::default()), &[email.clone(), whatsapp.clone()]);

    let run = pipeline.run().await.unwrap();

    let PipelineRun::Delivered(outcome) = run else {
        panic!("expected a delivered report");
    };
    assert!(outcome.is_success());

    let sent = &email.delivered()[0];
    assert!(sent.pdf.starts_with(b"%PDF-"));
    // Subject and caption carry the total the rendered document reported.
    assert!(sent.subject.contains("(3 reviews)"));
    assert!(sent.caption.contains("Total reviews so far: 3"));
    assert!(sent.html.contains("Total reviews: <strong>3</strong>"));
    assert!(sent.html.contains("4.50"));
    assert_eq!(whatsapp.delivered()[0].pdf, sent.pdf);
}

#[tokio::test]
async fn test_store_failure_stops_before_rendering() {
    let store = MemoryStore::new();
    store.seed(&[review_with_all(4)]).await;
    store.fail.store(true, Ordering::SeqCst);
    let engine = ScriptedEngine::new(EngineScript::Succeed);
    let channel = RecordingChannel::new("email", ChannelMode::Succeed);
    let pipeline = pipeline(&store, engine.clone(), &[channel.clone()]);

    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(err, PipelineError::Store(_)));
    assert_eq!(engine.launches(), 0);
    assert_eq!(channel.attempts(), 0);
}

#[tokio::test]
async fn test_render_failure_stops_before_delivery() {
    let store = MemoryStore::new();
    store.seed(&[review_with_all(4)]).await;
    let engine = ScriptedEngine::new(EngineScript::FailLoad);
    let channel = RecordingChannel::new("email", ChannelMode::Succeed);
    let pipeline = pipeline(&store, engine.clone(), &[channel.clone()]);

    let err = pipeline.run_logged().await.unwrap_err();

    assert!(matches!(err, PipelineError::Render(RenderError::Load(_))));
    assert_eq!(engine.closes(), 1);
    assert_eq!(channel.attempts(), 0);
}

#[tokio::test]
async fn test_partial_delivery_is_reported_not_raised() {
    let store = MemoryStore::new();
    store.seed(&[review_with_all(2)]).await;
    let email = RecordingChannel::new("email", ChannelMode::Fail);
    let whatsapp = RecordingChannel::new("whatsapp", ChannelMode::Succeed);
    let pipeline = pipeline(&store, Arc::new(BuiltinPdfEngine::default()), &[email, whatsapp.clone()]);

    let run = pipeline.run_logged().await.unwrap();

    let PipelineRun::Delivered(outcome) = run else {
        panic!("expected a delivered report");
    };
    assert_eq!(outcome.failures().count(), 1);
    assert_eq!(whatsapp.delivered().len(), 1);
}

// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

//! End-to-end scenarios from §8 (S1-S6), exercised against the orchestrator
//! and cache directly rather than the process-wide [`spa_guard::Runtime`]
//! singleton, so each test gets its own isolated collaborators.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use spa_guard::{CacheBuildRequest, CacheRequest, DedupeReason, Event, HtmlCache, TriggerRequest, TriggerResult};
use spa_guard_clock::FakeClock;
use spa_guard_error::NullDiagnostics;
use spa_guard_events::EventBus;
use spa_guard_options::Options;
use spa_guard_retry::{FakePage, RetryOrchestrator};

fn events_recorder(bus: &EventBus) -> Arc<Mutex<Vec<Event>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = Arc::clone(&events);
    std::mem::forget(bus.subscribe(move |event| events_clone.lock().unwrap().push(event.clone())));
    events
}

#[tokio::test]
async fn s1_first_chunk_failure_schedules_attempt_one_and_navigates() {
    let clock = FakeClock::new();
    let page = Arc::new(FakePage::new("https://example.com/app"));
    let bus = EventBus::new(Arc::new(NullDiagnostics));
    let events = events_recorder(&bus);
    let orchestrator = RetryOrchestrator::with_collaborators(Arc::new(clock.clone()), Arc::clone(&page), bus, Arc::new(NullDiagnostics), Arc::new(Options::default()));

    let result = orchestrator.trigger_retry(TriggerRequest::new("chunk-error"));
    assert_eq!(result, TriggerResult::Accepted);

    tokio::task::yield_now().await;
    let recorded = events.lock().unwrap().clone();
    assert_eq!(recorded.len(), 1);
    match &recorded[0] {
        Event::RetryAttempt { attempt, delay_ms, retry_id } => {
            assert_eq!(*attempt, 1);
            assert_eq!(*delay_ms, 0);
            assert!(!retry_id.is_empty());
        }
        other => panic!("unexpected event: {other:?}"),
    }

    // The first delay is 0ms; let the spawned timer run to completion.
    tokio::time::sleep(Duration::from_millis(10)).await;
    let navigations = page.navigations();
    assert_eq!(navigations.len(), 1);
    let decoded = spa_guard_url::decode(&navigations[0]);
    assert_eq!(decoded.attempt, Some(1));
}

#[tokio::test]
async fn s2_third_attempt_exhausts_budget_and_shows_fallback() {
    let page = Arc::new(FakePage::new("https://example.com/app?spa_guard_retry_attempt=3&spa_guard_retry_id=R1"));
    page.set_navigation_age(Duration::from_millis(200));
    let clock = FakeClock::new();
    let bus = EventBus::new(Arc::new(NullDiagnostics));
    let events = events_recorder(&bus);
    let orchestrator = RetryOrchestrator::with_collaborators(Arc::new(clock), page, bus, Arc::new(NullDiagnostics), Arc::new(Options::default()));

    let result = orchestrator.trigger_retry(TriggerRequest::new("chunk-error"));
    assert_eq!(result, TriggerResult::Fallback);

    tokio::task::yield_now().await;
    let recorded = events.lock().unwrap().clone();
    assert_eq!(recorded.len(), 2);
    match &recorded[0] {
        Event::RetryExhausted { final_attempt, retry_id } => {
            assert_eq!(*final_attempt, 3);
            assert_eq!(retry_id, "R1");
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(recorded[1], Event::FallbackUiShown);
}

#[tokio::test]
async fn s3_stale_url_params_past_reset_window_start_a_fresh_session() {
    let page = Arc::new(FakePage::new("https://example.com/app?spa_guard_retry_attempt=3&spa_guard_retry_id=R1"));
    page.set_navigation_age(Duration::from_millis(30_000));
    let clock = FakeClock::new();
    let bus = EventBus::new(Arc::new(NullDiagnostics));
    let events = events_recorder(&bus);
    let orchestrator = RetryOrchestrator::with_collaborators(Arc::new(clock), page, bus, Arc::new(NullDiagnostics), Arc::new(Options::default()));

    let result = orchestrator.trigger_retry(TriggerRequest::new("chunk-error"));
    assert_eq!(result, TriggerResult::Accepted);

    tokio::task::yield_now().await;
    let recorded = events.lock().unwrap().clone();
    assert_eq!(recorded.len(), 2);
    match &recorded[0] {
        Event::RetryReset { previous_attempt, previous_retry_id, time_since_reload_ms } => {
            assert_eq!(*previous_attempt, 3);
            assert_eq!(previous_retry_id, "R1");
            assert_eq!(*time_since_reload_ms, 30_000);
        }
        other => panic!("unexpected event: {other:?}"),
    }
    match &recorded[1] {
        Event::RetryAttempt { attempt, retry_id, .. } => {
            assert_eq!(*attempt, 1);
            assert_ne!(retry_id, "R1");
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn s4_two_synchronous_triggers_dedupe_to_a_single_reload() {
    let clock = FakeClock::new();
    let page = Arc::new(FakePage::new("https://example.com/app"));
    let bus = EventBus::new(Arc::new(NullDiagnostics));
    let orchestrator = RetryOrchestrator::with_collaborators(Arc::new(clock.clone()), Arc::clone(&page), bus, Arc::new(NullDiagnostics), Arc::new(Options::default()));

    let first = orchestrator.trigger_retry(TriggerRequest::new("chunk-error"));
    let second = orchestrator.trigger_retry(TriggerRequest::new("chunk-error"));

    assert_eq!(first, TriggerResult::Accepted);
    assert_eq!(second, TriggerResult::Deduped(DedupeReason::AlreadyScheduled));

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(page.navigations().len(), 1);
}

#[tokio::test]
async fn s5_accept_language_negotiates_korean() {
    let cache = HtmlCache::build(
        CacheBuildRequest::new("<!doctype html><html><head><title>t</title></head><body></body></html>")
            .with_languages(vec!["en".to_string(), "ko".to_string()]),
    )
    .unwrap();

    let response = cache.get(&CacheRequest {
        accept_language: Some("ko-KR,ko;q=0.9,en;q=0.8".to_string()),
        ..Default::default()
    });

    assert_eq!(response.header("Content-Language"), Some("ko"));
    let body = String::from_utf8(response.body).unwrap();
    assert!(body.contains(r#"lang="ko""#));
}

#[tokio::test]
async fn s6_conditional_request_with_version_marker_etag_round_trips() {
    let html = r#"<!doctype html><html><head><title>t</title></head><body></body></html><!-- __SPA_GUARD_VERSION__="1.2.3" -->"#;
    let cache = HtmlCache::build(CacheBuildRequest::new(html).with_languages(vec!["en".to_string(), "ko".to_string()])).unwrap();

    let first = cache.get(&CacheRequest { lang: Some("ko".to_string()), ..Default::default() });
    assert_eq!(first.status_code, 200);
    assert_eq!(first.header("ETag"), Some(r#""1.2.3-ko""#));

    let second = cache.get(&CacheRequest {
        lang: Some("ko".to_string()),
        if_none_match: Some(r#""1.2.3-ko""#.to_string()),
        ..Default::default()
    });
    assert_eq!(second.status_code, 304);
    assert!(second.body.is_empty());
    assert_eq!(second.header("ETag"), Some(r#""1.2.3-ko""#));
}

#[test]
fn smoke_process_wide_runtime_boots_and_resets() {
    spa_guard::reset_for_tests();
    let page = Arc::new(FakePage::new("https://example.com/app"));
    let runtime = spa_guard::init_with_defaults(page, Options::default());
    assert_eq!(runtime.orchestrator.get_retry_snapshot().phase, spa_guard::Phase::Idle);
    let also_alive = AtomicBool::new(true);
    assert!(also_alive.load(Ordering::SeqCst));
    spa_guard::reset_for_tests();
}

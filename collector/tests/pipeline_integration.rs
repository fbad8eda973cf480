//! End-to-end collection and dispatch tests
//!
//! Builds orchestrators from configuration and checks what reaches the sink,
//! how failures stay isolated per signal, and how shutdown behaves.

use std::sync::Arc;
use std::time::Duration;

use approx::assert_relative_eq;
use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use flowstate_clock::{ManualClock, SystemClock};
use flowstate_collector::application::{
    AggregateState, CollectorSettings, FallbackChain, Orchestrator, OrchestratorConfig,
    SampleCache, SignalCollector,
};
use flowstate_collector::config::load_config_from_str;
use flowstate_collector::infrastructure::{CacheFileStore, HttpSink, SourceRegistry};
use flowstate_collector::{ConfigError, OrchestratorError, build_orchestrator};
use flowstate_core::{FocusPayload, RawSample, SignalKind, SignalStatus};
use flowstate_ports::{Clock, FocusSink, SignalSource, SinkError, SinkResult, SourceError, SourceResult};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::watch;

// ============================================================================
// Test Fixtures
// ============================================================================

/// Sink that keeps every payload and can be told to fail
#[derive(Default)]
struct RecordingSink {
    payloads: Mutex<Vec<FocusPayload>>,
    failures_left: Mutex<u32>,
}

#[async_trait]
impl FocusSink for RecordingSink {
    async fn dispatch(&self, payload: &FocusPayload) -> SinkResult<()> {
        {
            let mut left = self.failures_left.lock();
            if *left > 0 {
                *left -= 1;
                return Err(SinkError::Unreachable("connection refused".into()));
            }
        }
        self.payloads.lock().push(payload.clone());
        Ok(())
    }
}

/// Source that always fails and never lets the chain fall back
struct AlwaysDown(SignalKind);

#[async_trait]
impl SignalSource for AlwaysDown {
    fn name(&self) -> &str {
        "always_down"
    }

    fn kind(&self) -> SignalKind {
        self.0
    }

    fn is_simulated(&self) -> bool {
        true
    }

    async fn fetch(&mut self) -> SourceResult<RawSample> {
        Err(SourceError::Unavailable("offline".into()))
    }
}

/// Source returning a constant
struct Constant(SignalKind, f64);

#[async_trait]
impl SignalSource for Constant {
    fn name(&self) -> &str {
        "constant"
    }

    fn kind(&self) -> SignalKind {
        self.0
    }

    async fn fetch(&mut self) -> SourceResult<RawSample> {
        Ok(RawSample::new(self.1, "constant", chrono::Utc::now()))
    }
}

fn settings(kind: SignalKind) -> CollectorSettings {
    CollectorSettings {
        kind,
        interval: Duration::from_secs(1),
        cache_ttl: Duration::from_secs(0),
        cache_path: None,
        retry_backoff: Duration::from_secs(1),
        fetch_timeout: Duration::from_secs(1),
    }
}

fn collector(
    source: Box<dyn SignalSource>,
    state: &Arc<AggregateState>,
    clock: &Arc<dyn Clock>,
) -> SignalCollector {
    let kind = source.kind();
    let settings = settings(kind);
    let chain = FallbackChain::new(kind, vec![source], settings.fetch_timeout, Arc::clone(clock));
    let cache = SampleCache::new(kind, settings.cache_ttl, Arc::clone(clock));
    SignalCollector::new(settings, chain, cache, Arc::clone(state))
}

fn quick_config() -> OrchestratorConfig {
    OrchestratorConfig {
        send_interval: Duration::from_secs(1),
        startup_delay: Duration::from_millis(500),
        shutdown_timeout: Duration::from_secs(1),
        ..Default::default()
    }
}

/// Start a sink server that records posted JSON bodies
async fn start_sink_server(status: StatusCode) -> (String, Arc<Mutex<Vec<Value>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));

    async fn record(
        State((bodies, status)): State<(Arc<Mutex<Vec<Value>>>, StatusCode)>,
        Json(body): Json<Value>,
    ) -> (StatusCode, &'static str) {
        bodies.lock().push(body);
        (status, "ok")
    }

    let app = Router::new()
        .route("/data", post(record))
        .with_state((Arc::clone(&received), status));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), received)
}

// ============================================================================
// Dispatch
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_dispatch_cadence_and_values() {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = Arc::new(AggregateState::new(Arc::clone(&clock)));
    let sink = Arc::new(RecordingSink::default());
    let mut orchestrator = Orchestrator::new(quick_config(), Arc::clone(&state), sink.clone());
    orchestrator.add_collector(collector(Box::new(Constant(SignalKind::Hrv, 88.0)), &state, &clock));
    orchestrator.add_collector(collector(Box::new(Constant(SignalKind::Notifications, 0.0)), &state, &clock));
    orchestrator.add_collector(collector(Box::new(Constant(SignalKind::Noise, 2.5)), &state, &clock));
    assert_eq!(orchestrator.start(), Ok(3));

    let (stop_tx, stop_rx) = watch::channel(false);
    let stopper = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(3700)).await;
        stop_tx.send(true).unwrap();
    });
    orchestrator.run_until(stop_rx).await;
    stopper.await.unwrap();

    // Dispatches at 0.5s, 1.5s, 2.5s, 3.5s
    let payloads = sink.payloads.lock().clone();
    assert_eq!(payloads.len(), 4);
    let last = payloads.last().unwrap();
    assert_eq!(last.hrv_rmssd, 88.0);
    assert_eq!(last.notification_count, 0.0);
    assert_eq!(last.ambient_noise, 2.5);
    assert!(last.focus_score.is_none());

    assert!(orchestrator.shutdown().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failed_dispatch_does_not_stop_schedule() {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = Arc::new(AggregateState::new(clock));
    let sink = Arc::new(RecordingSink {
        failures_left: Mutex::new(2),
        ..Default::default()
    });
    let orchestrator = Orchestrator::new(quick_config(), state, sink.clone());

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(4700)).await;
        let _ = stop_tx.send(true);
    });
    orchestrator.run_until(stop_rx).await;

    // Five attempts, the first two rejected
    assert_eq!(sink.payloads.lock().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_score_attached_when_enabled() {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = Arc::new(AggregateState::new(clock));
    state.update(SignalKind::Hrv, 70.0);
    state.update(SignalKind::Notifications, 2.5);
    state.update(SignalKind::Noise, 5.0);

    let config = OrchestratorConfig {
        include_score: true,
        ..quick_config()
    };
    let orchestrator = Orchestrator::new(config, state, Arc::new(RecordingSink::default()));

    let payload = orchestrator.dispatch_once().await.unwrap();
    assert_relative_eq!(payload.focus_score.unwrap(), 50.0, epsilon = 1e-9);
}

#[tokio::test]
async fn test_http_sink_posts_payload_json() {
    let (base, received) = start_sink_server(StatusCode::OK).await;
    let sink = HttpSink::new(&base, Duration::from_secs(5)).unwrap();

    sink.dispatch(&FocusPayload::new(72.0, 1.25, 3.5)).await.unwrap();

    let bodies = received.lock().clone();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["hrv_rmssd"], 72.0);
    assert_eq!(bodies[0]["notification_count"], 1.25);
    assert_eq!(bodies[0]["ambient_noise"], 3.5);
    assert!(bodies[0].get("focus_score").is_none());
}

#[tokio::test]
async fn test_http_sink_reports_rejection() {
    let (base, _) = start_sink_server(StatusCode::UNPROCESSABLE_ENTITY).await;
    let sink = HttpSink::new(&base, Duration::from_secs(5)).unwrap();

    let err = sink.dispatch(&FocusPayload::new(70.0, 0.0, 5.0)).await.unwrap_err();
    assert_eq!(
        err,
        SinkError::Rejected {
            status: 422,
            body: "ok".into()
        }
    );
}

#[tokio::test]
async fn test_http_sink_unreachable() {
    let sink = HttpSink::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();

    assert!(matches!(
        sink.dispatch(&FocusPayload::new(70.0, 0.0, 5.0)).await,
        Err(SinkError::Unreachable(_))
    ));
}

// ============================================================================
// Isolation and shared state
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_one_failing_signal_does_not_affect_others() {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = Arc::new(AggregateState::new(Arc::clone(&clock)));
    let sink = Arc::new(RecordingSink::default());
    let mut orchestrator = Orchestrator::new(quick_config(), Arc::clone(&state), sink.clone());
    orchestrator.add_collector(collector(Box::new(Constant(SignalKind::Hrv, 91.0)), &state, &clock));
    orchestrator.add_collector(collector(Box::new(AlwaysDown(SignalKind::Notifications)), &state, &clock));
    orchestrator.add_collector(collector(Box::new(Constant(SignalKind::Noise, 1.5)), &state, &clock));
    orchestrator.start().unwrap();

    tokio::time::sleep(Duration::from_millis(2500)).await;

    let report = orchestrator.status_report();
    assert_eq!(report[&SignalKind::Hrv].status, SignalStatus::Active);
    assert_eq!(report[&SignalKind::Noise].status, SignalStatus::Active);
    let notifications = &report[&SignalKind::Notifications];
    assert_eq!(notifications.status, SignalStatus::Failed);
    assert_eq!(notifications.value, 0.0);
    assert!(notifications.last_update.is_none());

    let payload = orchestrator.dispatch_once().await.unwrap();
    assert_eq!(payload.hrv_rmssd, 91.0);
    assert_eq!(payload.notification_count, 0.0);

    assert!(orchestrator.shutdown().await.is_empty());
}

const WRITERS_PER_KIND: u32 = 4;

/// Distinct value set of writer `w`: 100 + 10w .. 100 + 10w + 4
fn written_value(writer: u32, i: u32) -> f64 {
    (100 + writer * 10 + i % 5) as f64
}

fn is_written_value(v: f64) -> bool {
    (0..WRITERS_PER_KIND).any(|w| (0..5).any(|i| written_value(w, i) == v))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_and_snapshots() {
    let state = Arc::new(AggregateState::new(Arc::new(SystemClock)));

    let mut writers = Vec::new();
    for kind in SignalKind::ALL {
        for w in 0..WRITERS_PER_KIND {
            let state = Arc::clone(&state);
            writers.push(tokio::spawn(async move {
                for i in 0..2000 {
                    state.update(kind, written_value(w, i));
                    if i % 100 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            }));
        }
    }

    let reader = {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            for _ in 0..2000 {
                let snap = state.snapshot();
                for (kind, v) in SignalKind::ALL.into_iter().zip([snap.hrv, snap.notifications, snap.noise]) {
                    assert!(
                        v == kind.default_value() || is_written_value(v),
                        "{kind} read torn value {v}"
                    );
                }
                tokio::task::yield_now().await;
            }
        })
    };

    for w in writers {
        w.await.unwrap();
    }
    reader.await.unwrap();

    let snap = state.snapshot();
    for v in [snap.hrv, snap.notifications, snap.noise] {
        assert!(is_written_value(v), "final value {v} was never written");
    }
    for kind in SignalKind::ALL {
        assert_eq!(state.get(kind).status, SignalStatus::Active);
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_orchestrator_from_config_runs_and_stops() {
    let config = load_config_from_str(
        r#"{
            "send_interval_secs": 1,
            "startup_delay_ms": 100,
            "collectors": {
                "hrv": {"sources": ["apple_healthkit"], "persist_cache": false},
                "notifications": {"sources": ["activity"]},
                "noise": {"sources": []}
            }
        }"#,
    )
    .unwrap();
    let sink = Arc::new(RecordingSink::default());
    let mut orchestrator = build_orchestrator(
        &config,
        &SourceRegistry::with_defaults(),
        Arc::new(SystemClock),
        sink.clone(),
    )
    .unwrap();
    assert_eq!(orchestrator.start(), Ok(3));

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(2500)).await;
        let _ = stop_tx.send(true);
    });
    orchestrator.run_until(stop_rx).await;

    let payloads = sink.payloads.lock().clone();
    assert!(!payloads.is_empty());
    for p in &payloads {
        assert!((40.0..=100.0).contains(&p.hrv_rmssd));
        assert!((0.0..=5.0).contains(&p.notification_count));
        assert!((0.0..=10.0).contains(&p.ambient_noise));
    }
    for kind in SignalKind::ALL {
        assert_eq!(orchestrator.state().get(kind).status, SignalStatus::Active);
    }

    assert!(orchestrator.shutdown().await.is_empty());
    assert!(orchestrator.running().is_empty());
}

#[tokio::test]
async fn test_start_with_nothing_to_run() {
    let state = Arc::new(AggregateState::new(Arc::new(SystemClock)));
    let mut orchestrator = Orchestrator::new(quick_config(), state, Arc::new(RecordingSink::default()));

    assert_eq!(orchestrator.start(), Err(OrchestratorError::NoEnabledSignals));
}

#[test]
fn test_oversized_notification_window_is_a_config_error() {
    let config = load_config_from_str(
        r#"{"calibration": {"window_secs": 10000000000000000}, "collectors": {"notifications": {"sources": ["activity"]}}}"#,
    )
    .unwrap();
    let result = build_orchestrator(
        &config,
        &SourceRegistry::with_defaults(),
        Arc::new(SystemClock),
        Arc::new(RecordingSink::default()),
    );

    assert!(matches!(result, Err(ConfigError::InvalidCalibration(_))));
}

/// Source that ignores cancellation for a long time
struct Stubborn;

#[async_trait]
impl SignalSource for Stubborn {
    fn name(&self) -> &str {
        "stubborn"
    }

    fn kind(&self) -> SignalKind {
        SignalKind::Noise
    }

    async fn fetch(&mut self) -> SourceResult<RawSample> {
        std::thread::sleep(Duration::from_millis(1500));
        Ok(RawSample::new(1.0, "stubborn", chrono::Utc::now()))
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_reports_stragglers() {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = Arc::new(AggregateState::new(Arc::clone(&clock)));
    let config = OrchestratorConfig {
        shutdown_timeout: Duration::from_millis(200),
        ..quick_config()
    };
    let mut orchestrator = Orchestrator::new(config, Arc::clone(&state), Arc::new(RecordingSink::default()));
    let mut settings = settings(SignalKind::Noise);
    settings.fetch_timeout = Duration::from_secs(10);
    let chain = FallbackChain::new(SignalKind::Noise, vec![Box::new(Stubborn)], settings.fetch_timeout, Arc::clone(&clock));
    let cache = SampleCache::new(SignalKind::Noise, settings.cache_ttl, Arc::clone(&clock));
    orchestrator.add_collector(SignalCollector::new(settings, chain, cache, Arc::clone(&state)));
    orchestrator.start().unwrap();

    // Let the loop enter the blocking fetch
    tokio::time::sleep(Duration::from_millis(100)).await;
    let stragglers = orchestrator.shutdown().await;
    assert_eq!(stragglers, vec![SignalKind::Noise]);
}

// ============================================================================
// Cache persistence
// ============================================================================

#[tokio::test]
async fn test_cached_value_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hrv_cache.json");
    let clock = ManualClock::starting_now();
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());

    let mut hrv_settings = settings(SignalKind::Hrv);
    hrv_settings.cache_ttl = Duration::from_secs(300);

    // First run: fetch from a working source and persist
    {
        let state = Arc::new(AggregateState::new(Arc::clone(&shared)));
        let chain = FallbackChain::new(
            SignalKind::Hrv,
            vec![Box::new(Constant(SignalKind::Hrv, 77.7))],
            hrv_settings.fetch_timeout,
            Arc::clone(&shared),
        );
        let cache = SampleCache::new(SignalKind::Hrv, hrv_settings.cache_ttl, Arc::clone(&shared))
            .with_store(Box::new(CacheFileStore::new(&path)));
        let mut collector = SignalCollector::new(hrv_settings.clone(), chain, cache, state);
        collector.cycle().await;
    }
    assert!(path.exists());

    // Second run two minutes later: provider is down but the cache is fresh
    clock.advance_secs(120);
    let state = Arc::new(AggregateState::new(Arc::clone(&shared)));
    let chain = FallbackChain::new(
        SignalKind::Hrv,
        vec![Box::new(AlwaysDown(SignalKind::Hrv))],
        hrv_settings.fetch_timeout,
        Arc::clone(&shared),
    );
    let mut cache = SampleCache::new(SignalKind::Hrv, hrv_settings.cache_ttl, Arc::clone(&shared))
        .with_store(Box::new(CacheFileStore::new(&path)));
    assert!(cache.warm());
    let mut collector = SignalCollector::new(hrv_settings, chain, cache, Arc::clone(&state));

    collector.cycle().await;
    let hrv = state.get(SignalKind::Hrv);
    assert_eq!(hrv.current_value, 77.7);
    assert_eq!(hrv.status, SignalStatus::Active);

    // Past the TTL the dead provider is consulted and the signal fails
    clock.advance_secs(200);
    collector.cycle().await;
    let hrv = state.get(SignalKind::Hrv);
    assert_eq!(hrv.status, SignalStatus::Failed);
    assert_eq!(hrv.current_value, 77.7);
}

#[tokio::test]
async fn test_corrupt_cache_file_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hrv_cache.json");
    std::fs::write(&path, "{\"value\": \"oops\"").unwrap();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut cache = SampleCache::new(SignalKind::Hrv, Duration::from_secs(300), clock)
        .with_store(Box::new(CacheFileStore::new(&path)));

    assert!(!cache.warm());
    assert!(cache.should_refresh());
}

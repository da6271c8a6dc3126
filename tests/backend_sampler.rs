//! Backend sampler tests against mock HTTP backends.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use backend_monitor::backend::{
    BackendSampler, HostTarget, ProbeError, ProbeOutcome, SetupError, TlsSettings,
};
use backend_monitor::disruption::compute_disruption;
use backend_monitor::monitorapi::{BackendConnectionType, Level};
use backend_monitor::recorder::{InMemoryRecorder, Recorder};
use backend_monitor::sampler::{Sampler, SamplerHook};

mod common;

fn sampler_for(url: String, connection: BackendConnectionType) -> BackendSampler {
    BackendSampler::new("mock", HostTarget::Static(url), "/healthz", connection)
        .with_timeout(Duration::from_secs(2))
}

/// Run one uncancelled check.
async fn check(sampler: &BackendSampler) -> ProbeOutcome {
    sampler
        .check_connection(&CancellationToken::new())
        .await
        .expect("check was not cancelled")
}

/// Backend that fails requests whose index falls in `failing`.
async fn scripted_backend(failing: std::ops::Range<usize>) -> common::MockBackend {
    let count = Arc::new(AtomicUsize::new(0));
    common::start_programmable_backend(move |_| {
        let n = count.fetch_add(1, Ordering::SeqCst);
        if failing.contains(&n) {
            (503, "unavailable".into())
        } else {
            (200, "ok".into())
        }
    })
    .await
}

#[tokio::test]
async fn test_request_headers() {
    let backend = common::start_mock_backend("ok").await;
    let sampler = sampler_for(backend.url(), BackendConnectionType::Reused)
        .with_user_agent("monitor-test/1.0");

    let outcome = check(&sampler).await;
    assert!(outcome.result.is_ok(), "{:?}", outcome.result);

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/healthz");
    assert_eq!(requests[0].header("audit-id"), Some(outcome.audit_id.as_str()));
    assert_eq!(requests[0].header("user-agent"), Some("monitor-test/1.0"));
    assert!(requests[0].header("authorization").is_none());
}

#[tokio::test]
async fn test_status_classification() {
    let backend = common::start_programmable_backend(|_| (503, "down".into())).await;
    let sampler = sampler_for(backend.url(), BackendConnectionType::New);
    match check(&sampler).await.result {
        Err(ProbeError::Status { status, body }) => {
            assert!(status.starts_with("503"));
            assert_eq!(body, "down");
        }
        other => panic!("expected status error, got {:?}", other),
    }

    let expecting_503 =
        sampler_for(backend.url(), BackendConnectionType::New).with_expected_status_code(503);
    assert!(check(&expecting_503).await.result.is_ok());
}

#[tokio::test]
async fn test_accepted_status_range() {
    let redirecting = common::start_programmable_backend(|_| (302, String::new())).await;
    let sampler = sampler_for(redirecting.url(), BackendConnectionType::New);
    assert!(check(&sampler).await.result.is_ok());

    let rejecting = common::start_programmable_backend(|_| (400, "bad".into())).await;
    let sampler = sampler_for(rejecting.url(), BackendConnectionType::New);
    assert!(matches!(
        check(&sampler).await.result,
        Err(ProbeError::Status { .. })
    ));
}

#[tokio::test]
async fn test_body_expectations() {
    let backend = common::start_mock_backend("status: degraded").await;

    let exact = sampler_for(backend.url(), BackendConnectionType::New).with_expected_body("healthy");
    let result = check(&exact).await.result;
    assert!(matches!(result, Err(ProbeError::BodyMismatch { .. })));

    let pattern = sampler_for(backend.url(), BackendConnectionType::New)
        .with_expected_body_regex(r"^status: (degraded|ok)$")
        .unwrap();
    assert!(check(&pattern).await.result.is_ok());
}

#[tokio::test]
async fn test_new_connection_per_probe() {
    let backend = common::start_mock_backend("ok").await;
    let sampler = sampler_for(backend.url(), BackendConnectionType::New);
    for _ in 0..3 {
        let outcome = check(&sampler).await;
        assert!(outcome.result.is_ok());
    }

    assert_eq!(backend.connections(), 3);
    assert!(backend
        .requests()
        .iter()
        .all(|r| r.header("connection") == Some("close")));
}

#[tokio::test]
async fn test_reused_connection_across_probes() {
    let backend = common::start_mock_backend("ok").await;
    let sampler = sampler_for(backend.url(), BackendConnectionType::Reused);
    for _ in 0..3 {
        let outcome = check(&sampler).await;
        assert!(outcome.result.is_ok());
    }

    assert_eq!(backend.requests().len(), 3);
    assert_eq!(backend.connections(), 1);
}

#[tokio::test]
async fn test_bearer_token() {
    let backend = common::start_mock_backend("ok").await;

    let without_tls = Arc::new(
        sampler_for(backend.url(), BackendConnectionType::New)
            .with_bearer_token_auth(Some("secret".into()), None),
    );
    let err = without_tls
        .start(Arc::new(InMemoryRecorder::new()), CancellationToken::new())
        .await
        .err();
    assert_eq!(err, Some(SetupError::TokenWithoutTls));
    assert!(!without_tls.is_running());

    let with_tls = sampler_for(backend.url(), BackendConnectionType::New)
        .with_bearer_token_auth(Some("secret".into()), None)
        .with_tls_config(TlsSettings::default());
    assert!(check(&with_tls).await.result.is_ok());
    assert_eq!(
        backend.requests()[0].header("authorization"),
        Some("Bearer secret")
    );
}

#[tokio::test]
async fn test_unreachable_backend() {
    let addr = common::closed_port().await;
    let sampler = sampler_for(format!("http://{}", addr), BackendConnectionType::New);
    let result = check(&sampler).await.result;
    match result {
        Err(e @ ProbeError::Transport { .. }) => assert!(!e.is_dns_failure()),
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_hanging_backend_times_out() {
    let addr = common::start_hanging_backend().await;
    let sampler = BackendSampler::new(
        "hang",
        HostTarget::Static(format!("http://{}", addr)),
        "/",
        BackendConnectionType::New,
    )
    .with_timeout(Duration::from_millis(200));

    let started = std::time::Instant::now();
    let result = check(&sampler).await.result;
    assert!(result.is_err());
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_transition_sequence() {
    let backend = scripted_backend(2..4).await;
    let sampler = sampler_for(backend.url(), BackendConnectionType::New);

    let mut previously_available = true;
    let mut emitted = Vec::new();
    for _ in 0..5 {
        let (condition, available) = sampler.sample(previously_available).await.unwrap();
        emitted.push(condition.map(|c| c.level));
        previously_available = available;
    }

    assert_eq!(
        emitted,
        vec![None, None, Some(Level::Error), None, Some(Level::Info)]
    );
}

#[tokio::test]
async fn test_start_records_disruption() {
    let backend = scripted_backend(2..5).await;
    let sampler = Arc::new(
        sampler_for(backend.url(), BackendConnectionType::Reused)
            .with_interval(Duration::from_millis(50)),
    );
    let recorder = Arc::new(InMemoryRecorder::new());
    let cancel = CancellationToken::new();

    let handle = sampler.start(recorder.clone(), cancel.clone()).await.unwrap();
    assert!(sampler.is_running());
    let second = sampler.start(recorder.clone(), cancel.clone()).await.err();
    assert_eq!(second, Some(SetupError::AlreadyRunning));

    while handle.samples_taken() < 8 {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    cancel.cancel();
    handle.join().await;
    assert!(!sampler.is_running());

    let intervals = recorder.all_intervals();
    let levels: Vec<_> = intervals.iter().map(|i| i.condition.level).collect();
    assert_eq!(levels, vec![Level::Error, Level::Info]);
    let began = &intervals.as_slice()[0];
    assert!(began.condition.message.contains("reason/DisruptionBegan"));
    assert!(!began.is_open());

    let disruption = compute_disruption(&intervals);
    let entry = &disruption["mock-reused-connections"];
    assert!(entry.disrupted_duration > chrono::TimeDelta::zero());
    assert_eq!(entry.disruption_messages.len(), 2);
}

#[derive(Default)]
struct CountingHook {
    started: AtomicUsize,
}

impl SamplerHook for CountingHook {
    fn disruption_started(&self, _locator: &str) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_hook_fires_once_per_disruption() {
    let backend = scripted_backend(2..4).await;
    let hook = Arc::new(CountingHook::default());
    let sampler = sampler_for(backend.url(), BackendConnectionType::New)
        .with_hooks(vec![hook.clone() as Arc<dyn SamplerHook>]);

    let mut previously_available = true;
    let mut calls_after_each = Vec::new();
    for _ in 0..6 {
        let (_, available) = sampler.sample(previously_available).await.unwrap();
        calls_after_each.push(hook.started.load(Ordering::SeqCst));
        previously_available = available;
    }

    assert_eq!(calls_after_each, vec![0, 0, 1, 1, 1, 1]);
}

#[tokio::test]
async fn test_shutdown_mid_request_keeps_disruption_unresolved() {
    let addr = common::start_hanging_backend().await;
    let sampler = Arc::new(
        BackendSampler::new(
            "hang",
            HostTarget::Static(format!("http://{}", addr)),
            "/",
            BackendConnectionType::New,
        )
        .with_timeout(Duration::from_millis(300))
        .with_interval(Duration::from_millis(50)),
    );
    let recorder = Arc::new(InMemoryRecorder::new());
    let cancel = CancellationToken::new();

    let handle = sampler.start(recorder.clone(), cancel.clone()).await.unwrap();
    // The first request times out around 300ms; the second is in flight at 450ms.
    tokio::time::sleep(Duration::from_millis(450)).await;
    cancel.cancel();
    assert!(!handle.is_available());
    assert!(handle.condition_while_failing().is_some());
    handle.join().await;

    let intervals = recorder.all_intervals();
    let levels: Vec<_> = intervals.iter().map(|i| i.condition.level).collect();
    assert_eq!(levels, vec![Level::Error]);
    assert!(intervals
        .iter()
        .all(|i| !i.condition.message.contains("reason/DisruptionEnded")));

    let began = &intervals.as_slice()[0];
    assert_eq!(began.duration(), Some(chrono::TimeDelta::milliseconds(50)));
}

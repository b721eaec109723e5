//! Lifecycle and status-view tests for the monitor facade.

mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use vigil::{HealthMonitor, MonitorError, RegisterError, ServiceId, ServiceKind, ServiceState};

use common::{AlwaysFailing, AlwaysHealthy, NeverReturns, descriptor};

#[tokio::test]
async fn status_is_unknown_before_the_first_check() {
    let monitor = HealthMonitor::new();
    monitor
        .register(descriptor(
            "web-api",
            ServiceKind::Web,
            Duration::from_millis(50),
            Duration::from_millis(20),
            Arc::new(AlwaysHealthy { latency_ms: 5.0 }),
        ))
        .await
        .unwrap();

    let status = monitor.status(&ServiceId::from("web-api")).await.unwrap();
    assert_eq!(status.current_state, ServiceState::Unknown);
    assert_eq!(status.last_latency_ms, None);
    assert_eq!(status.last_checked_at, None);
    assert_eq!(status.consecutive_failures, 0);
}

#[tokio::test(start_paused = true)]
async fn healthy_and_failing_services_diverge() {
    let monitor = HealthMonitor::new();
    monitor
        .register(descriptor(
            "web-api",
            ServiceKind::Web,
            Duration::from_millis(50),
            Duration::from_millis(20),
            Arc::new(AlwaysHealthy { latency_ms: 5.0 }),
        ))
        .await
        .unwrap();
    monitor
        .register(descriptor(
            "main-database",
            ServiceKind::Database,
            Duration::from_millis(50),
            Duration::from_millis(20),
            Arc::new(AlwaysFailing),
        ))
        .await
        .unwrap();

    monitor.start(4).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    monitor.stop(Duration::from_millis(200)).await;

    let web = monitor.status(&ServiceId::from("web-api")).await.unwrap();
    assert_eq!(web.current_state, ServiceState::Healthy);
    assert_eq!(web.consecutive_failures, 0);
    assert_eq!(web.last_latency_ms, Some(5.0));
    assert!(web.last_checked_at.is_some());

    let database = monitor.status(&ServiceId::from("main-database")).await.unwrap();
    assert_eq!(database.current_state, ServiceState::Down);
    assert!(
        (3..=5).contains(&database.consecutive_failures),
        "expected 3-5 consecutive failures after 200ms at a 50ms interval, got {}",
        database.consecutive_failures
    );
}

#[tokio::test(start_paused = true)]
async fn stuck_probe_is_recorded_as_timeout_and_stop_quiesces() {
    let monitor = HealthMonitor::new();
    monitor
        .register(descriptor(
            "stuck",
            ServiceKind::Tcp,
            Duration::from_millis(50),
            Duration::from_millis(20),
            Arc::new(NeverReturns),
        ))
        .await
        .unwrap();

    monitor.start(2).await.unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;

    let status = monitor.status(&ServiceId::from("stuck")).await.unwrap();
    assert_eq!(status.current_state, ServiceState::Timeout);
    assert!(status.consecutive_failures >= 1);

    // Let the next check get dispatched, then stop mid-flight: quiescence is
    // bounded by the 20ms check timeout, well inside the grace window.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let stop_started = Instant::now();
    monitor.stop(Duration::from_millis(500)).await;

    assert!(stop_started.elapsed() <= Duration::from_millis(100));
    assert!(!monitor.is_running().await);
}

#[tokio::test(start_paused = true)]
async fn stop_abandons_checks_when_the_grace_expires() {
    let monitor = HealthMonitor::new();
    monitor
        .register(descriptor(
            "glacial",
            ServiceKind::Other,
            Duration::from_millis(50),
            Duration::from_secs(10),
            Arc::new(NeverReturns),
        ))
        .await
        .unwrap();

    monitor.start(1).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    let stop_started = Instant::now();
    monitor.stop(Duration::from_millis(50)).await;

    assert!(stop_started.elapsed() <= Duration::from_millis(100));
    assert!(!monitor.is_running().await);
}

#[tokio::test(start_paused = true)]
async fn statuses_persist_while_stopped() {
    let monitor = HealthMonitor::new();
    monitor
        .register(descriptor(
            "web-api",
            ServiceKind::Web,
            Duration::from_millis(50),
            Duration::from_millis(20),
            Arc::new(AlwaysHealthy { latency_ms: 5.0 }),
        ))
        .await
        .unwrap();

    monitor.start(2).await.unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;
    monitor.stop(Duration::from_millis(100)).await;

    assert!(!monitor.is_running().await);
    let status = monitor.status(&ServiceId::from("web-api")).await.unwrap();
    assert_eq!(status.current_state, ServiceState::Healthy);

    // Registration keeps working while stopped; the new service just waits
    // for the next start.
    monitor
        .register(descriptor(
            "cache",
            ServiceKind::Other,
            Duration::from_millis(50),
            Duration::from_millis(20),
            Arc::new(AlwaysHealthy { latency_ms: 1.0 }),
        ))
        .await
        .unwrap();

    let statuses = monitor.all_statuses().await;
    assert_eq!(statuses.len(), 2);
    assert_eq!(statuses[0].current_state, ServiceState::Unknown); // cache
    assert_eq!(statuses[1].current_state, ServiceState::Healthy); // web-api
}

#[tokio::test]
async fn all_statuses_are_ordered_by_id() {
    let monitor = HealthMonitor::new();
    for id in ["bravo", "alpha", "charlie"] {
        monitor
            .register(descriptor(
                id,
                ServiceKind::Other,
                Duration::from_millis(50),
                Duration::from_millis(20),
                Arc::new(AlwaysHealthy { latency_ms: 1.0 }),
            ))
            .await
            .unwrap();
    }

    let ids: Vec<_> =
        monitor.all_statuses().await.iter().map(|s| s.id.as_str().to_string()).collect();
    assert_eq!(ids, vec!["alpha", "bravo", "charlie"]);
}

#[tokio::test(start_paused = true)]
async fn start_and_stop_lifecycle_is_enforced() {
    let monitor = HealthMonitor::new();

    assert!(matches!(monitor.start(0).await, Err(MonitorError::InvalidConcurrency)));
    assert!(!monitor.is_running().await);

    monitor.start(2).await.unwrap();
    assert!(monitor.is_running().await);
    assert!(matches!(monitor.start(2).await, Err(MonitorError::AlreadyRunning)));

    monitor.stop(Duration::from_millis(100)).await;
    assert!(!monitor.is_running().await);

    // Stopping again is a no-op, and a stopped monitor can be restarted.
    monitor.stop(Duration::from_millis(100)).await;
    monitor.start(2).await.unwrap();
    monitor.stop(Duration::from_millis(100)).await;
}

#[tokio::test]
async fn deregistering_an_absent_id_is_a_noop() {
    let monitor = HealthMonitor::new();
    monitor.deregister(&ServiceId::from("missing")).await;
    assert!(monitor.all_statuses().await.is_empty());
}

#[tokio::test]
async fn invalid_descriptors_are_rejected_at_registration() {
    let monitor = HealthMonitor::new();

    let zero_interval = descriptor(
        "svc",
        ServiceKind::Web,
        Duration::ZERO,
        Duration::from_millis(20),
        Arc::new(AlwaysHealthy { latency_ms: 1.0 }),
    );
    assert!(matches!(
        monitor.register(zero_interval).await,
        Err(RegisterError::ZeroInterval { .. })
    ));

    let empty_id = descriptor(
        "",
        ServiceKind::Web,
        Duration::from_millis(50),
        Duration::from_millis(20),
        Arc::new(AlwaysHealthy { latency_ms: 1.0 }),
    );
    assert!(matches!(monitor.register(empty_id).await, Err(RegisterError::EmptyId)));

    assert!(monitor.all_statuses().await.is_empty());
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use aires_adapters::{AlertSeverity, FakeSink};
use aires_core::CancelSource;
use std::sync::atomic::{AtomicBool, Ordering};

fn healthy_probe(name: &'static str) -> Arc<FnProbe> {
    Arc::new(FnProbe::sync(name, move || HealthStatus::healthy(name)))
}

#[tokio::test]
async fn aggregate_healthy_when_all_probes_pass() {
    let mut registry = HealthRegistry::new();
    registry.register(healthy_probe("config"));
    registry.register(healthy_probe("persistence"));

    let report = registry.check_all(0).await;
    assert_eq!(report.aggregate, HealthLevel::Healthy);
    assert_eq!(report.statuses.len(), 2);
    // Registration order is preserved in the report.
    assert_eq!(report.statuses[0].component, "config");
}

#[tokio::test]
async fn one_unhealthy_probe_fails_the_aggregate() {
    let mut registry = HealthRegistry::new();
    registry.register(healthy_probe("config"));
    registry.register(Arc::new(FnProbe::sync("gateway", || {
        HealthStatus::unhealthy("gateway", "connection refused")
    })));

    let report = registry.check_all(0).await;
    assert_eq!(report.aggregate, HealthLevel::Unhealthy);

    let rendered = report.render();
    assert!(rendered.contains("overall: unhealthy"));
    assert!(rendered.contains("connection refused"));
}

#[tokio::test]
async fn probe_timeout_counts_as_failure() {
    let mut registry =
        HealthRegistry::new().with_probe_timeout(Duration::from_millis(20));
    registry.register(Arc::new(FnProbe::new("slow", || async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        HealthStatus::healthy("slow")
    })));

    let report = registry.check_all(0).await;
    assert_eq!(report.aggregate, HealthLevel::Unhealthy);
    assert!(report.statuses[0]
        .first_failure()
        .unwrap()
        .contains("timed out"));
}

#[tokio::test]
async fn transition_alerts_fire_once_per_edge() {
    let sink = FakeSink::new();
    let bus = aires_adapters::AlertBus::new(vec![Arc::new(sink.clone())]);
    let cancel = CancelSource::new();
    bus.spawn_dispatcher(cancel.token());

    let flip = Arc::new(AtomicBool::new(false));
    let probe_flip = Arc::clone(&flip);
    let mut registry = HealthRegistry::new().with_alerts(bus);
    registry.register(Arc::new(FnProbe::sync("gateway", move || {
        if probe_flip.load(Ordering::SeqCst) {
            HealthStatus::unhealthy("gateway", "down")
        } else {
            HealthStatus::healthy("gateway")
        }
    })));

    // Healthy baseline, then two unhealthy sweeps, then recovery.
    registry.check_all(1).await;
    flip.store(true, Ordering::SeqCst);
    registry.check_all(2).await;
    registry.check_all(3).await;
    flip.store(false, Ordering::SeqCst);
    registry.check_all(4).await;

    // Edge-triggered: one Critical on the way down, one Info on recovery.
    for _ in 0..200 {
        if sink.count() >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let alerts = sink.alerts();
    assert_eq!(alerts.len(), 2, "{alerts:?}");
    assert_eq!(alerts[0].severity, AlertSeverity::Critical);
    assert_eq!(alerts[1].severity, AlertSeverity::Info);
}

#[tokio::test]
async fn no_alert_without_a_healthy_baseline() {
    let sink = FakeSink::new();
    let bus = aires_adapters::AlertBus::new(vec![Arc::new(sink.clone())]);
    let cancel = CancelSource::new();
    bus.spawn_dispatcher(cancel.token());

    let mut registry = HealthRegistry::new().with_alerts(bus);
    registry.register(Arc::new(FnProbe::sync("gateway", || {
        HealthStatus::unhealthy("gateway", "down")
    })));

    // First sweep is already unhealthy: no Healthy→Unhealthy edge exists.
    registry.check_all(1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(sink.count(), 0);
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    all_healthy = { vec![HealthLevel::Healthy, HealthLevel::Healthy], HealthLevel::Healthy },
    one_degraded = { vec![HealthLevel::Healthy, HealthLevel::Degraded], HealthLevel::Degraded },
    one_unhealthy = { vec![HealthLevel::Degraded, HealthLevel::Unhealthy], HealthLevel::Unhealthy },
    unknown_counts_as_unhealthy = { vec![HealthLevel::Healthy, HealthLevel::Unknown], HealthLevel::Unhealthy },
    empty = { vec![], HealthLevel::Unknown },
)]
fn aggregate_rules(levels: Vec<HealthLevel>, expected: HealthLevel) {
    assert_eq!(HealthLevel::aggregate(levels), expected);
}

#[test]
fn unhealthy_carries_reason() {
    let status = HealthStatus::unhealthy("gateway", "connection refused");
    assert_eq!(status.level, HealthLevel::Unhealthy);
    assert_eq!(status.error.as_deref(), Some("connection refused"));
    assert_eq!(status.first_failure(), Some("connection refused"));
}

#[test]
fn builders_attach_detail() {
    let status = HealthStatus::healthy("config")
        .with_latency_ms(12)
        .with_diagnostic("path", "/etc/aires.ini");

    assert_eq!(status.latency_ms, 12);
    assert_eq!(
        status.diagnostics.get("path").map(String::as_str),
        Some("/etc/aires.ini")
    );
    assert!(status.first_failure().is_none());
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory metrics: counters, gauges, and a small latency window.
//!
//! Exposed to the health registry diagnostics and embedded into booklet
//! metadata at synthesis time. No external push.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

/// Recent run latencies kept for the moving average.
const LATENCY_WINDOW: usize = 64;

#[derive(Default)]
pub struct Metrics {
    booklets_generated: AtomicU64,
    booklets_saved: AtomicU64,
    jobs_succeeded: AtomicU64,
    jobs_failed: AtomicU64,
    jobs_cancelled: AtomicU64,
    jobs_requeued: AtomicU64,
    gateway_retries: AtomicU64,
    files_enqueued: AtomicU64,
    files_rejected: AtomicU64,
    queue_depth: AtomicU64,
    last_booklet_at_ms: AtomicU64,
    failures_by_code: Mutex<BTreeMap<String, u64>>,
    run_latencies_ms: Mutex<VecDeque<u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_booklet_generated(&self) {
        self.booklets_generated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_booklet_saved(&self, at_ms: u64) {
        self.booklets_saved.fetch_add(1, Ordering::Relaxed);
        self.last_booklet_at_ms.store(at_ms, Ordering::Relaxed);
    }

    pub fn record_job_succeeded(&self) {
        self.jobs_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_job_failed(&self) {
        self.jobs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancellation(&self) {
        self.jobs_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_job_requeued(&self) {
        self.jobs_requeued.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a pipeline failure under its stable error code.
    pub fn record_failure(&self, code: &str) {
        let mut failures = self.failures_by_code.lock();
        *failures.entry(code.to_string()).or_insert(0) += 1;
    }

    pub fn add_gateway_retries(&self, n: u64) {
        self.gateway_retries.fetch_add(n, Ordering::Relaxed);
    }

    pub fn record_file_enqueued(&self) {
        self.files_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_file_rejected(&self) {
        self.files_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Gauge: current queue depth.
    pub fn set_queue_depth(&self, depth: u64) {
        self.queue_depth.store(depth, Ordering::Relaxed);
    }

    pub fn record_run_latency(&self, latency_ms: u64) {
        let mut window = self.run_latencies_ms.lock();
        if window.len() >= LATENCY_WINDOW {
            window.pop_front();
        }
        window.push_back(latency_ms);
    }

    pub fn gateway_retries(&self) -> u64 {
        self.gateway_retries.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let window = self.run_latencies_ms.lock();
        let avg_run_latency_ms = if window.is_empty() {
            0
        } else {
            window.iter().sum::<u64>() / window.len() as u64
        };
        MetricsSnapshot {
            booklets_generated: self.booklets_generated.load(Ordering::Relaxed),
            booklets_saved: self.booklets_saved.load(Ordering::Relaxed),
            jobs_succeeded: self.jobs_succeeded.load(Ordering::Relaxed),
            jobs_failed: self.jobs_failed.load(Ordering::Relaxed),
            jobs_cancelled: self.jobs_cancelled.load(Ordering::Relaxed),
            jobs_requeued: self.jobs_requeued.load(Ordering::Relaxed),
            gateway_retries: self.gateway_retries.load(Ordering::Relaxed),
            files_enqueued: self.files_enqueued.load(Ordering::Relaxed),
            files_rejected: self.files_rejected.load(Ordering::Relaxed),
            queue_depth: self.queue_depth.load(Ordering::Relaxed),
            last_booklet_at_ms: self.last_booklet_at_ms.load(Ordering::Relaxed),
            failures_by_code: self.failures_by_code.lock().clone(),
            avg_run_latency_ms,
        }
    }
}

/// Serializable snapshot for status output and health diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub booklets_generated: u64,
    pub booklets_saved: u64,
    pub jobs_succeeded: u64,
    pub jobs_failed: u64,
    pub jobs_cancelled: u64,
    pub jobs_requeued: u64,
    pub gateway_retries: u64,
    pub files_enqueued: u64,
    pub files_rejected: u64,
    pub queue_depth: u64,
    pub last_booklet_at_ms: u64,
    pub failures_by_code: BTreeMap<String, u64>,
    pub avg_run_latency_ms: u64,
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;

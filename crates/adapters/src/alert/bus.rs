// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded, non-blocking alert dispatch.
//!
//! `raise` enqueues and returns immediately. A background dispatcher drains
//! the queue and fans each alert out to every sink. On overflow the oldest
//! Info alert is dropped first, then the oldest Warning; Critical alerts are
//! never dropped even if the queue must exceed its bound.

use super::{Alert, AlertSeverity, AlertSink};
use aires_core::CancelToken;
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Notify;

/// Default queue bound.
const DEFAULT_CAPACITY: usize = 1024;

struct BusState {
    queue: VecDeque<Alert>,
    dropped: u64,
}

/// Cloneable handle for raising alerts.
#[derive(Clone)]
pub struct AlertBus {
    state: Arc<Mutex<BusState>>,
    wakeup: Arc<Notify>,
    sinks: Arc<Vec<Arc<dyn AlertSink>>>,
    capacity: usize,
}

impl AlertBus {
    pub fn new(sinks: Vec<Arc<dyn AlertSink>>) -> Self {
        Self::with_capacity(sinks, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(sinks: Vec<Arc<dyn AlertSink>>, capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(BusState {
                queue: VecDeque::new(),
                dropped: 0,
            })),
            wakeup: Arc::new(Notify::new()),
            sinks: Arc::new(sinks),
            capacity: capacity.max(1),
        }
    }

    /// Enqueue an alert. Non-blocking; never fails from the caller's view.
    pub fn raise(
        &self,
        severity: AlertSeverity,
        source: impl Into<String>,
        message: impl Into<String>,
        context: BTreeMap<String, String>,
        raised_at_ms: u64,
    ) {
        let mut alert = Alert::new(severity, source, message, raised_at_ms);
        alert.context = context;
        self.push(alert);
    }

    /// Enqueue a pre-built alert.
    pub fn push(&self, alert: Alert) {
        {
            let mut state = self.state.lock();
            if state.queue.len() >= self.capacity {
                let dropped = drop_one_expendable(&mut state.queue);
                if dropped {
                    state.dropped += 1;
                } else if alert.severity != AlertSeverity::Critical {
                    // Queue is all-Critical; shed the newcomer instead.
                    state.dropped += 1;
                    return;
                }
                // An all-Critical queue grows past the bound for a Critical
                // newcomer; Critical is never dropped.
            }
            state.queue.push_back(alert);
        }
        self.wakeup.notify_one();
    }

    /// Alerts waiting for dispatch.
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Number of configured delivery channels.
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Total alerts shed due to overflow.
    pub fn dropped(&self) -> u64 {
        self.state.lock().dropped
    }

    /// Run the dispatcher until cancelled and the queue is drained.
    pub fn spawn_dispatcher(&self, ctx: CancelToken) -> tokio::task::JoinHandle<()> {
        let bus = self.clone();
        tokio::spawn(async move {
            loop {
                let next = bus.state.lock().queue.pop_front();
                match next {
                    Some(alert) => bus.dispatch(&alert).await,
                    None => {
                        if ctx.is_cancelled() {
                            return;
                        }
                        tokio::select! {
                            _ = ctx.cancelled() => {}
                            _ = bus.wakeup.notified() => {}
                        }
                    }
                }
            }
        })
    }

    async fn dispatch(&self, alert: &Alert) {
        for sink in self.sinks.iter() {
            if let Err(e) = sink.emit(alert).await {
                tracing::warn!(sink = sink.name(), error = %e, "alert sink failed");
            }
        }
    }
}

/// Drop the oldest Info alert, else the oldest Warning. Returns false when
/// the queue holds only Critical alerts.
fn drop_one_expendable(queue: &mut VecDeque<Alert>) -> bool {
    for severity in [AlertSeverity::Info, AlertSeverity::Warning] {
        if let Some(pos) = queue.iter().position(|a| a.severity == severity) {
            queue.remove(pos);
            return true;
        }
    }
    false
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;

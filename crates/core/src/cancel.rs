// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative cancellation.
//!
//! A [`CancelSource`] is held by whoever owns a unit of work (the daemon for
//! shutdown, the worker for one job); [`CancelToken`] clones are handed to
//! everything that can suspend. Cancellation is observed at the next await
//! point; it is a signal, not an error.

use std::sync::Arc;
use tokio::sync::watch;

/// Owning side of a cancellation pair.
#[derive(Clone)]
pub struct CancelSource {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelSource {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Hand out a token observing this source.
    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }

    /// Signal cancellation to every outstanding token.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Observing side of a cancellation pair. Cheap to clone.
#[derive(Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// A token that can never fire. For one-shot entry points with no owner.
    pub fn never() -> Self {
        static NEVER: std::sync::OnceLock<CancelSource> = std::sync::OnceLock::new();
        NEVER.get_or_init(CancelSource::new).token()
    }

    /// True once the source has cancelled (or been dropped entirely).
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves when cancellation fires. A dropped source counts as
    /// cancellation so orphaned tasks unwind rather than hang.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if *rx.borrow() {
            return;
        }
        while rx.changed().await.is_ok() {
            if *rx.borrow() {
                return;
            }
        }
    }
}

#[cfg(test)]
#[path = "cancel_tests.rs"]
mod tests;

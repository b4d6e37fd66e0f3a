// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Desktop notification sink using notify-rust.
//!
//! Carries only Critical alerts to the OS notification center; lower
//! severities are acknowledged without a popup. Delivery is fire-and-forget:
//! the notification call runs on the blocking pool and its failure is only
//! logged.
//!
//! On macOS, `notify-rust` uses `mac-notification-sys` (Cocoa bindings). The
//! first notification triggers `ensure_application_set()` which runs an
//! AppleScript to look up a bundle identifier; in a daemon context without
//! Automation permissions that lookup blocks forever. Pre-setting the bundle
//! identifier at construction time bypasses it.

use super::{Alert, AlertError, AlertSeverity, AlertSink};
use async_trait::async_trait;

#[derive(Clone, Copy, Debug, Default)]
pub struct DesktopSink;

impl DesktopSink {
    pub fn new() -> Self {
        #[cfg(target_os = "macos")]
        {
            let _ = mac_notification_sys::set_application("com.apple.Terminal");
        }
        Self
    }
}

#[async_trait]
impl AlertSink for DesktopSink {
    fn name(&self) -> &'static str {
        "desktop"
    }

    async fn emit(&self, alert: &Alert) -> Result<(), AlertError> {
        if alert.severity != AlertSeverity::Critical {
            return Ok(());
        }

        let title = format!("AIRES {}: {}", alert.severity, alert.source);
        let message = alert.message.clone();
        tokio::task::spawn_blocking(move || {
            match notify_rust::Notification::new()
                .summary(&title)
                .body(&message)
                .show()
            {
                Ok(_) => tracing::info!(%title, "desktop notification sent"),
                Err(e) => tracing::warn!(%title, error = %e, "desktop notification failed"),
            }
        });
        Ok(())
    }
}

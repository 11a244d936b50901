//! Notification sinks: where fired reminders end up.

use std::process::{Command, Stdio};

use crate::error::{AdmError, Result};

/// A message for the user, shown by the host notification system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub app_name: String,
}

/// Fire-and-forget delivery of notifications.
///
/// Implementations are called from the scheduler's dispatcher thread, never
/// from the polling loop itself.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: &Notification) -> Result<()>;
}

/// Shows notifications through the desktop notification service.
///
/// Uses `notify-send` on Linux/BSD and `osascript` on macOS.
#[derive(Debug, Default, Clone)]
pub struct DesktopSink;

impl NotificationSink for DesktopSink {
    fn notify(&self, n: &Notification) -> Result<()> {
        let mut cmd = if cfg!(target_os = "macos") {
            let script = format!(
                "display notification {:?} with title {:?} subtitle {:?}",
                n.message, n.app_name, n.title
            );
            let mut c = Command::new("osascript");
            c.arg("-e").arg(script);
            c
        } else {
            let mut c = Command::new("notify-send");
            c.arg("--app-name").arg(&n.app_name).arg(&n.title).arg(&n.message);
            c
        };
        let status = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| AdmError::NotificationDispatch(e.to_string()))?;
        if status.success() {
            Ok(())
        } else {
            Err(AdmError::NotificationDispatch(format!(
                "notifier exited with {}",
                status
            )))
        }
    }
}

/// Writes notifications to the log only. Used when no desktop is available.
#[derive(Debug, Default, Clone)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, n: &Notification) -> Result<()> {
        log::info!("[{}] {}: {}", n.app_name, n.title, n.message);
        Ok(())
    }
}

/// Tries the desktop first and falls back to the log.
#[derive(Debug, Default, Clone)]
pub struct FallbackSink {
    desktop: DesktopSink,
    log: LogSink,
}

impl NotificationSink for FallbackSink {
    fn notify(&self, n: &Notification) -> Result<()> {
        if let Err(e) = self.desktop.notify(n) {
            log::warn!("Desktop notification failed ({}), logging instead", e);
            return self.log.notify(n);
        }
        Ok(())
    }
}

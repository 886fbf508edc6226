//! Desktop notifications through platform commands

use anyhow::{bail, Context, Result};
use std::process::Command;
use tracing::{debug, info};

use super::notifier::{completion_message, NotificationSink};
use crate::state::TimerContext;

const TITLE: &str = "Rest timer";

/// Available notification backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesktopBackend {
    /// Linux notify-send
    NotifySend,
    /// macOS osascript
    Osascript,
    /// No desktop integration; log only
    Log,
}

impl DesktopBackend {
    /// Detect the best available backend for the current platform
    pub fn detect() -> Self {
        if cfg!(target_os = "macos") {
            return Self::Osascript;
        }
        if cfg!(target_os = "linux") && command_exists("notify-send") {
            return Self::NotifySend;
        }
        Self::Log
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::NotifySend => "notify-send",
            Self::Osascript => "osascript",
            Self::Log => "log",
        }
    }
}

/// Shows a system notification with sound when rest is over
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    backend: DesktopBackend,
}

impl DesktopNotifier {
    pub fn new(backend: DesktopBackend) -> Self {
        Self { backend }
    }

    pub fn detect() -> Self {
        let backend = DesktopBackend::detect();
        info!("Using {} notification backend", backend.name());
        Self::new(backend)
    }

    pub fn backend(&self) -> DesktopBackend {
        self.backend
    }

    fn send_notify_send(&self, message: &str) -> Result<()> {
        let status = Command::new("notify-send")
            .args(["--urgency", "critical", "--app-name", TITLE, TITLE, message])
            .status()
            .context("Failed to execute notify-send")?;
        if !status.success() {
            bail!("notify-send failed with status: {}", status);
        }
        Ok(())
    }

    fn send_osascript(&self, message: &str) -> Result<()> {
        let script = format!(
            r#"display notification "{}" with title "{}" sound name "default""#,
            message.replace('"', r#"\""#),
            TITLE
        );
        let status = Command::new("osascript")
            .args(["-e", &script])
            .status()
            .context("Failed to execute osascript")?;
        if !status.success() {
            bail!("osascript failed with status: {}", status);
        }
        Ok(())
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::detect()
    }
}

impl NotificationSink for DesktopNotifier {
    fn notify_rest_complete(&self, context: Option<&TimerContext>) -> Result<()> {
        let message = completion_message(context);
        debug!("Sending rest notification via {}", self.backend.name());
        match self.backend {
            DesktopBackend::NotifySend => self.send_notify_send(&message),
            DesktopBackend::Osascript => self.send_osascript(&message),
            DesktopBackend::Log => {
                info!("{}", message);
                Ok(())
            }
        }
    }
}

fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

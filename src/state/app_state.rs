//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tracing::warn;

use super::{RestTimer, TimerContext, TimerSnapshot};
use crate::tasks::{LifecycleEvent, LifecycleSender};

/// Application state shared with every HTTP handler
#[derive(Debug)]
pub struct AppState {
    /// The single rest timer for this process
    pub timer: Arc<RestTimer>,
    /// Duration used when a start request carries none
    pub default_rest_seconds: u64,
    /// Feeds the lifecycle bridge task
    pub lifecycle: LifecycleSender,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl AppState {
    pub fn new(
        timer: Arc<RestTimer>,
        lifecycle: LifecycleSender,
        default_rest_seconds: u64,
        port: u16,
        host: String,
    ) -> Self {
        Self {
            timer,
            default_rest_seconds,
            lifecycle,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
        }
    }

    /// Start a rest timer, falling back to the configured default duration
    pub fn start_timer(&self, duration_seconds: Option<i64>, context: Option<TimerContext>) -> TimerSnapshot {
        let duration = duration_seconds
            .unwrap_or_else(|| i64::try_from(self.default_rest_seconds).unwrap_or(i64::MAX));
        self.record_action("start");
        self.timer.start(duration, context)
    }

    /// Forward a lifecycle transition to the bridge task
    pub fn send_lifecycle(&self, event: LifecycleEvent) -> Result<(), String> {
        self.record_action(event.as_str());
        self.lifecycle.send(event)
    }

    /// Remember the most recent action for the status endpoint
    pub fn record_action(&self, action: &str) {
        match self.last_action.lock() {
            Ok(mut last_action) => *last_action = Some(action.to_string()),
            Err(e) => warn!("Failed to record last action: {}", e),
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;
        
        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}

//! API request and response structures

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{TimerContext, TimerPhase, TimerSnapshot};

/// Body of POST /timer/start
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StartRequest {
    /// Falls back to the configured default rest when absent
    pub duration_seconds: Option<f64>,
    pub movement_id: Option<String>,
    pub workout_id: Option<String>,
}

impl StartRequest {
    pub fn context(&self) -> Option<TimerContext> {
        let context = TimerContext::new(self.movement_id.clone(), self.workout_id.clone());
        if context.is_empty() {
            None
        } else {
            Some(context)
        }
    }
}

/// Body of POST /timer/add-time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTimeRequest {
    pub delta_seconds: f64,
}

/// Convert a client-supplied number of seconds, mapping NaN and infinities to 0.
/// Negative values pass through; the timer clamps them.
pub fn whole_seconds(value: f64) -> i64 {
    if value.is_finite() {
        value.floor() as i64
    } else {
        0
    }
}

/// API response structure for timer endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerSnapshot,
    /// Estimated wall-clock end of a running timer
    pub ends_at: Option<DateTime<Utc>>,
}

impl ApiResponse {
    /// Create a response whose status is the timer's phase
    pub fn new(message: impl Into<String>, timer: TimerSnapshot) -> Self {
        let timestamp = Utc::now();
        let ends_at = estimated_end(&timer, timestamp);
        Self {
            status: timer.phase.as_str().to_string(),
            message: message.into(),
            timestamp,
            timer,
            ends_at,
        }
    }
}

fn estimated_end(timer: &TimerSnapshot, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if timer.phase != TimerPhase::Running {
        return None;
    }
    let remaining = i64::try_from(timer.remaining_seconds).ok()?;
    now.checked_add_signed(TimeDelta::try_seconds(remaining)?)
}

/// Status response with timer and server information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer: TimerSnapshot,
    pub default_rest_seconds: u64,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

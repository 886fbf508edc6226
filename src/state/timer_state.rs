//! Timer state structure and derived snapshot

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Discrete phase of the rest timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
    Completed,
}

impl TimerPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerPhase::Idle => "idle",
            TimerPhase::Running => "running",
            TimerPhase::Paused => "paused",
            TimerPhase::Completed => "completed",
        }
    }
}

/// Which logged movement/workout triggered the timer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerContext {
    pub movement_id: Option<String>,
    pub workout_id: Option<String>,
}

impl TimerContext {
    pub fn new(movement_id: Option<String>, workout_id: Option<String>) -> Self {
        Self { movement_id, workout_id }
    }

    pub fn for_movement(movement_id: impl Into<String>) -> Self {
        Self {
            movement_id: Some(movement_id.into()),
            workout_id: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.movement_id.is_none() && self.workout_id.is_none()
    }
}

/// The single mutable timer record
#[derive(Debug, Clone)]
pub struct TimerState {
    pub phase: TimerPhase,
    /// Anchor for elapsed-time computation. Re-anchored on resume.
    pub started_at: Option<Instant>,
    pub duration_seconds: u64,
    pub remaining_seconds: u64,
    pub paused_at: Option<Instant>,
    pub completed_at: Option<Instant>,
    pub context: Option<TimerContext>,
}

impl TimerState {
    /// Create an idle timer state with every field cleared
    pub fn idle() -> Self {
        Self {
            phase: TimerPhase::Idle,
            started_at: None,
            duration_seconds: 0,
            remaining_seconds: 0,
            paused_at: None,
            completed_at: None,
            context: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.phase == TimerPhase::Idle
    }

    /// Build the read-only view handed to UI consumers
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            phase: self.phase,
            remaining_seconds: self.remaining_seconds,
            duration_seconds: self.duration_seconds,
            is_active: matches!(self.phase, TimerPhase::Running | TimerPhase::Paused),
            is_paused: self.phase == TimerPhase::Paused,
            is_completed: self.phase == TimerPhase::Completed,
            context: self.context.clone(),
            progress: self.progress(),
            display: format_remaining(self.remaining_seconds),
        }
    }

    fn progress(&self) -> f64 {
        if self.phase == TimerPhase::Completed {
            return 1.0;
        }
        if self.duration_seconds == 0 {
            return 0.0;
        }
        let done = 1.0 - (self.remaining_seconds as f64 / self.duration_seconds as f64);
        done.clamp(0.0, 1.0)
    }
}

impl Default for TimerState {
    fn default() -> Self {
        Self::idle()
    }
}

/// Snapshot of the timer as seen by the UI layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: TimerPhase,
    pub remaining_seconds: u64,
    pub duration_seconds: u64,
    pub is_active: bool,
    pub is_paused: bool,
    pub is_completed: bool,
    pub context: Option<TimerContext>,
    /// Elapsed fraction in 0.0..=1.0
    pub progress: f64,
    /// Remaining time as `m:ss`
    pub display: String,
}

impl Default for TimerSnapshot {
    fn default() -> Self {
        TimerState::idle().snapshot()
    }
}

/// Render seconds as `m:ss`; hours roll into minutes.
pub fn format_remaining(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

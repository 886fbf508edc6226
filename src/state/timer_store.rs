//! Rest timer state machine
//!
//! `TimerStore` owns the single [`TimerState`] record and applies transitions
//! to it. It never sleeps or spawns: remaining time is recomputed from the
//! monotonic clock on demand, so any number of missed or doubled ticks still
//! converges on the right value.
//!
//! ```text
//! Idle --start--> Running --pause--> Paused --resume--> Running
//! Running --(remaining hits 0)--> Completed --(auto-hide)--> Idle
//! Running/Paused/Completed --reset--> Running
//! any --cancel--> Idle
//! ```
//!
//! Every transition that invalidates a scheduled callback bumps the
//! generation. Callbacks carry the generation they were armed with and are
//! ignored once it no longer matches.

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use super::{TimerContext, TimerPhase, TimerSnapshot, TimerState};

/// Result of asking the store to recompute remaining time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Callback was armed for an earlier generation, or the timer is not running
    Stale,
    /// Still counting down
    Running { remaining_seconds: u64 },
    /// Remaining time reached zero on this recomputation
    Completed,
}

#[derive(Debug)]
pub struct TimerStore {
    state: TimerState,
    generation: u64,
    duplicate_window: Duration,
}

impl TimerStore {
    pub fn new(duplicate_window: Duration) -> Self {
        Self {
            state: TimerState::idle(),
            generation: 0,
            duplicate_window,
        }
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn phase(&self) -> TimerPhase {
        self.state.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.state.snapshot()
    }

    /// Start a new timer, replacing any active one.
    ///
    /// Returns `false` when the call was absorbed by the duplicate-start guard.
    pub fn start(&mut self, duration_seconds: i64, context: Option<TimerContext>) -> bool {
        let now = Instant::now();
        if self.is_duplicate_start(context.as_ref(), now) {
            debug!("Ignoring duplicate start for {:?}", context);
            return false;
        }

        let duration = clamp_seconds(duration_seconds, "duration");
        self.state = TimerState {
            phase: TimerPhase::Running,
            started_at: Some(now),
            duration_seconds: duration,
            remaining_seconds: duration,
            paused_at: None,
            completed_at: None,
            context,
        };
        self.bump();
        debug!("Timer started: {}s", duration);
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.state.phase != TimerPhase::Running {
            return false;
        }
        let now = Instant::now();
        // Freeze the clock-accurate value, not the last tick's. If time ran
        // out since that tick, the pause becomes a completion.
        if self.flush(now) == TickOutcome::Completed {
            return true;
        }
        self.state.phase = TimerPhase::Paused;
        self.state.paused_at = Some(now);
        self.bump();
        debug!("Timer paused with {}s remaining", self.state.remaining_seconds);
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.state.phase != TimerPhase::Paused {
            return false;
        }
        let now = Instant::now();
        let consumed = Duration::from_secs(
            self.state.duration_seconds - self.state.remaining_seconds,
        );
        self.state.phase = TimerPhase::Running;
        self.state.started_at = Some(now.checked_sub(consumed).unwrap_or(now));
        self.state.paused_at = None;
        self.bump();
        debug!("Timer resumed with {}s remaining", self.state.remaining_seconds);
        true
    }

    /// Restart the current timer from its (possibly extended) duration
    pub fn reset(&mut self) -> bool {
        if self.state.phase == TimerPhase::Idle {
            return false;
        }
        self.state.phase = TimerPhase::Running;
        self.state.started_at = Some(Instant::now());
        self.state.remaining_seconds = self.state.duration_seconds;
        self.state.paused_at = None;
        self.state.completed_at = None;
        self.bump();
        debug!("Timer reset to {}s", self.state.duration_seconds);
        true
    }

    pub fn cancel(&mut self) {
        self.state = TimerState::idle();
        self.bump();
        debug!("Timer cancelled");
    }

    /// Extend a running timer. Paused, idle and completed timers are left alone.
    pub fn add_time(&mut self, delta_seconds: i64) -> bool {
        if self.state.phase != TimerPhase::Running {
            return false;
        }
        if self.flush(Instant::now()) == TickOutcome::Completed {
            return false;
        }
        let delta = clamp_seconds(delta_seconds, "delta");
        // Saturate so remaining never exceeds duration.
        self.state.duration_seconds = self.state.duration_seconds.saturating_add(delta);
        self.state.remaining_seconds = self.state.remaining_seconds.saturating_add(delta);
        debug!("Added {}s, {}s remaining", delta, self.state.remaining_seconds);
        true
    }

    /// Ticker entry point: recompute if `generation` is still current
    pub fn tick(&mut self, generation: u64) -> TickOutcome {
        if generation != self.generation {
            return TickOutcome::Stale;
        }
        self.flush(Instant::now())
    }

    /// Recompute against the current generation, used when returning to foreground
    pub fn catch_up(&mut self) -> TickOutcome {
        self.flush(Instant::now())
    }

    /// Auto-hide entry point: drop a completed timer back to idle
    pub fn expire_completed(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.state.phase != TimerPhase::Completed {
            return false;
        }
        self.cancel();
        true
    }

    fn flush(&mut self, now: Instant) -> TickOutcome {
        if self.state.phase != TimerPhase::Running {
            return TickOutcome::Stale;
        }
        let elapsed = self
            .state
            .started_at
            .map(|started| now.saturating_duration_since(started).as_secs())
            .unwrap_or(0);
        self.state.remaining_seconds = self.state.duration_seconds.saturating_sub(elapsed);

        if self.state.remaining_seconds == 0 {
            self.state.phase = TimerPhase::Completed;
            self.state.completed_at = Some(now);
            self.bump();
            debug!("Timer completed after {}s", self.state.duration_seconds);
            TickOutcome::Completed
        } else {
            TickOutcome::Running {
                remaining_seconds: self.state.remaining_seconds,
            }
        }
    }

    fn is_duplicate_start(&self, context: Option<&TimerContext>, now: Instant) -> bool {
        if self.state.phase != TimerPhase::Running {
            return false;
        }
        let incoming = match context.and_then(|c| c.movement_id.as_deref()) {
            Some(id) => id,
            None => return false,
        };
        let current = self
            .state
            .context
            .as_ref()
            .and_then(|c| c.movement_id.as_deref());
        if current != Some(incoming) {
            return false;
        }
        self.state
            .started_at
            .map(|started| now.saturating_duration_since(started) < self.duplicate_window)
            .unwrap_or(false)
    }

    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

impl Default for TimerStore {
    fn default() -> Self {
        Self::new(Duration::from_millis(2000))
    }
}

fn clamp_seconds(value: i64, what: &str) -> u64 {
    if value < 0 {
        debug!("Clamping negative {} {} to 0", what, value);
        0
    } else {
        value as u64
    }
}

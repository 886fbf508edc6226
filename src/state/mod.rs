//! State management module
//! 
//! This module contains the rest timer state machine, the service that owns
//! it, and the application state shared with the HTTP handlers.

pub mod app_state;
pub mod rest_timer;
pub mod timer_state;
pub mod timer_store;

// Re-export main types
pub use app_state::AppState;
pub use rest_timer::{RestTimer, TimerSettings};
pub use timer_state::{format_remaining, TimerContext, TimerPhase, TimerSnapshot, TimerState};
pub use timer_store::{TickOutcome, TimerStore};

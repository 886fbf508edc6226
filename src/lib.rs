//! Rest Timer - the countdown a workout tracker shows between logged sets
//! 
//! This library provides a platform-independent rest timer state machine,
//! the background tasks that drive it, and a small HTTP surface that web and
//! mobile front ends bind to.

pub mod config;
pub mod state;
pub mod api;
pub mod services;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use state::{AppState, RestTimer, TimerContext, TimerPhase, TimerSettings, TimerSnapshot, TimerStore};
pub use api::create_router;
pub use services::{DesktopNotifier, LogNotifier, NotificationSink};
pub use tasks::{lifecycle_bridge_task, lifecycle_channel, LifecycleEvent};
pub use utils::signals::shutdown_signal;

//! Process plumbing for the rest-timer daemon

pub mod signals;

pub use signals::shutdown_signal;

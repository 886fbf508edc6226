//! External collaborators module
//! 
//! This module contains the notification sinks the rest timer calls into
//! when a countdown completes.

pub mod desktop;
pub mod notifier;

// Re-export main types
pub use desktop::{DesktopBackend, DesktopNotifier};
pub use notifier::{completion_message, LogNotifier, NotificationSink};

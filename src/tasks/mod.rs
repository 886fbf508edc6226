//! Background tasks module
//! 
//! Tasks that drive the rest timer alongside the HTTP server.

pub mod auto_hide;
pub mod lifecycle_bridge;
pub mod ticker;

// Re-export main functions
pub use auto_hide::auto_hide_task;
pub use lifecycle_bridge::{lifecycle_bridge_task, lifecycle_channel, LifecycleEvent, LifecycleSender};
pub use ticker::ticker_task;

//! Lifecycle bridge background task
//!
//! Front ends forward their foreground/background transitions here. While the
//! app is in the background the ticker is parked; on return the timer catches
//! up in one recomputation and ticking resumes.

use std::sync::Arc;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::state::RestTimer;

/// Application lifecycle transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleEvent {
    Foreground,
    Background,
}

impl LifecycleEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::Foreground => "foreground",
            LifecycleEvent::Background => "background",
        }
    }
}

/// Sending half of a lifecycle event source
#[derive(Debug, Clone)]
pub struct LifecycleSender {
    tx: mpsc::UnboundedSender<LifecycleEvent>,
}

impl LifecycleSender {
    pub fn send(&self, event: LifecycleEvent) -> Result<(), String> {
        self.tx
            .send(event)
            .map_err(|e| format!("Lifecycle bridge is not running: {}", e))
    }
}

/// Create a lifecycle event source. The stream ends when every sender is dropped.
pub fn lifecycle_channel() -> (LifecycleSender, BoxStream<'static, LifecycleEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let events = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| (event, rx))
    })
    .boxed();
    (LifecycleSender { tx }, events)
}

/// Apply lifecycle events to the rest timer until the source closes
pub async fn lifecycle_bridge_task<S>(timer: Arc<RestTimer>, mut events: S)
where
    S: Stream<Item = LifecycleEvent> + Unpin,
{
    info!("Starting lifecycle bridge task");

    while let Some(event) = events.next().await {
        debug!("Lifecycle event: {}", event.as_str());
        match event {
            LifecycleEvent::Background => timer.enter_background(),
            LifecycleEvent::Foreground => {
                let snapshot = timer.enter_foreground();
                debug!(
                    "Timer after foreground: phase={}, remaining={}s",
                    snapshot.phase.as_str(),
                    snapshot.remaining_seconds
                );
            }
        }
    }

    info!("Lifecycle source closed, bridge unsubscribed");
}

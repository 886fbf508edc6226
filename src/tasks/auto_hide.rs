//! Deferred return of a completed timer to idle

use std::sync::Weak;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use crate::state::RestTimer;

/// One-shot callback that hides a completed timer at `deadline`
pub async fn auto_hide_task(timer: Weak<RestTimer>, generation: u64, deadline: Instant) {
    sleep_until(deadline).await;

    match timer.upgrade() {
        Some(timer) => timer.on_auto_hide(generation),
        None => debug!("Rest timer dropped before auto-hide"),
    }
}

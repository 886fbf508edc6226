//! Ticker background task

use std::{sync::Weak, time::Duration};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::state::RestTimer;

/// Periodically asks the rest timer to recompute remaining time.
///
/// Exits once the timer stops running, the generation it was armed with goes
/// stale, or the timer itself is dropped. The owner also aborts it on disarm.
pub async fn ticker_task(timer: Weak<RestTimer>, generation: u64, first_tick: Instant, period: Duration) {
    debug!("Ticker started for generation {}", generation);

    let mut interval = interval_at(first_tick, period);
    // Late ticks recompute from the clock anyway; never burst to catch up.
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let Some(timer) = timer.upgrade() else {
            break;
        };
        if !timer.on_tick(generation) {
            break;
        }
    }

    debug!("Ticker for generation {} finished", generation);
}

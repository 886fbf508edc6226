//! Rest timer service: the single owner of timer state and its callbacks

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};
use tokio::{sync::watch, task::JoinHandle, time::Instant};
use tracing::{debug, info, warn};

use super::{TickOutcome, TimerContext, TimerPhase, TimerSnapshot, TimerStore};
use crate::{
    services::NotificationSink,
    tasks::{auto_hide_task, ticker_task},
};

/// Timing knobs for the rest timer
#[derive(Debug, Clone)]
pub struct TimerSettings {
    /// How often the ticker recomputes remaining time
    pub tick_interval: Duration,
    /// How long a completed timer stays visible before returning to idle
    pub auto_hide_after: Duration,
    /// Window in which a repeated start for the same movement is ignored
    pub duplicate_window: Duration,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            auto_hide_after: Duration::from_secs(5),
            duplicate_window: Duration::from_millis(2000),
        }
    }
}

#[derive(Debug)]
struct Inner {
    store: TimerStore,
    ticker: Option<JoinHandle<()>>,
    auto_hide: Option<JoinHandle<()>>,
    backgrounded: bool,
}

impl Inner {
    fn disarm_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }

    fn disarm_auto_hide(&mut self) {
        if let Some(handle) = self.auto_hide.take() {
            handle.abort();
        }
    }
}

/// Owns the [`TimerStore`], the ticker and auto-hide tasks, and the
/// notification sink. Construct once and share through `Arc`.
///
/// Every operation runs a full transition under one lock, then brings the
/// scheduled tasks in line with the new phase before publishing a snapshot.
/// Must be used from within a tokio runtime.
pub struct RestTimer {
    inner: Mutex<Inner>,
    settings: TimerSettings,
    sink: Arc<dyn NotificationSink>,
    snapshot_tx: watch::Sender<TimerSnapshot>,
    me: Weak<RestTimer>,
}

impl RestTimer {
    pub fn new(settings: TimerSettings, sink: Arc<dyn NotificationSink>) -> Arc<Self> {
        let (snapshot_tx, _) = watch::channel(TimerSnapshot::default());
        Arc::new_cyclic(|me| Self {
            inner: Mutex::new(Inner {
                store: TimerStore::new(settings.duplicate_window),
                ticker: None,
                auto_hide: None,
                backgrounded: false,
            }),
            settings,
            sink,
            snapshot_tx,
            me: me.clone(),
        })
    }

    pub fn settings(&self) -> &TimerSettings {
        &self.settings
    }

    // ── Operations ───────────────────────────────────────────────────

    pub fn start(&self, duration_seconds: i64, context: Option<TimerContext>) -> TimerSnapshot {
        self.transition(|inner| {
            if inner.store.start(duration_seconds, context) {
                info!("Rest timer started for {}s", inner.store.state().duration_seconds);
            }
        })
    }

    pub fn pause(&self) -> TimerSnapshot {
        self.transition(|inner| {
            if inner.store.pause() {
                info!("Rest timer paused");
            }
        })
    }

    pub fn resume(&self) -> TimerSnapshot {
        self.transition(|inner| {
            if inner.store.resume() {
                info!("Rest timer resumed");
            }
        })
    }

    pub fn reset(&self) -> TimerSnapshot {
        self.transition(|inner| {
            if inner.store.reset() {
                info!("Rest timer reset");
            }
        })
    }

    pub fn cancel(&self) -> TimerSnapshot {
        self.transition(|inner| {
            inner.store.cancel();
            info!("Rest timer cancelled");
        })
    }

    pub fn add_time(&self, delta_seconds: i64) -> TimerSnapshot {
        self.transition(|inner| {
            if inner.store.add_time(delta_seconds) {
                info!("Added {}s to rest timer", delta_seconds);
            }
        })
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.lock().store.snapshot()
    }

    /// Watch channel that receives every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn is_ticking(&self) -> bool {
        self.lock().ticker.is_some()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// App went to background: stop ticking but keep the anchors
    pub fn enter_background(&self) {
        let mut inner = self.lock();
        inner.backgrounded = true;
        if inner.ticker.is_some() {
            inner.disarm_ticker();
            debug!("Ticker suspended for background");
        }
    }

    /// App came back: catch up on elapsed time and resume ticking
    pub fn enter_foreground(&self) -> TimerSnapshot {
        self.transition(|inner| {
            inner.backgrounded = false;
            if inner.store.phase() == TimerPhase::Running && inner.ticker.is_none() {
                let outcome = inner.store.catch_up();
                debug!("Foreground catch-up: {:?}", outcome);
            }
        })
    }

    /// Abort every scheduled callback
    pub fn shutdown(&self) {
        let mut inner = self.lock();
        inner.disarm_ticker();
        inner.disarm_auto_hide();
        info!("Rest timer shut down");
    }

    // ── Callbacks ────────────────────────────────────────────────────

    /// Called by the ticker. Returns whether the ticker should keep running.
    pub(crate) fn on_tick(&self, generation: u64) -> bool {
        let mut keep_running = false;
        self.transition(|inner| {
            keep_running = matches!(
                inner.store.tick(generation),
                TickOutcome::Running { .. }
            );
        });
        keep_running
    }

    /// Called by the auto-hide task
    pub(crate) fn on_auto_hide(&self, generation: u64) {
        self.transition(|inner| {
            if inner.store.generation() == generation {
                inner.auto_hide = None;
            }
            if inner.store.expire_completed(generation) {
                info!("Completed rest timer hidden");
            }
        });
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition<F>(&self, apply: F) -> TimerSnapshot
    where
        F: FnOnce(&mut Inner),
    {
        let mut inner = self.lock();
        let before_phase = inner.store.phase();
        let before_generation = inner.store.generation();

        apply(&mut *inner);
        self.reconcile(&mut *inner, before_phase, before_generation);

        // Publish under the lock so subscribers never see snapshots out of order.
        let snapshot = inner.store.snapshot();
        self.snapshot_tx.send_if_modified(|current| {
            if *current != snapshot {
                *current = snapshot.clone();
                true
            } else {
                false
            }
        });
        snapshot
    }

    /// Align scheduled tasks with the store's phase after a transition
    fn reconcile(&self, inner: &mut Inner, before_phase: TimerPhase, before_generation: u64) {
        let generation = inner.store.generation();
        if generation != before_generation {
            inner.disarm_ticker();
            inner.disarm_auto_hide();
        }

        match inner.store.phase() {
            TimerPhase::Running => {
                if inner.ticker.is_none() && !inner.backgrounded {
                    let period = self.settings.tick_interval;
                    let handle = tokio::spawn(ticker_task(
                        self.me.clone(),
                        generation,
                        Instant::now() + period,
                        period,
                    ));
                    inner.ticker = Some(handle);
                    debug!("Ticker armed for generation {}", generation);
                }
            }
            TimerPhase::Completed => {
                if before_phase != TimerPhase::Completed {
                    info!("Rest timer completed");
                    self.notify(inner.store.state().context.clone());
                }
                if inner.auto_hide.is_none() {
                    let handle = tokio::spawn(auto_hide_task(
                        self.me.clone(),
                        generation,
                        Instant::now() + self.settings.auto_hide_after,
                    ));
                    inner.auto_hide = Some(handle);
                }
            }
            TimerPhase::Idle | TimerPhase::Paused => {}
        }
    }

    fn notify(&self, context: Option<TimerContext>) {
        let sink = Arc::clone(&self.sink);
        tokio::task::spawn_blocking(move || {
            if let Err(e) = sink.notify_rest_complete(context.as_ref()) {
                warn!("Rest completion notification failed: {:#}", e);
            }
        });
    }
}

impl Drop for RestTimer {
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap_or_else(PoisonError::into_inner);
        inner.disarm_ticker();
        inner.disarm_auto_hide();
    }
}

impl std::fmt::Debug for RestTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestTimer")
            .field("settings", &self.settings)
            .field("snapshot", &*self.snapshot_tx.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::advance;

    #[derive(Default)]
    struct CountingSink {
        calls: AtomicUsize,
        fail: bool,
    }

    impl NotificationSink for CountingSink {
        fn notify_rest_complete(&self, _context: Option<&TimerContext>) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("permission denied");
            }
            Ok(())
        }
    }

    fn timer_with(sink: Arc<CountingSink>) -> Arc<RestTimer> {
        RestTimer::new(TimerSettings::default(), sink)
    }

    /// Advance paused time in one-second steps so interval ticks get to run.
    async fn run_for(secs: u64) {
        for _ in 0..secs {
            advance(Duration::from_secs(1)).await;
            settle().await;
        }
    }

    /// Notifications run on the blocking pool; give them a moment.
    fn wait_for_calls(sink: &CountingSink, expected: usize) {
        for _ in 0..400 {
            if sink.calls.load(Ordering::SeqCst) >= expected {
                return;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_counts_down_and_completes() {
        let sink = Arc::new(CountingSink::default());
        let timer = timer_with(Arc::clone(&sink));
        timer.start(3, None);
        assert!(timer.is_ticking());

        run_for(1).await;
        assert_eq!(timer.snapshot().remaining_seconds, 2);

        run_for(2).await;
        let snap = timer.snapshot();
        assert_eq!(snap.phase, TimerPhase::Completed);
        assert_eq!(snap.remaining_seconds, 0);
        assert!(!timer.is_ticking());
        wait_for_calls(&sink, 1);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn completed_timer_hides_after_five_seconds() {
        let timer = timer_with(Arc::new(CountingSink::default()));
        timer.start(1, None);
        advance(Duration::from_millis(1500)).await;
        settle().await;
        assert_eq!(timer.snapshot().phase, TimerPhase::Completed);

        advance(Duration::from_secs(4)).await;
        settle().await;
        assert_eq!(timer.snapshot().phase, TimerPhase::Completed);

        advance(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(timer.snapshot().phase, TimerPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_sink_does_not_block_completion() {
        let sink = Arc::new(CountingSink {
            fail: true,
            ..Default::default()
        });
        let timer = timer_with(Arc::clone(&sink));
        timer.start(0, None);
        run_for(1).await;
        assert_eq!(timer.snapshot().phase, TimerPhase::Completed);
        wait_for_calls(&sink, 1);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_disarms_ticker_and_freezes() {
        let timer = timer_with(Arc::new(CountingSink::default()));
        timer.start(60, None);
        run_for(10).await;
        let paused = timer.pause();
        assert_eq!(paused.remaining_seconds, 50);
        assert!(!timer.is_ticking());

        run_for(30).await;
        assert_eq!(timer.snapshot().remaining_seconds, 50);

        timer.resume();
        assert!(timer.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_aborts_pending_auto_hide() {
        let timer = timer_with(Arc::new(CountingSink::default()));
        timer.start(1, None);
        run_for(2).await;
        settle().await;
        assert_eq!(timer.snapshot().phase, TimerPhase::Completed);

        timer.cancel();
        timer.start(30, None);
        run_for(6).await;
        settle().await;

        // The old auto-hide must not clear the new timer.
        let snap = timer.snapshot();
        assert_eq!(snap.phase, TimerPhase::Running);
        assert_eq!(snap.remaining_seconds, 24);
    }

    #[tokio::test(start_paused = true)]
    async fn start_over_completed_timer_drops_old_auto_hide() {
        let timer = timer_with(Arc::new(CountingSink::default()));
        timer.start(1, None);
        run_for(2).await;
        assert_eq!(timer.snapshot().phase, TimerPhase::Completed);

        timer.start(30, None);
        run_for(6).await;

        let snap = timer.snapshot();
        assert_eq!(snap.phase, TimerPhase::Running);
        assert_eq!(snap.remaining_seconds, 24);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_from_completed_restarts_countdown() {
        let timer = timer_with(Arc::new(CountingSink::default()));
        timer.start(2, None);
        run_for(3).await;
        settle().await;
        assert_eq!(timer.snapshot().phase, TimerPhase::Completed);

        let snap = timer.reset();
        assert_eq!(snap.phase, TimerPhase::Running);
        assert_eq!(snap.remaining_seconds, 2);

        run_for(1).await;
        settle().await;
        assert_eq!(timer.snapshot().phase, TimerPhase::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn background_catch_up_completes_on_foreground() {
        let sink = Arc::new(CountingSink::default());
        let timer = timer_with(Arc::clone(&sink));
        timer.start(10, None);

        timer.enter_background();
        assert!(!timer.is_ticking());
        advance(Duration::from_secs(15)).await;
        settle().await;
        assert_eq!(timer.snapshot().phase, TimerPhase::Running);

        let snap = timer.enter_foreground();
        assert_eq!(snap.phase, TimerPhase::Completed);
        wait_for_calls(&sink, 1);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn foreground_rearms_running_timer_once() {
        let timer = timer_with(Arc::new(CountingSink::default()));
        timer.start(60, None);
        timer.enter_background();
        advance(Duration::from_secs(20)).await;

        let snap = timer.enter_foreground();
        assert_eq!(snap.remaining_seconds, 40);
        assert!(timer.is_ticking());

        let again = timer.enter_foreground();
        assert_eq!(again.remaining_seconds, 40);
        assert!(timer.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_transitions() {
        let timer = timer_with(Arc::new(CountingSink::default()));
        let mut rx = timer.subscribe();
        timer.start(45, Some(TimerContext::for_movement("bench")));
        rx.changed().await.unwrap();
        let snap = rx.borrow_and_update().clone();
        assert_eq!(snap.phase, TimerPhase::Running);
        assert_eq!(snap.display, "0:45");
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_timer_stops_tasks() {
        let timer = timer_with(Arc::new(CountingSink::default()));
        timer.start(60, None);
        let weak = Arc::downgrade(&timer);
        drop(timer);
        run_for(2).await;
        assert!(weak.upgrade().is_none());
    }
}

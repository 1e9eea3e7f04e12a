//! Periodic tick driver.
//!
//! [`NudgeScheduler`] is an explicit idle/active state machine around a tokio
//! interval task. `stop` waits for the task to exit, so once it returns no
//! further tick runs. A tick already in progress finishes first. A tick
//! that panics is logged and the loop keeps going.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::clock::Clock;
use crate::engine::{panic_message, NudgeEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Active,
}

struct Running {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Drives [`NudgeEngine::tick`] on a fixed interval.
pub struct NudgeScheduler {
    engine: Arc<Mutex<NudgeEngine>>,
    clock: Arc<dyn Clock>,
    interval: Duration,
    running: Option<Running>,
}

impl NudgeScheduler {
    pub fn new(engine: Arc<Mutex<NudgeEngine>>, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            engine,
            clock,
            interval: interval.max(Duration::from_secs(1)),
            running: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        match &self.running {
            Some(running) if !running.handle.is_finished() => SchedulerState::Active,
            _ => SchedulerState::Idle,
        }
    }

    pub fn engine(&self) -> Arc<Mutex<NudgeEngine>> {
        self.engine.clone()
    }

    /// Start ticking. The first tick runs immediately.
    ///
    /// Returns `false` if already active. Must be called from within a tokio
    /// runtime.
    pub fn start(&mut self) -> bool {
        if self.state() == SchedulerState::Active {
            tracing::debug!("scheduler already active");
            return false;
        }

        let (shutdown, mut shutdown_rx) = oneshot::channel();
        let engine = self.engine.clone();
        let clock = self.clock.clone();
        let period = self.interval;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    _ = interval.tick() => {
                        let result = {
                            let mut eng = engine.lock().await;
                            panic::catch_unwind(AssertUnwindSafe(|| {
                                eng.tick(clock.now(), clock.offset())
                            }))
                        };
                        match result {
                            Ok(report) => tracing::debug!(
                                fired = report.fired.len(),
                                rejected = report.rejected.len(),
                                failed = report.failed.len(),
                                "tick complete"
                            ),
                            Err(payload) => tracing::error!(
                                error = %panic_message(payload.as_ref()),
                                "tick panicked"
                            ),
                        }
                    }
                }
            }
            tracing::debug!("scheduler loop exited");
        });

        tracing::info!(interval_secs = period.as_secs(), "nudge scheduler started");
        self.running = Some(Running { shutdown, handle });
        true
    }

    /// Stop ticking and wait for the loop to exit.
    ///
    /// Returns `false` if already idle.
    pub async fn stop(&mut self) -> bool {
        let Some(running) = self.running.take() else {
            tracing::debug!("scheduler already idle");
            return false;
        };
        // The loop may have exited on its own; either way wait for it.
        let _ = running.shutdown.send(());
        if let Err(e) = running.handle.await {
            tracing::warn!(error = %e, "scheduler task ended abnormally");
        }
        tracing::info!("nudge scheduler stopped");
        true
    }
}

impl Drop for NudgeScheduler {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.handle.abort();
        }
    }
}

impl std::fmt::Debug for NudgeScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NudgeScheduler")
            .field("interval", &self.interval)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::clock::ManualClock;
    use crate::context::{ContextSnapshot, SharedContext};
    use crate::dispatch::{MemoryChannel, PushChannel, PushPayload};
    use crate::error::PushError;
    use crate::storage::{Config, MemoryStore};

    struct Exploding;

    impl PushChannel for Exploding {
        fn send(&self, _payload: &PushPayload) -> Result<(), PushError> {
            panic!("push backend crashed")
        }
    }

    fn scheduler() -> NudgeScheduler {
        with_engine(
            Arc::new(SharedContext::default()),
            Arc::new(MemoryChannel::new()),
        )
    }

    fn with_engine(context: Arc<SharedContext>, channel: Arc<dyn PushChannel>) -> NudgeScheduler {
        let engine =
            NudgeEngine::new(&Config::default(), Arc::new(MemoryStore::new()), context, channel)
                .unwrap();
        let clock = ManualClock::new(
            Utc.with_ymd_and_hms(2026, 5, 12, 12, 0, 0).unwrap(),
            crate::context::utc_offset(),
        );
        NudgeScheduler::new(
            Arc::new(Mutex::new(engine)),
            Arc::new(clock),
            Duration::from_secs(60),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_on_interval_until_stopped() {
        let mut scheduler = scheduler();
        let engine = scheduler.engine();
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        assert!(scheduler.start());
        assert_eq!(scheduler.state(), SchedulerState::Active);
        tokio::time::sleep(Duration::from_secs(150)).await;
        assert_eq!(engine.lock().await.tick_count(), 3);

        assert!(scheduler.stop().await);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(engine.lock().await.tick_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn start_and_stop_are_idempotent() {
        let mut scheduler = scheduler();
        assert!(!scheduler.stop().await);
        assert!(scheduler.start());
        assert!(!scheduler.start());
        assert!(scheduler.stop().await);
        assert!(!scheduler.stop().await);

        // Restart after stop works.
        assert!(scheduler.start());
        assert!(scheduler.stop().await);
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_tick_does_not_end_the_loop() {
        let context = Arc::new(SharedContext::new(ContextSnapshot {
            streak_days: 7,
            ..ContextSnapshot::default()
        }));
        let mut scheduler = with_engine(context, Arc::new(Exploding));
        let engine = scheduler.engine();

        assert!(scheduler.start());
        tokio::time::sleep(Duration::from_secs(150)).await;
        assert_eq!(scheduler.state(), SchedulerState::Active);
        assert_eq!(engine.lock().await.tick_count(), 3);
        assert!(scheduler.stop().await);
    }
}

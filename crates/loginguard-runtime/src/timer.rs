use std::collections::HashMap;
use std::time::Duration;

use loginguard_core::{LockState, LoginThrottle, Scheduler, TimerId};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Repeating timers as tokio tasks.
///
/// Each timer sends its [`TimerId`] into one shared channel every period;
/// the owner of the throttle drains the channel and forwards each id to
/// [`LoginThrottle::on_tick`]. Must be used from within a tokio runtime.
pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<TimerId>,
    tasks: HashMap<TimerId, AbortHandle>,
    next_id: u64,
}

impl TokioScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerId>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                tasks: HashMap::new(),
                next_id: 0,
            },
            rx,
        )
    }

    pub fn active(&self) -> usize {
        self.tasks.len()
    }
}

impl Scheduler for TokioScheduler {
    fn start_repeating(&mut self, period: Duration) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        let tx = self.tx.clone();

        let handle = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                if tx.send(id).is_err() {
                    break;
                }
            }
        });

        self.tasks.insert(id, handle.abort_handle());
        tracing::trace!(timer = id.0, period_ms = period.as_millis() as u64, "timer started");
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if let Some(handle) = self.tasks.remove(&id) {
            handle.abort();
            tracing::trace!(timer = id.0, "timer cancelled");
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

/// Forward ticks to the throttle until its countdown finishes.
///
/// Returns immediately when no countdown is running.
pub async fn run_countdown(
    throttle: &mut LoginThrottle,
    ticks: &mut mpsc::UnboundedReceiver<TimerId>,
) -> LockState {
    while throttle.active_timer().is_some() {
        match ticks.recv().await {
            Some(id) => {
                throttle.on_tick(id);
            }
            None => {
                tracing::warn!("tick channel closed with a countdown still running");
                break;
            }
        }
    }
    throttle.state()
}

#[cfg(test)]
mod tests {
    use super::*;
    use loginguard_core::{Clock, MemoryStore};

    #[tokio::test(start_paused = true)]
    async fn test_timer_ticks_every_period() {
        let (mut sched, mut rx) = TokioScheduler::new();
        let start = Instant::now();
        let id = sched.start_repeating(Duration::from_secs(1));

        for n in 1..=3u64 {
            assert_eq!(rx.recv().await, Some(id));
            assert_eq!(start.elapsed(), Duration::from_secs(n));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_ticks_and_is_idempotent() {
        let (mut sched, mut rx) = TokioScheduler::new();
        let id = sched.start_repeating(Duration::from_secs(1));
        assert_eq!(rx.recv().await, Some(id));

        sched.cancel(id);
        sched.cancel(id);
        assert_eq!(sched.active(), 0);

        let next = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
        assert!(next.is_err(), "cancelled timer kept ticking");
    }

    const T0: i64 = 1_700_000_000_000;

    /// Epoch clock that follows tokio's (paused) time.
    struct TokioClock {
        origin: Instant,
    }

    impl Clock for TokioClock {
        fn now_ms(&self) -> i64 {
            T0 + self.origin.elapsed().as_millis() as i64
        }
    }

    fn locked_throttle(period: Duration) -> (LoginThrottle, mpsc::UnboundedReceiver<TimerId>) {
        let (sched, rx) = TokioScheduler::new();
        let mut throttle = LoginThrottle::new(MemoryStore::new(), sched)
            .with_clock(TokioClock {
                origin: Instant::now(),
            })
            .with_tick_period(period);
        for _ in 0..3 {
            throttle.record_failure();
        }
        assert!(throttle.is_locked());
        (throttle, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_runs_to_unlock() {
        let start = Instant::now();
        let (mut throttle, mut rx) = locked_throttle(Duration::from_secs(1));

        let state = run_countdown(&mut throttle, &mut rx).await;
        assert_eq!(state, LockState::Unlocked);
        assert_eq!(start.elapsed(), Duration::from_secs(60));
        assert_eq!(throttle.attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_tick_period_waits_out_full_lockout() {
        let start = Instant::now();
        let (mut throttle, mut rx) = locked_throttle(Duration::from_millis(250));
        let deadline = throttle.deadline_ms();
        assert_eq!(deadline, Some(T0 + 60_000));

        let state = run_countdown(&mut throttle, &mut rx).await;
        assert_eq!(state, LockState::Unlocked);
        assert_eq!(start.elapsed(), Duration::from_secs(60));
        assert_eq!(throttle.deadline_ms(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_tick_period_unlocks_on_first_tick_after_deadline() {
        let start = Instant::now();
        let (mut throttle, mut rx) = locked_throttle(Duration::from_secs(45));

        let state = run_countdown(&mut throttle, &mut rx).await;
        assert_eq!(state, LockState::Unlocked);
        assert_eq!(start.elapsed(), Duration::from_secs(90));
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_returns_when_unlocked() {
        let (sched, mut rx) = TokioScheduler::new();
        let mut throttle = LoginThrottle::new(MemoryStore::new(), sched);
        let state = run_countdown(&mut throttle, &mut rx).await;
        assert_eq!(state, LockState::Unlocked);
    }
}

use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::form::SubmitEvent;
use crate::notice::{LogNotifier, Notice, Notifier};
use crate::policy::{LockoutPolicy, RearmPolicy};
use crate::presenter::{ceil_secs, NullPresenter, Presenter};
use crate::scheduler::{Scheduler, TimerId};
use crate::storage::{read_parsed, KeyValueStore};

/// Storage key holding the consecutive-failure count.
pub const ATTEMPTS_KEY: &str = "loginAttempts";
/// Storage key holding the lockout deadline in epoch milliseconds.
pub const LOCKOUT_KEY: &str = "lockoutTime";

const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// Derived lock state: locked iff a deadline exists and lies in the future.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    Locked { deadline_ms: i64 },
}

/// The one running countdown. `remaining_secs` is the whole seconds left
/// on the deadline as of the last tick, rounded up.
#[derive(Debug)]
struct Countdown {
    timer: TimerId,
    remaining_secs: u64,
}

/// Client-side login-attempt throttle.
///
/// Counts consecutive failed logins, arms a lockout according to the
/// configured [`LockoutPolicy`], and persists both the counter and the
/// deadline so a reload mid-lockout resumes the remaining wait.
///
/// Owned by the login page controller and constructed once per page load.
/// Timer ticks are delivered by the host through [`LoginThrottle::on_tick`];
/// at most one countdown is active, and ticks from a superseded timer are
/// ignored.
///
/// No operation fails: storage errors are logged and the in-memory state
/// carries on.
pub struct LoginThrottle {
    store: Box<dyn KeyValueStore>,
    scheduler: Box<dyn Scheduler>,
    clock: Box<dyn Clock>,
    presenter: Box<dyn Presenter>,
    notifier: Box<dyn Notifier>,
    policy: Box<dyn LockoutPolicy>,
    tick_period: Duration,
    attempts: u32,
    deadline_ms: Option<i64>,
    countdown: Option<Countdown>,
}

impl LoginThrottle {
    /// New throttle in the first-visit state (unlocked, zero attempts).
    /// Call [`restore`](Self::restore) to pick up persisted state.
    pub fn new(store: impl KeyValueStore + 'static, scheduler: impl Scheduler + 'static) -> Self {
        Self {
            store: Box::new(store),
            scheduler: Box::new(scheduler),
            clock: Box::new(SystemClock),
            presenter: Box::new(NullPresenter),
            notifier: Box::new(LogNotifier),
            policy: Box::new(RearmPolicy),
            tick_period: DEFAULT_TICK_PERIOD,
            attempts: 0,
            deadline_ms: None,
            countdown: None,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_presenter(mut self, presenter: impl Presenter + 'static) -> Self {
        self.presenter = Box::new(presenter);
        self
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn with_policy(mut self, policy: Box<dyn LockoutPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    /// Reload the counter and deadline from storage.
    ///
    /// A future deadline resumes the lockout with the remaining time; a past
    /// one clears both keys and resets the counter. Without a deadline the
    /// counter is taken as stored.
    pub fn restore(&mut self) {
        self.cancel_countdown();
        self.attempts = read_parsed::<u32>(self.store.as_ref(), ATTEMPTS_KEY).unwrap_or(0);
        self.deadline_ms = None;

        let Some(deadline_ms) = read_parsed::<i64>(self.store.as_ref(), LOCKOUT_KEY) else {
            tracing::debug!(attempts = self.attempts, "restored: unlocked");
            return;
        };

        let now = self.clock.now_ms();
        if deadline_ms > now {
            let remaining = Duration::from_millis((deadline_ms - now) as u64);
            self.deadline_ms = Some(deadline_ms);
            tracing::info!(
                attempts = self.attempts,
                remaining_ms = remaining.as_millis() as u64,
                "restored: lockout still active"
            );
            self.start_countdown(remaining);
        } else {
            tracing::info!(deadline_ms, now, "restored: lockout expired, clearing");
            self.erase(LOCKOUT_KEY);
            self.erase(ATTEMPTS_KEY);
            self.attempts = 0;
        }
    }

    /// Count a failed login and apply the lockout policy to the new count.
    pub fn record_failure(&mut self) {
        self.expire_if_due();

        self.attempts = self.attempts.saturating_add(1);
        self.write(ATTEMPTS_KEY, &self.attempts.to_string());

        let active = self.remaining();
        match self.policy.lockout_for(self.attempts, active) {
            Some(duration) => {
                let deadline_ms = self.clock.now_ms() + duration.as_millis() as i64;
                self.deadline_ms = Some(deadline_ms);
                self.write(LOCKOUT_KEY, &deadline_ms.to_string());
                tracing::warn!(
                    attempts = self.attempts,
                    lockout_secs = duration.as_secs(),
                    rearmed = active.is_some(),
                    "login failures reached threshold, locking"
                );
                self.start_countdown(duration);
                self.notifier.notify(&Notice::Lockout {
                    attempts: self.attempts,
                    duration,
                });
            }
            None if active.is_some() => {
                tracing::debug!(attempts = self.attempts, "failure recorded while locked");
                self.presenter.show_warning(self.attempts);
            }
            None => {
                tracing::debug!(attempts = self.attempts, "login failed, incrementing counter");
            }
        }
    }

    /// Reset after a successful login, releasing any lockout early.
    pub fn record_success(&mut self) {
        let was_locked = self.deadline_ms.is_some();
        self.attempts = 0;
        self.deadline_ms = None;
        self.cancel_countdown();
        self.erase(ATTEMPTS_KEY);
        self.erase(LOCKOUT_KEY);
        self.presenter.show_unlocked();
        self.presenter.hide_warning();
        tracing::info!(was_locked, "login succeeded, throttle reset");
    }

    pub fn is_locked(&self) -> bool {
        matches!(self.state(), LockState::Locked { .. })
    }

    pub fn state(&self) -> LockState {
        match self.deadline_ms {
            Some(deadline_ms) if deadline_ms > self.clock.now_ms() => {
                LockState::Locked { deadline_ms }
            }
            _ => LockState::Unlocked,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn deadline_ms(&self) -> Option<i64> {
        self.deadline_ms
    }

    /// Time left until the deadline, or None while unlocked.
    pub fn remaining(&self) -> Option<Duration> {
        match self.state() {
            LockState::Locked { deadline_ms } => Some(Duration::from_millis(
                (deadline_ms - self.clock.now_ms()) as u64,
            )),
            LockState::Unlocked => None,
        }
    }

    /// Seconds left on the running countdown display.
    pub fn countdown_secs(&self) -> Option<u64> {
        self.countdown.as_ref().map(|c| c.remaining_secs)
    }

    pub fn active_timer(&self) -> Option<TimerId> {
        self.countdown.as_ref().map(|c| c.timer)
    }

    /// Gate a form submission on the lock state alone.
    ///
    /// Returns false and cancels the event while locked.
    pub fn guard_submit(&mut self, event: &mut SubmitEvent) -> bool {
        self.expire_if_due();
        if self.is_locked() {
            event.prevent_default();
            tracing::info!(attempts = self.attempts, "submission blocked while locked");
            self.notifier.notify(&Notice::SubmitBlocked);
            return false;
        }
        true
    }

    /// Surface a notice through the page's notifier.
    pub fn notify(&mut self, notice: &Notice) {
        self.notifier.notify(notice);
    }

    /// Deliver one tick of timer `id`. Ticks from any timer other than the
    /// active countdown are dropped.
    pub fn on_tick(&mut self, id: TimerId) -> LockState {
        if self.active_timer() != Some(id) {
            tracing::trace!(timer = id.0, "ignoring tick from inactive timer");
            return self.state();
        }

        // The deadline decides, whatever the tick period.
        let Some(remaining) = self.remaining() else {
            self.unlock();
            return self.state();
        };
        let remaining_secs = ceil_secs(remaining);
        if let Some(countdown) = self.countdown.as_mut() {
            countdown.remaining_secs = remaining_secs;
        }
        self.presenter.show_locked(Duration::from_secs(remaining_secs));
        self.state()
    }

    // ── Transitions ──────────────────────────────────────────────────────────

    fn start_countdown(&mut self, duration: Duration) {
        self.cancel_countdown();
        let remaining_secs = ceil_secs(duration);
        let timer = self.scheduler.start_repeating(self.tick_period);
        self.countdown = Some(Countdown {
            timer,
            remaining_secs,
        });
        self.presenter.show_warning(self.attempts);
        self.presenter.show_locked(Duration::from_secs(remaining_secs));
    }

    fn cancel_countdown(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            self.scheduler.cancel(countdown.timer);
        }
    }

    /// Natural expiry: the deadline goes, the counter stays so further
    /// failures keep escalating.
    fn unlock(&mut self) {
        self.cancel_countdown();
        self.deadline_ms = None;
        self.erase(LOCKOUT_KEY);
        self.presenter.show_unlocked();
        self.presenter.hide_warning();
        tracing::info!(attempts = self.attempts, "lockout expired, unlocked");
    }

    /// Clear a deadline that has passed without its countdown catching up.
    fn expire_if_due(&mut self) {
        if self.deadline_ms.is_some() && !self.is_locked() {
            self.unlock();
        }
    }

    // ── Storage ──────────────────────────────────────────────────────────────

    fn write(&mut self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            tracing::warn!(key, error = %e, "storage write failed");
        }
    }

    fn erase(&mut self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            tracing::warn!(key, error = %e, "storage remove failed");
        }
    }
}

impl Drop for LoginThrottle {
    fn drop(&mut self) {
        self.cancel_countdown();
    }
}

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use std::time::Duration;

/// Identifies one repeating timer started through a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

/// Repeating timers whose ticks are delivered back to the owner of the
/// throttle, which forwards them to [`crate::LoginThrottle::on_tick`].
pub trait Scheduler {
    fn start_repeating(&mut self, period: Duration) -> TimerId;
    /// Idempotent: cancelling an unknown or already-cancelled timer is a no-op.
    fn cancel(&mut self, id: TimerId);
}

#[derive(Debug, Default)]
struct ManualState {
    next_id: u64,
    active: BTreeSet<TimerId>,
    cancelled: usize,
}

/// Scheduler that never fires on its own; tests deliver ticks by hand.
/// Clones share state so a test can inspect timers after handing one
/// clone to the throttle.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    state: Rc<RefCell<ManualState>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Vec<TimerId> {
        self.state.borrow().active.iter().copied().collect()
    }

    pub fn cancelled(&self) -> usize {
        self.state.borrow().cancelled
    }
}

impl Scheduler for ManualScheduler {
    fn start_repeating(&mut self, _period: Duration) -> TimerId {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let id = TimerId(state.next_id);
        state.active.insert(id);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        let mut state = self.state.borrow_mut();
        if state.active.remove(&id) {
            state.cancelled += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_idempotent() {
        let mut sched = ManualScheduler::new();
        let id = sched.start_repeating(Duration::from_secs(1));
        sched.cancel(id);
        sched.cancel(id);
        sched.cancel(TimerId(99));
        assert!(sched.active().is_empty());
        assert_eq!(sched.cancelled(), 1);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut sched = ManualScheduler::new();
        let a = sched.start_repeating(Duration::from_secs(1));
        let b = sched.start_repeating(Duration::from_secs(1));
        assert_ne!(a, b);
        assert_eq!(sched.active(), vec![a, b]);
    }
}

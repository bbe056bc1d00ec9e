//! Single-threaded timers on a virtual clock
//!
//! The viewport runs inside a UI event loop and never blocks. Deferred
//! work (ending a slide transition, recomputing the host offset after
//! layout settles) is queued here and runs when the host advances the
//! clock, typically once per frame. Tests advance it by hand.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

type TimerCallback = Box<dyn FnOnce()>;

/// Identifies a queued timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle {
    due: Duration,
    id: u64,
}

impl TimerHandle {
    /// Time at which the timer fires.
    pub fn due(&self) -> Duration {
        self.due
    }
}

#[derive(Default)]
struct SchedulerState {
    now: Duration,
    next_id: u64,
    timers: BTreeMap<TimerHandle, TimerCallback>,
}

/// Timer queue shared by every component of one viewport
#[derive(Clone, Default)]
pub struct Scheduler {
    state: Rc<RefCell<SchedulerState>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// Run `callback` once, `delay` after now.
    pub fn set_timeout(&self, delay: Duration, callback: impl FnOnce() + 'static) -> TimerHandle {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        let handle = TimerHandle {
            due: state.now + delay,
            id: state.next_id,
        };
        state.timers.insert(handle, Box::new(callback));
        handle
    }

    /// Cancel a timer. Returns false if it already fired or was cancelled.
    pub fn clear_timeout(&self, handle: TimerHandle) -> bool {
        self.state.borrow_mut().timers.remove(&handle).is_some()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.state.borrow().timers.contains_key(&handle)
    }

    pub fn has_pending(&self) -> bool {
        !self.state.borrow().timers.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Due time of the earliest queued timer.
    pub fn next_due(&self) -> Option<Duration> {
        self.state.borrow().timers.keys().next().map(TimerHandle::due)
    }

    /// Move the clock forward by `delta`, firing due timers in order.
    pub fn advance(&self, delta: Duration) {
        let target = self.now() + delta;
        self.advance_to(target);
    }

    /// Move the clock to `target`, firing due timers in order. Timers queued
    /// by a callback fire in the same call when they fall due before `target`.
    /// The clock never moves backwards.
    pub fn advance_to(&self, target: Duration) {
        loop {
            let callback = {
                let mut state = self.state.borrow_mut();
                let due = match state.timers.keys().next() {
                    Some(handle) if handle.due <= target => *handle,
                    _ => break,
                };
                state.now = state.now.max(due.due);
                state.timers.remove(&due)
            };
            if let Some(callback) = callback {
                callback();
            }
        }

        let mut state = self.state.borrow_mut();
        state.now = state.now.max(target);
    }
}

/// Collapses bursts of signals into one action after a quiet period
pub struct Debouncer {
    scheduler: Scheduler,
    quiet: Duration,
    action: Rc<dyn Fn()>,
    pending: Rc<Cell<Option<TimerHandle>>>,
}

impl Debouncer {
    pub fn new(scheduler: Scheduler, quiet: Duration, action: impl Fn() + 'static) -> Self {
        Self {
            scheduler,
            quiet,
            action: Rc::new(action),
            pending: Rc::new(Cell::new(None)),
        }
    }

    /// Restart the quiet window; the action runs once it elapses undisturbed.
    pub fn signal(&self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.clear_timeout(handle);
        }

        let pending = self.pending.clone();
        let action = self.action.clone();
        let handle = self.scheduler.set_timeout(self.quiet, move || {
            pending.set(None);
            action();
        });
        self.pending.set(Some(handle));
    }

    /// Drop a pending action.
    pub fn cancel(&self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.clear_timeout(handle);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.get().is_some()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Admits at most one event per interval (leading edge)
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last: Option<Duration>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    /// Whether an event at `now` passes. Admitted events restart the interval.
    pub fn admit(&mut self, now: Duration) -> bool {
        if self.interval.is_zero() {
            return true;
        }
        match self.last {
            Some(last) if now.saturating_sub(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_timers_fire_in_due_order() {
        let scheduler = Scheduler::new();
        let fired = Rc::new(RefCell::new(Vec::new()));

        for (delay, label) in [(30, "c"), (10, "a"), (20, "b")] {
            let log = fired.clone();
            scheduler.set_timeout(ms(delay), move || log.borrow_mut().push(label));
        }

        scheduler.advance(ms(15));
        assert_eq!(*fired.borrow(), vec!["a"]);
        assert_eq!(scheduler.now(), ms(15));

        scheduler.advance(ms(100));
        assert_eq!(*fired.borrow(), vec!["a", "b", "c"]);
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn test_clear_timeout() {
        let scheduler = Scheduler::new();
        let fired = Rc::new(Cell::new(false));

        let flag = fired.clone();
        let handle = scheduler.set_timeout(ms(5), move || flag.set(true));
        assert!(scheduler.is_pending(handle));
        assert!(scheduler.clear_timeout(handle));
        assert!(!scheduler.clear_timeout(handle));

        scheduler.advance(ms(10));
        assert!(!fired.get());
    }

    #[test]
    fn test_callback_can_schedule_more_work() {
        let scheduler = Scheduler::new();
        let fired = Rc::new(Cell::new(0));

        let inner_scheduler = scheduler.clone();
        let counter = fired.clone();
        scheduler.set_timeout(ms(10), move || {
            counter.set(counter.get() + 1);
            let counter = counter.clone();
            inner_scheduler.set_timeout(ms(10), move || counter.set(counter.get() + 1));
        });

        scheduler.advance(ms(25));
        assert_eq!(fired.get(), 2);
        assert_eq!(scheduler.now(), ms(25));
    }

    #[test]
    fn test_clock_never_moves_backwards() {
        let scheduler = Scheduler::new();
        scheduler.advance_to(ms(50));
        scheduler.advance_to(ms(20));
        assert_eq!(scheduler.now(), ms(50));
    }

    #[test]
    fn test_debouncer_fires_once_per_quiet_window() {
        let scheduler = Scheduler::new();
        let runs = Rc::new(Cell::new(0));

        let counter = runs.clone();
        let debouncer = Debouncer::new(scheduler.clone(), ms(100), move || counter.set(counter.get() + 1));

        debouncer.signal();
        scheduler.advance(ms(60));
        debouncer.signal();
        scheduler.advance(ms(60));
        debouncer.signal();
        scheduler.advance(ms(99));
        assert_eq!(runs.get(), 0);
        assert!(debouncer.is_pending());

        scheduler.advance(ms(1));
        assert_eq!(runs.get(), 1);
        assert!(!debouncer.is_pending());
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_debouncer_cancel() {
        let scheduler = Scheduler::new();
        let runs = Rc::new(Cell::new(0));

        let counter = runs.clone();
        let debouncer = Debouncer::new(scheduler.clone(), ms(100), move || counter.set(counter.get() + 1));
        debouncer.signal();
        debouncer.cancel();
        scheduler.advance(ms(200));
        assert_eq!(runs.get(), 0);
    }

    #[test]
    fn test_throttle_leading_edge() {
        let mut throttle = Throttle::new(ms(20));
        assert!(throttle.admit(ms(0)));
        assert!(!throttle.admit(ms(5)));
        assert!(!throttle.admit(ms(19)));
        assert!(throttle.admit(ms(20)));
        assert!(!throttle.admit(ms(30)));

        throttle.reset();
        assert!(throttle.admit(ms(31)));

        let mut open = Throttle::new(Duration::ZERO);
        assert!(open.admit(ms(0)));
        assert!(open.admit(ms(0)));
    }
}

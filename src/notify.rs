//! Synchronous change notifications
//!
//! A `Notifier` is an observer list: `emit` calls every subscriber inline,
//! on the caller's stack. Subscriptions detach when dropped unless
//! explicitly detached. Once completed, a notifier drops further emits.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Observer<T> = Rc<dyn Fn(&T)>;

struct NotifierState<T> {
    observers: Vec<(u64, Observer<T>)>,
    next_id: u64,
    completed: bool,
}

/// Observer list for values of type `T`
pub struct Notifier<T> {
    state: Rc<RefCell<NotifierState<T>>>,
}

impl<T: 'static> Notifier<T> {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(NotifierState {
                observers: Vec::new(),
                next_id: 0,
                completed: false,
            })),
        }
    }

    /// Register `observer`. On a completed notifier the subscription is inert.
    pub fn subscribe(&self, observer: impl Fn(&T) + 'static) -> Subscription {
        let mut state = self.state.borrow_mut();
        if state.completed {
            return Subscription::inert();
        }

        state.next_id += 1;
        let id = state.next_id;
        let observer: Observer<T> = Rc::new(observer);
        state.observers.push((id, observer));

        let weak: Weak<RefCell<NotifierState<T>>> = Rc::downgrade(&self.state);
        Subscription {
            detach: Some(Box::new(move || {
                if let Some(state) = weak.upgrade() {
                    state.borrow_mut().observers.retain(|(observer_id, _)| *observer_id != id);
                }
            })),
        }
    }

    /// Deliver `value` to every current observer.
    pub fn emit(&self, value: &T) {
        let observers: Vec<Observer<T>> = {
            let state = self.state.borrow();
            if state.completed {
                return;
            }
            state.observers.iter().map(|(_, observer)| observer.clone()).collect()
        };

        for observer in observers {
            observer(value);
        }
    }

    /// Drop every observer and ignore later emits.
    pub fn complete(&self) {
        let mut state = self.state.borrow_mut();
        state.completed = true;
        state.observers.clear();
    }

    pub fn is_completed(&self) -> bool {
        self.state.borrow().completed
    }

    pub fn observer_count(&self) -> usize {
        self.state.borrow().observers.len()
    }
}

impl<T: 'static> Default for Notifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Notifier<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

/// Handle to a notifier subscription
#[must_use = "dropping a Subscription unsubscribes it; call detach() to keep it alive"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn inert() -> Self {
        Self { detach: None }
    }

    /// Stop receiving notifications.
    pub fn unsubscribe(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }

    /// Keep the observer registered for the notifier's whole lifetime.
    pub fn detach(mut self) {
        self.detach = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_emit_reaches_subscribers() {
        let notifier = Notifier::<i32>::new();
        let total = Rc::new(Cell::new(0));

        let sum = total.clone();
        let _first = notifier.subscribe(move |value| sum.set(sum.get() + *value));
        let sum = total.clone();
        let _second = notifier.subscribe(move |value| sum.set(sum.get() + *value * 10));

        notifier.emit(&2);
        assert_eq!(total.get(), 22);
    }

    #[test]
    fn test_unsubscribe_and_drop() {
        let notifier = Notifier::<()>::new();
        let hits = Rc::new(Cell::new(0));

        let counter = hits.clone();
        let subscription = notifier.subscribe(move |_| counter.set(counter.get() + 1));
        notifier.emit(&());
        subscription.unsubscribe();
        notifier.emit(&());
        assert_eq!(hits.get(), 1);

        {
            let counter = hits.clone();
            let _scoped = notifier.subscribe(move |_| counter.set(counter.get() + 1));
        }
        notifier.emit(&());
        assert_eq!(hits.get(), 1);
        assert_eq!(notifier.observer_count(), 0);
    }

    #[test]
    fn test_detached_subscription_survives() {
        let notifier = Notifier::<()>::new();
        let hits = Rc::new(Cell::new(0));

        let counter = hits.clone();
        notifier.subscribe(move |_| counter.set(counter.get() + 1)).detach();
        notifier.emit(&());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_complete_stops_everything() {
        let notifier = Notifier::<u8>::new();
        let hits = Rc::new(Cell::new(0));

        let counter = hits.clone();
        let _subscription = notifier.subscribe(move |_| counter.set(counter.get() + 1));
        notifier.complete();
        notifier.emit(&1);

        let counter = hits.clone();
        let _late = notifier.subscribe(move |_| counter.set(counter.get() + 1));
        notifier.emit(&1);

        assert_eq!(hits.get(), 0);
        assert!(notifier.is_completed());
        assert_eq!(notifier.observer_count(), 0);
    }

    #[test]
    fn test_observer_may_unsubscribe_during_emit() {
        let notifier = Notifier::<()>::new();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let inner = slot.clone();
        let subscription = notifier.subscribe(move |_| {
            inner.borrow_mut().take();
        });
        *slot.borrow_mut() = Some(subscription);

        notifier.emit(&());
        assert_eq!(notifier.observer_count(), 0);
    }
}

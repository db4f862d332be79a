//! Single-threaded notification primitives.
//!
//! [`Signal`] is a multi-fire channel: handlers subscribe and receive every
//! emitted value until their [`Subscription`] is disposed or dropped.
//! [`ReactiveProperty`] pairs a current value with a signal and replays the
//! value to new observers. [`SubscriptionBag`] disposes a group of
//! subscriptions together.
//!
//! Everything here is `!Send`. Emission works on a snapshot of the handler
//! list, so a handler may subscribe, unsubscribe or emit again without
//! invalidating the iteration in progress.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use hearth_ui::signal::Signal;
//!
//! let signal = Signal::<u32>::new();
//! let total = Rc::new(Cell::new(0));
//! let sink = total.clone();
//! let sub = signal.subscribe(move |v| sink.set(sink.get() + *v));
//!
//! signal.emit(&2);
//! signal.emit(&3);
//! sub.dispose();
//! signal.emit(&100);
//!
//! assert_eq!(total.get(), 5);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Handler<T> = Rc<dyn Fn(&T)>;

// ---------------------------------------------------------------------------
// Signal
// ---------------------------------------------------------------------------

struct SignalInner<T> {
    next_id: Cell<u64>,
    handlers: RefCell<Vec<(u64, Handler<T>)>>,
    closed: Cell<bool>,
}

impl<T> SignalInner<T> {
    fn remove(&self, id: u64) {
        let removed = {
            let mut handlers = self.handlers.borrow_mut();
            handlers
                .iter()
                .position(|(slot, _)| *slot == id)
                .map(|index| handlers.remove(index))
        };
        // Dropped outside the borrow: a handler may own subscriptions to this signal.
        drop(removed);
    }

    fn contains(&self, id: u64) -> bool {
        self.handlers.borrow().iter().any(|(slot, _)| *slot == id)
    }
}

/// A multi-fire notification channel.
pub struct Signal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T: 'static> Signal<T> {
    /// Create an open signal with no subscribers.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SignalInner {
                next_id: Cell::new(0),
                handlers: RefCell::new(Vec::new()),
                closed: Cell::new(false),
            }),
        }
    }

    /// Register `handler` for every subsequent emission.
    ///
    /// Subscribing to a closed signal returns an inactive subscription.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        if self.inner.closed.get() {
            return Subscription::inactive();
        }
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.handlers.borrow_mut().push((id, Rc::new(handler)));

        let weak: Weak<SignalInner<T>> = Rc::downgrade(&self.inner);
        let probe = weak.clone();
        Subscription {
            detach: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.remove(id);
                }
            })),
            alive: Box::new(move || probe.upgrade().is_some_and(|inner| inner.contains(id))),
        }
    }

    /// Invoke every subscribed handler once with `value`.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<(u64, Handler<T>)> = self.inner.handlers.borrow().clone();
        for (id, handler) in snapshot {
            // Skip handlers detached by an earlier handler in this emission.
            if self.inner.contains(id) {
                handler(value);
            }
        }
    }

    /// Number of live handlers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.handlers.borrow().len()
    }

    /// Drop every handler. Later subscriptions are inactive and emissions do nothing.
    pub fn close(&self) {
        self.inner.closed.set(true);
        // Take first so handler destructors never run under the borrow.
        let handlers = std::mem::take(&mut *self.inner.handlers.borrow_mut());
        drop(handlers);
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.get()
    }
}

impl<T: 'static> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.inner.handlers.borrow().len())
            .field("closed", &self.inner.closed.get())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// Handle to one signal handler. Disposing or dropping it detaches the handler.
#[must_use = "dropping a Subscription immediately unsubscribes it"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce()>>,
    alive: Box<dyn Fn() -> bool>,
}

impl Subscription {
    fn inactive() -> Self {
        Self {
            detach: None,
            alive: Box::new(|| false),
        }
    }

    /// Detach the handler. Calling this more than once is harmless.
    pub fn dispose(mut self) {
        self.detach_now();
    }

    /// `true` while the handler is still attached to a live signal.
    pub fn is_active(&self) -> bool {
        self.detach.is_some() && (self.alive)()
    }

    fn detach_now(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// SubscriptionBag
// ---------------------------------------------------------------------------

/// A group of subscriptions disposed together.
#[derive(Debug, Default)]
pub struct SubscriptionBag {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Detach every subscription in the bag and empty it.
    pub fn dispose(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.dispose();
        }
    }
}

// ---------------------------------------------------------------------------
// ReactiveProperty
// ---------------------------------------------------------------------------

/// A value that notifies observers whenever it is set.
///
/// [`observe`](Self::observe) immediately replays the current value to the
/// new observer, then forwards every later [`set`](Self::set).
pub struct ReactiveProperty<T> {
    value: RefCell<T>,
    changed: Signal<T>,
}

impl<T: Clone + 'static> ReactiveProperty<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RefCell::new(value),
            changed: Signal::new(),
        }
    }

    /// Clone of the current value.
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Replace the value and notify observers.
    pub fn set(&self, value: T) {
        *self.value.borrow_mut() = value.clone();
        self.changed.emit(&value);
    }

    /// Replace the value without notifying anyone, returning the old value.
    pub fn replace_silently(&self, value: T) -> T {
        std::mem::replace(&mut *self.value.borrow_mut(), value)
    }

    /// Observe the current value and every later change.
    pub fn observe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        let current = self.get();
        handler(&current);
        self.changed.subscribe(handler)
    }

    /// Observe only later changes.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        self.changed.subscribe(handler)
    }

    pub fn subscriber_count(&self) -> usize {
        self.changed.subscriber_count()
    }
}

impl<T: fmt::Debug> fmt::Debug for ReactiveProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveProperty")
            .field("value", &self.value.borrow())
            .field("subscribers", &self.changed.inner.handlers.borrow().len())
            .finish()
    }
}

impl<T: Clone + Default + 'static> Default for ReactiveProperty<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_subscription_detaches() {
        let signal = Signal::<()>::new();
        let hits = Rc::new(Cell::new(0));
        {
            let hits = hits.clone();
            let _sub = signal.subscribe(move |_| hits.set(hits.get() + 1));
            signal.emit(&());
        }
        signal.emit(&());
        assert_eq!(hits.get(), 1);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn closed_signal_ignores_emits_and_subscriptions() {
        let signal = Signal::<()>::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let sub = signal.subscribe(move |_| h.set(h.get() + 1));
        assert!(sub.is_active());

        signal.close();
        signal.emit(&());
        assert_eq!(hits.get(), 0);
        assert!(!sub.is_active());

        let late = signal.subscribe(|_| panic!("closed signal must not call handlers"));
        assert!(!late.is_active());
        signal.emit(&());
    }

    #[test]
    fn handler_can_unsubscribe_a_later_handler_mid_emit() {
        let signal = Rc::new(Signal::<()>::new());
        let victim_hits = Rc::new(Cell::new(0));
        let victim_slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let slot = victim_slot.clone();
        let _killer = signal.subscribe(move |_| {
            slot.borrow_mut().take();
        });
        let hits = victim_hits.clone();
        *victim_slot.borrow_mut() = Some(signal.subscribe(move |_| hits.set(hits.get() + 1)));

        signal.emit(&());
        assert_eq!(victim_hits.get(), 0);
        assert_eq!(signal.subscriber_count(), 1);
    }

    #[test]
    fn subscription_outliving_signal_is_harmless() {
        let signal = Signal::<u8>::new();
        let sub = signal.subscribe(|_| {});
        drop(signal);
        assert!(!sub.is_active());
        sub.dispose();
    }

    #[test]
    fn bag_disposes_everything() {
        let signal = Signal::<()>::new();
        let mut bag = SubscriptionBag::new();
        bag.add(signal.subscribe(|_| {}));
        bag.add(signal.subscribe(|_| {}));
        assert_eq!(signal.subscriber_count(), 2);

        bag.dispose();
        assert!(bag.is_empty());
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn property_replays_current_value() {
        let property = ReactiveProperty::new(1);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let _sub = property.observe(move |v| sink.borrow_mut().push(*v));

        property.set(2);
        property.replace_silently(3);
        property.set(4);

        assert_eq!(*seen.borrow(), vec![1, 2, 4]);
        assert_eq!(property.get(), 4);
    }
}

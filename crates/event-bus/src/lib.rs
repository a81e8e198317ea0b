use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::trace;

/// Trait implemented by payload types that can be carried by a listener set.
pub trait Event: Send + Sync + 'static {}

impl<T> Event for T where T: Send + Sync + 'static {}

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Slot<E> {
    id: u64,
    once: bool,
    callback: Callback<E>,
}

struct Slots<E> {
    next_id: u64,
    entries: Vec<Slot<E>>,
}

impl<E> Slots<E> {
    fn remove(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|slot| slot.id != id);
        before != self.entries.len()
    }
}

/// Set of typed callbacks for one notification kind.
///
/// Callbacks run on the emitting task, outside the internal lock, so a
/// callback may subscribe or unsubscribe (including itself) while running.
pub struct Listeners<E>
where
    E: Event,
{
    slots: Arc<Mutex<Slots<E>>>,
}

impl<E> Default for Listeners<E>
where
    E: Event,
{
    fn default() -> Self {
        Self {
            slots: Arc::new(Mutex::new(Slots {
                next_id: 1,
                entries: Vec::new(),
            })),
        }
    }
}

impl<E> Listeners<E>
where
    E: Event,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback invoked on every emission.
    pub fn on<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.register(false, Arc::new(callback))
    }

    /// Registers a callback invoked on the next emission only.
    pub fn once<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.register(true, Arc::new(callback))
    }

    fn register(&self, once: bool, callback: Callback<E>) -> Subscription {
        let id = {
            let mut guard = self.slots.lock();
            let id = guard.next_id;
            guard.next_id += 1;
            guard.entries.push(Slot { id, once, callback });
            id
        };
        let weak: Weak<Mutex<Slots<E>>> = Arc::downgrade(&self.slots);
        Subscription::new(move || {
            if let Some(slots) = weak.upgrade() {
                slots.lock().remove(id);
            }
        })
    }

    /// Delivers `event` to every registered callback in registration order and
    /// returns how many callbacks ran.
    pub fn emit(&self, event: &E) -> usize {
        let callbacks: Vec<Callback<E>> = {
            let mut guard = self.slots.lock();
            let callbacks = guard
                .entries
                .iter()
                .map(|slot| Arc::clone(&slot.callback))
                .collect();
            guard.entries.retain(|slot| !slot.once);
            callbacks
        };
        for callback in &callbacks {
            callback(event);
        }
        trace!(listeners = callbacks.len(), "event emitted");
        callbacks.len()
    }

    pub fn len(&self) -> usize {
        self.slots.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle returned by every registration. Dropping it, or calling
/// [`Subscription::unsubscribe`], removes the callback.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new<F>(detach: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// A handle that owns no registration.
    pub fn noop() -> Self {
        Self { detach: None }
    }

    pub fn unsubscribe(mut self) {
        self.run_detach();
    }

    fn run_detach(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_detach();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.detach.is_some())
            .finish()
    }
}

/// Collected subscriptions torn down together.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    items: Vec<Subscription>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, subscription: Subscription) {
        self.items.push(subscription);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Unsubscribes everything in registration order.
    pub fn clear(&mut self) {
        for subscription in self.items.drain(..) {
            subscription.unsubscribe();
        }
    }
}

impl Drop for SubscriptionSet {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn on_fires_every_time_until_unsubscribed() {
        let listeners: Listeners<u32> = Listeners::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let sub = listeners.on(move |value| {
            counter.fetch_add(*value as usize, Ordering::SeqCst);
        });

        listeners.emit(&2);
        listeners.emit(&3);
        assert_eq!(hits.load(Ordering::SeqCst), 5);

        sub.unsubscribe();
        assert_eq!(listeners.emit(&10), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn once_fires_a_single_time() {
        let listeners: Listeners<()> = Listeners::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let _sub = listeners.once(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        listeners.emit(&());
        listeners.emit(&());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(listeners.is_empty());
    }

    #[test]
    fn dropping_the_handle_detaches() {
        let listeners: Listeners<()> = Listeners::new();
        {
            let _sub = listeners.on(|_| {});
            assert_eq!(listeners.len(), 1);
        }
        assert!(listeners.is_empty());
    }

    #[test]
    fn subscription_set_clears_in_bulk() {
        let listeners: Listeners<()> = Listeners::new();
        let mut set = SubscriptionSet::new();
        set.push(listeners.on(|_| {}));
        set.push(listeners.once(|_| {}));
        assert_eq!(listeners.len(), 2);

        set.clear();
        assert!(listeners.is_empty());
        assert!(set.is_empty());
    }

    #[test]
    fn callback_may_register_while_emitting() {
        let listeners: Arc<Listeners<()>> = Arc::new(Listeners::new());
        let inner = Arc::clone(&listeners);
        let nested = Arc::new(Mutex::new(Vec::new()));
        let nested_store = Arc::clone(&nested);
        let _sub = listeners.once(move |_| {
            nested_store.lock().push(inner.on(|_| {}));
        });

        assert_eq!(listeners.emit(&()), 1);
        assert_eq!(listeners.len(), 1);
    }
}

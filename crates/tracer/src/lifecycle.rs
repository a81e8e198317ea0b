use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use tracerec_event_bus::Subscription;

use crate::ports::{ContextLifecycleSource, ContextListener, ContextRef};

#[derive(Default)]
struct ListenerSlots {
    next_id: u64,
    entries: Vec<(u64, Arc<dyn ContextListener>)>,
}

/// Lifecycle notification hub an engine drives. Listeners are awaited one
/// after another in registration order.
#[derive(Default)]
pub struct ContextListeners {
    slots: Arc<Mutex<ListenerSlots>>,
}

impl ContextListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn listeners(&self) -> Vec<Arc<dyn ContextListener>> {
        self.slots
            .lock()
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    pub async fn notify_created(&self, context: &ContextRef) {
        for listener in self.listeners() {
            listener.on_context_created(context).await;
        }
    }

    pub async fn notify_will_destroy(&self, context: &ContextRef) {
        for listener in self.listeners() {
            listener.on_context_will_destroy(context).await;
        }
    }

    pub async fn notify_did_destroy(&self, context: &ContextRef) {
        for listener in self.listeners() {
            listener.on_context_did_destroy(context).await;
        }
    }
}

impl ContextLifecycleSource for ContextListeners {
    fn add_context_listener(&self, listener: Arc<dyn ContextListener>) -> Subscription {
        let id = {
            let mut slots = self.slots.lock();
            slots.next_id += 1;
            let id = slots.next_id;
            slots.entries.push((id, listener));
            id
        };
        let weak: Weak<Mutex<ListenerSlots>> = Arc::downgrade(&self.slots);
        Subscription::new(move || {
            if let Some(slots) = weak.upgrade() {
                slots.lock().entries.retain(|(entry, _)| *entry != id);
            }
        })
    }
}

//! Subscriber registry and event fan-out
//!
//! Re-emits each normalized event to every current subscriber for its kind,
//! in arrival order. Emission never holds the registry lock while invoking a
//! subscriber, so callbacks may subscribe or unsubscribe freely, including
//! from within their own invocation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::trace;

use super::{EventKind, RecognitionEvent};

type EventCallback = Arc<dyn Fn(&RecognitionEvent) + Send + Sync>;

#[derive(Clone)]
struct Entry {
    id: u64,
    active: Arc<AtomicBool>,
    callback: EventCallback,
}

struct Registry {
    subscribers: Mutex<HashMap<EventKind, Vec<Entry>>>,
    next_id: AtomicU64,
}

impl Registry {
    fn remove(&self, kind: EventKind, id: u64) {
        let mut subscribers = lock(&self.subscribers);
        if let Some(entries) = subscribers.get_mut(&kind) {
            entries.retain(|entry| entry.id != id);
        }
    }
}

/// Fan-out point for [`RecognitionEvent`]s. Cheap to clone; clones share the
/// same subscriber registry.
#[derive(Clone)]
pub struct EventBridge {
    registry: Arc<Registry>,
}

impl EventBridge {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry {
                subscribers: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Attach a callback for one event kind.
    ///
    /// The returned [`Subscription`] revokes only this callback. There is no
    /// backlog: events emitted before subscribing are not replayed.
    pub fn subscribe<F>(&self, kind: EventKind, callback: F) -> Subscription
    where
        F: Fn(&RecognitionEvent) + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        let active = Arc::new(AtomicBool::new(true));

        let entry = Entry {
            id,
            active: Arc::clone(&active),
            callback: Arc::new(callback),
        };

        lock(&self.registry.subscribers)
            .entry(kind)
            .or_default()
            .push(entry);

        Subscription {
            kind,
            id,
            active,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deliver an event to every current subscriber for its kind.
    ///
    /// Iterates a snapshot of the subscriber list and re-checks each entry's
    /// liveness immediately before invoking it: a subscriber revoked during
    /// delivery is skipped, while its siblings still receive the event. A
    /// subscriber added during delivery sees only subsequent events.
    pub fn emit(&self, event: &RecognitionEvent) {
        let kind = event.kind();
        let snapshot: Vec<Entry> = {
            let subscribers = lock(&self.registry.subscribers);
            match subscribers.get(&kind) {
                Some(entries) => entries.clone(),
                None => return,
            }
        };

        trace!(%event, subscribers = snapshot.len(), "emitting event");

        for entry in snapshot {
            if entry.active.load(Ordering::SeqCst) {
                (entry.callback)(event);
            }
        }
    }

    /// Number of live subscribers for a kind
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        lock(&self.registry.subscribers)
            .get(&kind)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }
}

impl Default for EventBridge {
    fn default() -> Self {
        Self::new()
    }
}

/// Revocation capability for one subscriber.
///
/// Cloneable so a callback can capture a handle to its own subscription.
/// Dropping a `Subscription` does not revoke it; call [`unsubscribe`]
/// explicitly.
///
/// [`unsubscribe`]: Subscription::unsubscribe
#[derive(Clone)]
pub struct Subscription {
    kind: EventKind,
    id: u64,
    active: Arc<AtomicBool>,
    registry: Weak<Registry>,
}

impl Subscription {
    /// Revoke this subscription. Idempotent; safe to call from within the
    /// subscribed callback itself.
    pub fn unsubscribe(&self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.kind, self.id);
        }
    }

    /// Whether the subscription still receives events
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn collect_events(bridge: &EventBridge, kind: EventKind) -> Arc<Mutex<Vec<RecognitionEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = bridge.subscribe(kind, move |event| {
            sink.lock().unwrap().push(event.clone());
        });
        seen
    }

    #[test]
    fn test_delivery_in_order() {
        let bridge = EventBridge::new();
        let seen = collect_events(&bridge, EventKind::VolumeChanged);

        bridge.emit(&RecognitionEvent::VolumeChanged { rms_db: 0.1 });
        bridge.emit(&RecognitionEvent::VolumeChanged { rms_db: 0.2 });

        let events = seen.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], RecognitionEvent::VolumeChanged { rms_db: 0.1 });
        assert_eq!(events[1], RecognitionEvent::VolumeChanged { rms_db: 0.2 });
    }

    #[test]
    fn test_only_matching_kind_delivered() {
        let bridge = EventBridge::new();
        let seen = collect_events(&bridge, EventKind::Ready);

        bridge.emit(&RecognitionEvent::EndOfSpeech { ended: true });
        assert!(seen.lock().unwrap().is_empty());

        bridge.emit(&RecognitionEvent::Ready);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let bridge = EventBridge::new();
        let count = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&count);

        let sub = bridge.subscribe(EventKind::Ready, move |_| {
            *sink.lock().unwrap() += 1;
        });

        bridge.emit(&RecognitionEvent::Ready);
        sub.unsubscribe();
        bridge.emit(&RecognitionEvent::Ready);

        assert_eq!(*count.lock().unwrap(), 1);
        assert!(!sub.is_active());
        assert_eq!(bridge.subscriber_count(EventKind::Ready), 0);
    }

    #[test]
    fn test_unsubscribe_inside_callback_keeps_siblings() {
        let bridge = EventBridge::new();

        // First subscriber removes itself during its own invocation.
        let self_sub: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&self_sub);
        let first_calls = Arc::new(Mutex::new(0usize));
        let first_sink = Arc::clone(&first_calls);

        let sub = bridge.subscribe(EventKind::Ready, move |_| {
            *first_sink.lock().unwrap() += 1;
            if let Some(sub) = slot.lock().unwrap().as_ref() {
                sub.unsubscribe();
            }
        });
        *self_sub.lock().unwrap() = Some(sub);

        let sibling_calls = Arc::new(Mutex::new(0usize));
        let sibling_sink = Arc::clone(&sibling_calls);
        let _sibling = bridge.subscribe(EventKind::Ready, move |_| {
            *sibling_sink.lock().unwrap() += 1;
        });

        bridge.emit(&RecognitionEvent::Ready);
        bridge.emit(&RecognitionEvent::Ready);

        // The self-removing subscriber fired once; its sibling saw both events.
        assert_eq!(*first_calls.lock().unwrap(), 1);
        assert_eq!(*sibling_calls.lock().unwrap(), 2);
    }

    #[test]
    fn test_subscribe_inside_callback_misses_current_event() {
        let bridge = EventBridge::new();
        let late_calls = Arc::new(Mutex::new(0usize));

        let bridge_inner = bridge.clone();
        let late_sink = Arc::clone(&late_calls);
        let registered = Arc::new(AtomicBool::new(false));

        let _sub = bridge.subscribe(EventKind::Ready, move |_| {
            if !registered.swap(true, Ordering::SeqCst) {
                let sink = Arc::clone(&late_sink);
                let _sub = bridge_inner.subscribe(EventKind::Ready, move |_| {
                    *sink.lock().unwrap() += 1;
                });
            }
        });

        bridge.emit(&RecognitionEvent::Ready);
        assert_eq!(*late_calls.lock().unwrap(), 0);

        bridge.emit(&RecognitionEvent::Ready);
        assert_eq!(*late_calls.lock().unwrap(), 1);
    }
}

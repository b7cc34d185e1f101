//! Listener registry
//!
//! Listeners are keyed by event kind and dispatched concurrently: every
//! matching callback runs in its own task, so one slow listener never
//! stalls another. One-shot listeners are removed from the registry before
//! their task is spawned. One-shot waiters back `wait_for`.

use accord_core::{Event, EventKind};
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Boxed async callback invoked with an owned event
pub type Callback = Arc<dyn Fn(Event) -> BoxFuture<'static, ()> + Send + Sync>;

/// A registered listener
#[derive(Clone)]
pub struct Listener {
    pub callback: Callback,
    /// Remove after the first matching event
    pub once: bool,
}

struct Waiter {
    kind: EventKind,
    predicate: Box<dyn Fn(&Event) -> bool + Send>,
    sender: oneshot::Sender<Event>,
}

/// Registry of listeners and one-shot waiters
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Mutex<HashMap<EventKind, Vec<Listener>>>,
    waiters: Mutex<Vec<Waiter>>,
}

impl ListenerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for every occurrence of an event kind
    pub fn on(&self, kind: EventKind, callback: Callback) {
        self.add(kind, Listener { callback, once: false });
    }

    /// Register a listener removed after its first invocation
    pub fn once(&self, kind: EventKind, callback: Callback) {
        self.add(kind, Listener { callback, once: true });
    }

    pub fn add(&self, kind: EventKind, listener: Listener) {
        self.listeners.lock().entry(kind).or_default().push(listener);
    }

    /// Number of listeners currently registered for a kind
    #[must_use]
    pub fn count(&self, kind: EventKind) -> usize {
        self.listeners.lock().get(&kind).map_or(0, Vec::len)
    }

    /// Register a waiter resolved by the next event of `kind` matching
    /// `predicate`. The receiver fires with the owned event.
    pub fn add_waiter(
        &self,
        kind: EventKind,
        predicate: impl Fn(&Event) -> bool + Send + 'static,
    ) -> oneshot::Receiver<Event> {
        let (sender, receiver) = oneshot::channel();
        self.waiters.lock().push(Waiter {
            kind,
            predicate: Box::new(predicate),
            sender,
        });
        receiver
    }

    /// Dispatch an event: spawn one task per matching listener and resolve
    /// matching waiters. One-shot listeners are dropped from the registry
    /// before their callback runs.
    pub fn dispatch(&self, event: &Event) {
        let kind = event.kind();

        let to_run: Vec<Callback> = {
            let mut listeners = self.listeners.lock();
            match listeners.get_mut(&kind) {
                Some(entries) => {
                    let callbacks = entries.iter().map(|l| Arc::clone(&l.callback)).collect();
                    entries.retain(|l| !l.once);
                    callbacks
                }
                None => Vec::new(),
            }
        };

        for callback in to_run {
            let event = event.clone();
            tokio::spawn(async move {
                callback(event).await;
            });
        }

        let resolved: Vec<Waiter> = {
            let mut waiters = self.waiters.lock();
            let mut resolved = Vec::new();
            let mut index = 0;
            while index < waiters.len() {
                if waiters[index].kind == kind && (waiters[index].predicate)(event) {
                    resolved.push(waiters.swap_remove(index));
                } else {
                    index += 1;
                }
            }
            resolved
        };

        for waiter in resolved {
            // A dropped receiver just means the caller stopped waiting.
            let _ = waiter.sender.send(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counting_callback(counter: Arc<AtomicUsize>) -> Callback {
        Arc::new(move |_event| {
            let counter = Arc::clone(&counter);
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        })
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_every_listener_fires() {
        let registry = ListenerRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        registry.on(EventKind::Ready, counting_callback(Arc::clone(&counter)));
        registry.on(EventKind::Ready, counting_callback(Arc::clone(&counter)));

        registry.dispatch(&Event::Ready);
        settle().await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_once_listener_fires_exactly_once() {
        let registry = ListenerRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        registry.once(EventKind::Connect, counting_callback(Arc::clone(&counter)));
        assert_eq!(registry.count(EventKind::Connect), 1);

        registry.dispatch(&Event::Connect);
        registry.dispatch(&Event::Connect);
        settle().await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(registry.count(EventKind::Connect), 0);
    }

    #[tokio::test]
    async fn test_listeners_do_not_cross_kinds() {
        let registry = ListenerRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));

        registry.on(EventKind::Ready, counting_callback(Arc::clone(&counter)));
        registry.dispatch(&Event::Connect);
        settle().await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_waiter_resolves_on_match() {
        let registry = ListenerRegistry::new();
        let receiver = registry.add_waiter(EventKind::Ready, |_| true);

        registry.dispatch(&Event::Ready);
        let event = receiver.await.unwrap();
        assert_eq!(event.kind(), EventKind::Ready);
    }

    #[tokio::test]
    async fn test_waiter_predicate_filters() {
        let registry = ListenerRegistry::new();
        let mut receiver = registry.add_waiter(EventKind::MessageCreate, |event| {
            matches!(event, Event::MessageCreate(m) if m.content == "yes")
        });

        let no: accord_core::Message =
            serde_json::from_str(r#"{"id": "1", "channel_id": "2", "content": "no"}"#).unwrap();
        registry.dispatch(&Event::MessageCreate(no));
        assert!(receiver.try_recv().is_err());

        let yes: accord_core::Message =
            serde_json::from_str(r#"{"id": "3", "channel_id": "2", "content": "yes"}"#).unwrap();
        registry.dispatch(&Event::MessageCreate(yes));
        let event = receiver.await.unwrap();
        assert!(matches!(event, Event::MessageCreate(m) if m.content == "yes"));
    }
}

//! Replay-on-subscribe channel carrying the current search target.
//!
//! The submission flow publishes the target names it is scraping; read-only
//! views subscribe and refilter. Neither side knows about the other.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

type Handler = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Default)]
struct Inner {
    current: String,
    next_id: u64,
    subscribers: Vec<(u64, Handler)>,
}

/// Shared cell holding the latest target string. Clones share the cell.
///
/// Handlers run on the publishing thread, outside the internal lock, so a
/// handler may itself publish or subscribe.
#[derive(Clone, Default)]
pub struct TargetBroadcast {
    inner: Arc<Mutex<Inner>>,
}

impl std::fmt::Debug for TargetBroadcast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("TargetBroadcast")
            .field("current", &inner.current)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

impl TargetBroadcast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> String {
        self.lock().current.clone()
    }

    /// Stores `value` and hands it to every current subscriber.
    pub fn publish(&self, value: impl Into<String>) {
        let value = value.into();
        let handlers: Vec<Handler> = {
            let mut inner = self.lock();
            inner.current.clone_from(&value);
            inner.subscribers.iter().map(|(_, h)| h.clone()).collect()
        };
        for handler in handlers {
            handler(&value);
        }
    }

    /// Registers `handler`, which is called right away with the current value
    /// and then once per `publish`. Dropping the returned guard unsubscribes.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(handler);
        let (id, current) = {
            let mut inner = self.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribers.push((id, handler.clone()));
            (id, inner.current.clone())
        };
        handler(&current);
        Subscription {
            channel: Arc::downgrade(&self.inner),
            id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps a handler registered; unsubscribes on drop.
#[derive(Debug)]
pub struct Subscription {
    channel: Weak<Mutex<Inner>>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(channel) = self.channel.upgrade() {
            let mut inner = channel.lock().unwrap_or_else(PoisonError::into_inner);
            inner.subscribers.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |value: &str| sink.lock().unwrap().push(value.to_string()))
    }

    #[test]
    fn late_subscriber_gets_latest_value() {
        let channel = TargetBroadcast::new();
        channel.publish("Acme");
        let (seen, handler) = recorder();
        let _sub = channel.subscribe(handler);
        assert_eq!(*seen.lock().unwrap(), vec!["Acme"]);
    }

    #[test]
    fn delivers_publishes_in_order_until_dropped() {
        let channel = TargetBroadcast::new();
        let (seen, handler) = recorder();
        let sub = channel.subscribe(handler);
        channel.publish("ICEYE");
        channel.publish("Planet");
        sub.unsubscribe();
        channel.publish("Spire");
        assert_eq!(*seen.lock().unwrap(), vec!["", "ICEYE", "Planet"]);
        assert_eq!(channel.subscriber_count(), 0);
        assert_eq!(channel.current(), "Spire");
    }

    #[test]
    fn subscribers_are_independent() {
        let channel = TargetBroadcast::new();
        let (first, h1) = recorder();
        let (second, h2) = recorder();
        let _a = channel.subscribe(h1);
        channel.publish("A");
        let _b = channel.subscribe(h2);
        channel.publish("B");
        assert_eq!(*first.lock().unwrap(), vec!["", "A", "B"]);
        assert_eq!(*second.lock().unwrap(), vec!["A", "B"]);
    }

    #[test]
    fn handler_may_publish_reentrantly() {
        let channel = TargetBroadcast::new();
        let echo = channel.clone();
        let _sub = channel.subscribe(move |value| {
            if value == "raw" {
                echo.publish("normalized");
            }
        });
        channel.publish("raw");
        assert_eq!(channel.current(), "normalized");
    }
}

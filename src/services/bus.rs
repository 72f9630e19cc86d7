//! In-process, best-effort publish/subscribe for refresh hints

use tokio::sync::broadcast::{self, error::{RecvError, TryRecvError}};
use tracing::{debug, warn};
use crate::domain::events::{Notification, Topic};

const DEFAULT_CAPACITY: usize = 64;

/// Cheap to clone; every clone publishes to the same subscribers.
///
/// Nothing is persisted. A view that is not subscribed when a notice goes
/// out never sees it and must re-fetch when it (re)mounts.
#[derive(Clone, Debug)]
pub struct NotificationBus {
    sender: broadcast::Sender<Notification>,
}

impl Default for NotificationBus {
    fn default() -> Self { Self::with_capacity(DEFAULT_CAPACITY) }
}

impl NotificationBus {
    pub fn new() -> Self { Self::default() }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Returns how many subscribers were listening. Zero is not an error.
    pub fn publish(&self, notification: Notification) -> usize {
        let topic = notification.topic();
        match self.sender.send(notification) {
            Ok(receivers) => { debug!(?topic, receivers, "Published notification"); receivers }
            Err(_) => { debug!(?topic, "Published notification with no subscribers"); 0 }
        }
    }

    pub fn subscribe(&self, topic: Topic) -> Subscription {
        Subscription { topic, receiver: self.sender.subscribe() }
    }
}

/// Receives notifications of a single topic.
#[derive(Debug)]
pub struct Subscription {
    topic: Topic,
    receiver: broadcast::Receiver<Notification>,
}

impl Subscription {
    /// Waits for the next notification on this topic. `None` once every
    /// bus handle is gone. Notices missed while lagging are skipped.
    pub async fn recv(&mut self) -> Option<Notification> {
        loop {
            match self.receiver.recv().await {
                Ok(n) if n.topic() == self.topic => return Some(n),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => warn!(topic = ?self.topic, skipped, "Subscriber lagged, notifications dropped"),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<Notification> {
        loop {
            match self.receiver.try_recv() {
                Ok(n) if n.topic() == self.topic => return Some(n),
                Ok(_) => continue,
                Err(TryRecvError::Lagged(skipped)) => warn!(topic = ?self.topic, skipped, "Subscriber lagged, notifications dropped"),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribers_only_see_their_topic() {
        let bus = NotificationBus::new();
        let mut carts = bus.subscribe(Topic::CartChanged);
        let mut wishlist = bus.subscribe(Topic::WishlistChanged);

        bus.publish(Notification::CartChanged { user_id: "u1".into() });
        bus.publish(Notification::WishlistChanged { user_id: "u1".into(), product_id: None });

        assert_eq!(carts.try_recv(), Some(Notification::CartChanged { user_id: "u1".into() }));
        assert_eq!(carts.try_recv(), None);
        assert!(matches!(wishlist.try_recv(), Some(Notification::WishlistChanged { .. })));
    }

    #[test]
    fn test_publish_without_subscribers_is_dropped() {
        let bus = NotificationBus::new();
        assert_eq!(bus.publish(Notification::CartChanged { user_id: "u1".into() }), 0);
        // Subscribing afterwards does not replay
        let mut late = bus.subscribe(Topic::CartChanged);
        assert_eq!(late.try_recv(), None);
    }

    #[test]
    fn test_lagging_subscriber_skips_ahead() {
        let bus = NotificationBus::with_capacity(2);
        let mut sub = bus.subscribe(Topic::CartChanged);
        for i in 0..5 {
            bus.publish(Notification::CartChanged { user_id: format!("u{}", i).into() });
        }
        assert_eq!(sub.try_recv(), Some(Notification::CartChanged { user_id: "u3".into() }));
        assert_eq!(sub.try_recv(), Some(Notification::CartChanged { user_id: "u4".into() }));
        assert_eq!(sub.try_recv(), None);
    }

    #[tokio::test]
    async fn test_recv_ends_when_bus_dropped() {
        let bus = NotificationBus::new();
        let mut sub = bus.subscribe(Topic::StockChanged);
        drop(bus);
        assert_eq!(sub.recv().await, None);
    }
}

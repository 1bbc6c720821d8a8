//! Change notifier: in-process publish/subscribe bus for mutation events
//!
//! One broadcast channel per entity topic. The bus is constructed once at
//! startup and handed to the GraphQL schema as an `Arc`; tests build a
//! fresh bus each so nothing leaks between them.
//!
//! Delivery semantics: every active subscriber on a topic receives every
//! event published to that topic after it subscribed, in publish order.
//! `publish` never blocks or fails. A subscriber that falls behind the
//! channel capacity loses the oldest events (it observes a `Lagged` gap),
//! and a dropped receiver releases its state immediately.

use tokio::sync::broadcast;

use crate::db::{BookRecord, CommentRecord, PostRecord, ReviewRecord, UserRecord};

/// Default per-topic channel capacity
pub const DEFAULT_CAPACITY: usize = 256;

/// Entity-kind channels of the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    User,
    Post,
    Book,
    Comment,
    Review,
    Count,
}

const TOPICS: usize = 6;

impl Topic {
    fn index(self) -> usize {
        match self {
            Topic::User => 0,
            Topic::Post => 1,
            Topic::Book => 2,
            Topic::Comment => 3,
            Topic::Review => 4,
            Topic::Count => 5,
        }
    }
}

/// What a mutation did to the record carried by an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Created,
    Updated,
    Deleted,
}

/// The record carried by a change event
#[derive(Debug, Clone)]
pub enum ChangeNode {
    User(UserRecord),
    Post(PostRecord),
    Book(BookRecord),
    Comment(CommentRecord),
    Review(ReviewRecord),
    Count(i64),
}

/// A single mutation event, published once and never persisted
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub mutation: MutationKind,
    pub node: ChangeNode,
}

/// Topic-keyed broadcast bus
pub struct ChangeNotifier {
    channels: [broadcast::Sender<ChangeEvent>; TOPICS],
}

impl ChangeNotifier {
    /// Create a bus whose topics each buffer up to `capacity` events per
    /// subscriber
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: std::array::from_fn(|_| broadcast::channel(capacity).0),
        }
    }

    /// Publish an event to every current subscriber of `topic`.
    ///
    /// Best-effort: a topic with no subscribers drops the event, and a
    /// slow subscriber can never block the publisher.
    pub fn publish(&self, topic: Topic, event: ChangeEvent) {
        let receivers = self.channels[topic.index()].send(event).unwrap_or(0);
        tracing::debug!(?topic, receivers, "change event published");
    }

    /// Subscribe to `topic`, receiving events published from now on
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<ChangeEvent> {
        self.channels[topic.index()].subscribe()
    }

    /// Number of live subscribers on a topic
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.channels[topic.index()].receiver_count()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    fn count_event(n: i64) -> ChangeEvent {
        ChangeEvent {
            mutation: MutationKind::Updated,
            node: ChangeNode::Count(n),
        }
    }

    fn node_count(event: &ChangeEvent) -> i64 {
        match event.node {
            ChangeNode::Count(n) => n,
            _ => panic!("expected count node"),
        }
    }

    #[tokio::test]
    async fn delivers_in_publish_order_to_all_subscribers() {
        let bus = ChangeNotifier::new(16);
        let mut a = bus.subscribe(Topic::Count);
        let mut b = bus.subscribe(Topic::Count);

        for n in 0..5 {
            bus.publish(Topic::Count, count_event(n));
        }

        for n in 0..5 {
            assert_eq!(node_count(&a.recv().await.unwrap()), n);
            assert_eq!(node_count(&b.recv().await.unwrap()), n);
        }
    }

    #[tokio::test]
    async fn topics_are_isolated() {
        let bus = ChangeNotifier::new(16);
        let mut posts = bus.subscribe(Topic::Post);
        let mut counts = bus.subscribe(Topic::Count);

        bus.publish(Topic::Count, count_event(7));

        assert_eq!(node_count(&counts.recv().await.unwrap()), 7);
        assert_matches!(posts.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn no_delivery_before_subscription_and_none_after_drop() {
        let bus = ChangeNotifier::new(16);
        bus.publish(Topic::Count, count_event(1)); // no subscribers yet

        let mut rx = bus.subscribe(Topic::Count);
        bus.publish(Topic::Count, count_event(2));
        assert_eq!(node_count(&rx.recv().await.unwrap()), 2);

        drop(rx);
        assert_eq!(bus.subscriber_count(Topic::Count), 0);
        // Publishing into an empty topic must not fail.
        bus.publish(Topic::Count, count_event(3));
    }

    #[tokio::test]
    async fn slow_subscriber_lags_without_blocking_publisher() {
        let bus = ChangeNotifier::new(4);
        let mut slow = bus.subscribe(Topic::Count);

        // Overrun the per-subscriber buffer; publish must stay non-blocking.
        for n in 0..10 {
            bus.publish(Topic::Count, count_event(n));
        }

        assert_matches!(slow.recv().await, Err(RecvError::Lagged(_)));
        // After the gap the subscriber resumes with the retained tail.
        let next = node_count(&slow.recv().await.unwrap());
        assert!(next >= 6);
    }
}

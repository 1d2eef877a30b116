use serde::{Deserialize, Serialize};
use swarmspace_common::EntityId;

/// Topics an entity can publish about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Topic {
    Destroyed,
}

/// What a subscriber does when its topic fires. A closed enum applied by the
/// world, instead of stored callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notification {
    /// The subscriber's steering target went away; fall back to idle.
    TargetDestroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Subscription {
    publisher: EntityId,
    topic: Topic,
    subscriber: EntityId,
    note: Notification,
}

/// Central table of (publisher, topic, subscriber) rows.
///
/// Delivery is at-most-once: publishing a topic drains every matching row.
/// Subscribers can also be dropped in bulk by identity, regardless of topic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObserverTable {
    rows: Vec<Subscription>,
}

impl ObserverTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Register interest in `topic` on `publisher`. Self-subscription is
    /// ignored, as is an exact duplicate row.
    pub fn subscribe(
        &mut self,
        publisher: EntityId,
        topic: Topic,
        subscriber: EntityId,
        note: Notification,
    ) {
        if publisher == subscriber {
            return;
        }
        let row = Subscription {
            publisher,
            topic,
            subscriber,
            note,
        };
        if self.rows.contains(&row) {
            return;
        }
        self.rows.push(row);
    }

    /// Remove one subscriber's interest in a specific topic on a publisher.
    pub fn unsubscribe(&mut self, publisher: EntityId, topic: Topic, subscriber: EntityId) {
        self.rows.retain(|r| {
            !(r.publisher == publisher && r.topic == topic && r.subscriber == subscriber)
        });
    }

    /// Remove every row held by a subscriber identity, any topic.
    pub fn unsubscribe_all(&mut self, subscriber: EntityId) {
        self.rows.retain(|r| r.subscriber != subscriber);
    }

    /// Remove every row naming a publisher; used when it is destroyed after
    /// its own topics fired.
    pub fn drop_publisher(&mut self, publisher: EntityId) {
        self.rows.retain(|r| r.publisher != publisher);
    }

    /// Drain all rows matching (publisher, topic) and hand back the
    /// notifications to apply. Each row delivers at most once.
    pub fn publish(&mut self, publisher: EntityId, topic: Topic) -> Vec<(EntityId, Notification)> {
        let mut fired = Vec::new();
        self.rows.retain(|r| {
            if r.publisher == publisher && r.topic == topic {
                fired.push((r.subscriber, r.note));
                false
            } else {
                true
            }
        });
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(index: u32) -> EntityId {
        EntityId::new(index, 0)
    }

    #[test]
    fn publish_delivers_once_and_drains() {
        let mut table = ObserverTable::new();
        table.subscribe(id(1), Topic::Destroyed, id(2), Notification::TargetDestroyed);

        let fired = table.publish(id(1), Topic::Destroyed);
        assert_eq!(fired, vec![(id(2), Notification::TargetDestroyed)]);

        // Auto-unsubscribed after delivery.
        assert!(table.publish(id(1), Topic::Destroyed).is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn self_subscription_is_ignored() {
        let mut table = ObserverTable::new();
        table.subscribe(id(1), Topic::Destroyed, id(1), Notification::TargetDestroyed);
        assert!(table.is_empty());
    }

    #[test]
    fn duplicate_rows_collapse() {
        let mut table = ObserverTable::new();
        table.subscribe(id(1), Topic::Destroyed, id(2), Notification::TargetDestroyed);
        table.subscribe(id(1), Topic::Destroyed, id(2), Notification::TargetDestroyed);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn bulk_unsubscribe_by_identity() {
        let mut table = ObserverTable::new();
        table.subscribe(id(1), Topic::Destroyed, id(9), Notification::TargetDestroyed);
        table.subscribe(id(2), Topic::Destroyed, id(9), Notification::TargetDestroyed);
        table.subscribe(id(3), Topic::Destroyed, id(4), Notification::TargetDestroyed);

        table.unsubscribe_all(id(9));
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.publish(id(3), Topic::Destroyed),
            vec![(id(4), Notification::TargetDestroyed)]
        );
    }

    #[test]
    fn targeted_unsubscribe_leaves_others() {
        let mut table = ObserverTable::new();
        table.subscribe(id(1), Topic::Destroyed, id(2), Notification::TargetDestroyed);
        table.subscribe(id(1), Topic::Destroyed, id(3), Notification::TargetDestroyed);

        table.unsubscribe(id(1), Topic::Destroyed, id(2));
        assert_eq!(
            table.publish(id(1), Topic::Destroyed),
            vec![(id(3), Notification::TargetDestroyed)]
        );
    }
}

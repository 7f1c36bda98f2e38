//! Session event bus
//!
//! Hosts subscribe to `(construct, CallbackType)` pairs. The executor
//! publishes after each applied action and the bus queues a notification
//! per matching subscription. A `Delete` drops every subscription on that
//! construct once it has been delivered.

use crate::editor::ast::NodeId;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CallbackType {
    /// Text or children of the construct changed
    Change,
    /// Construct was replaced by another one
    Replace,
    Delete,
    /// A draft record on the construct opened, changed or closed
    DraftChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// A delivered event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subscription: SubscriptionId,
    pub construct: NodeId,
    pub kind: CallbackType,
    /// Replacement construct for `Replace`
    pub replacement: Option<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct EventBus {
    subscriptions: BTreeMap<(NodeId, CallbackType), Vec<SubscriptionId>>,
    queue: Vec<Notification>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, construct: NodeId, kind: CallbackType) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscriptions.entry((construct, kind)).or_default().push(id);
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let mut found = false;
        for subscribers in self.subscriptions.values_mut() {
            let before = subscribers.len();
            subscribers.retain(|s| *s != id);
            found |= subscribers.len() != before;
        }
        self.subscriptions.retain(|_, subscribers| !subscribers.is_empty());
        found
    }

    pub fn publish(&mut self, construct: NodeId, kind: CallbackType, replacement: Option<NodeId>) {
        if let Some(subscribers) = self.subscriptions.get(&(construct, kind)) {
            for subscription in subscribers {
                self.queue.push(Notification {
                    subscription: *subscription,
                    construct,
                    kind,
                    replacement,
                });
            }
        }
        if kind == CallbackType::Delete {
            let before = self.subscriptions.len();
            self.subscriptions.retain(|(node, _), _| *node != construct);
            if self.subscriptions.len() != before {
                debug!("Dropped subscriptions of deleted construct {}", construct);
            }
        }
    }

    /// Drop subscriptions on constructs the tree released
    pub fn forget(&mut self, released: &[NodeId]) {
        self.subscriptions
            .retain(|(node, _), _| !released.contains(node));
    }

    /// Keep only subscriptions whose construct `keep` accepts
    pub fn retain_constructs(&mut self, mut keep: impl FnMut(NodeId) -> bool) {
        self.subscriptions.retain(|(node, _), _| keep(*node));
    }

    /// Take all queued notifications
    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.queue)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_matching_subscribers_only() {
        let mut bus = EventBus::new();
        let change = bus.subscribe(NodeId(4), CallbackType::Change);
        bus.subscribe(NodeId(4), CallbackType::Replace);
        bus.subscribe(NodeId(5), CallbackType::Change);

        bus.publish(NodeId(4), CallbackType::Change, None);
        let delivered = bus.drain();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].subscription, change);
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_delete_drops_all_subscriptions_of_construct() {
        let mut bus = EventBus::new();
        bus.subscribe(NodeId(4), CallbackType::Change);
        bus.subscribe(NodeId(4), CallbackType::Delete);
        bus.subscribe(NodeId(9), CallbackType::Change);

        bus.publish(NodeId(4), CallbackType::Delete, None);
        assert_eq!(bus.drain().len(), 1);
        assert_eq!(bus.subscription_count(), 1);

        bus.publish(NodeId(4), CallbackType::Change, None);
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_unsubscribe() {
        let mut bus = EventBus::new();
        let id = bus.subscribe(NodeId(1), CallbackType::DraftChanged);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.subscription_count(), 0);
    }
}

//! Subscriber identity for the reactive system.
//!
//! A subscriber is any computation that depends on reactive values. In this
//! crate that is a tracking session, usually owned by a view instance.

use std::fmt;

use crate::graph::NodeId;

/// Unique identifier for a subscriber.
///
/// Subscriber ids share the node-id space with signals, so either kind can
/// be used as a graph node without translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(NodeId);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        Self(NodeId::new())
    }

    /// The graph node backing this subscriber.
    pub fn node(&self) -> NodeId {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<NodeId> for SubscriberId {
    fn from(node: NodeId) -> Self {
        Self(node)
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscriber#{}", self.0.raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscriber_ids_are_unique() {
        let id1 = SubscriberId::new();
        let id2 = SubscriberId::new();
        let id3 = SubscriberId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    #[test]
    fn subscriber_id_round_trips_through_node() {
        let id = SubscriberId::new();
        assert_eq!(SubscriberId::from(id.node()), id);
    }
}

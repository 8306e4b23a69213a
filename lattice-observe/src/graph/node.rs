//! Graph Nodes
//!
//! This module defines the node types that live in the dependency graph.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a node in the dependency graph.
///
/// Signals and subscribers draw their ids from this one space, so a
/// `NodeId` never needs to say which kind of thing it names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// The kind of node in the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A source node (signal). Sources only have dependents.
    Source,

    /// An observer node (tracking session). Observers only have dependencies.
    Observer,
}

/// Dirty state of a node.
///
/// Only observers move between states; sources stay clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtyState {
    /// The observer's recorded reads are current.
    Clean,

    /// A recorded read changed since the observer last tracked. The observer
    /// has been told once and will not be told again until it re-tracks.
    Dirty,
}

/// A node in the dependency graph.
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    dirty: DirtyState,

    /// Nodes that this node depends on. Empty for sources.
    dependencies: HashSet<NodeId>,

    /// Nodes that depend on this node. Empty for observers.
    dependents: HashSet<NodeId>,
}

impl Node {
    /// Create a node with an existing id.
    pub fn with_id(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            dirty: DirtyState::Clean,
            dependencies: HashSet::new(),
            dependents: HashSet::new(),
        }
    }

    /// Create a new source (signal) node.
    pub fn source(id: NodeId) -> Self {
        Self::with_id(id, NodeKind::Source)
    }

    /// Create a new observer node.
    pub fn observer(id: NodeId) -> Self {
        Self::with_id(id, NodeKind::Observer)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn dirty_state(&self) -> DirtyState {
        self.dirty
    }

    pub fn is_clean(&self) -> bool {
        self.dirty == DirtyState::Clean
    }

    pub fn mark_clean(&mut self) {
        self.dirty = DirtyState::Clean;
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = DirtyState::Dirty;
    }

    pub fn add_dependency(&mut self, node_id: NodeId) {
        self.dependencies.insert(node_id);
    }

    pub fn remove_dependency(&mut self, node_id: NodeId) {
        self.dependencies.remove(&node_id);
    }

    pub fn dependencies(&self) -> &HashSet<NodeId> {
        &self.dependencies
    }

    pub fn add_dependent(&mut self, node_id: NodeId) {
        self.dependents.insert(node_id);
    }

    pub fn remove_dependent(&mut self, node_id: NodeId) {
        self.dependents.remove(&node_id);
    }

    pub fn dependents(&self) -> &HashSet<NodeId> {
        &self.dependents
    }

    /// Drop every dependency, returning the ones that were removed.
    pub fn take_dependencies(&mut self) -> HashSet<NodeId> {
        std::mem::take(&mut self.dependencies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_are_unique() {
        let id1 = NodeId::new();
        let id2 = NodeId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn nodes_start_clean() {
        let source = Node::source(NodeId::new());
        let observer = Node::observer(NodeId::new());
        assert_eq!(source.kind(), NodeKind::Source);
        assert_eq!(observer.kind(), NodeKind::Observer);
        assert!(source.is_clean());
        assert!(observer.is_clean());
    }

    #[test]
    fn dependency_management() {
        let mut node = Node::observer(NodeId::new());
        let dep1 = NodeId::new();
        let dep2 = NodeId::new();

        node.add_dependency(dep1);
        node.add_dependency(dep2);
        assert_eq!(node.dependencies().len(), 2);

        node.remove_dependency(dep1);
        assert!(!node.dependencies().contains(&dep1));

        let taken = node.take_dependencies();
        assert!(taken.contains(&dep2));
        assert!(node.dependencies().is_empty());
    }

    #[test]
    fn dirty_state_transitions() {
        let mut node = Node::observer(NodeId::new());

        node.mark_dirty();
        assert_eq!(node.dirty_state(), DirtyState::Dirty);

        node.mark_clean();
        assert_eq!(node.dirty_state(), DirtyState::Clean);
    }
}

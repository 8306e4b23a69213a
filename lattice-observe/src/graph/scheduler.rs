//! Update Scheduler
//!
//! The scheduler decides which observers must be told about a change.
//!
//! # Algorithm
//!
//! 1. When an observer finishes a tracked run, its dependency edges are
//!    replaced wholesale by the reads of that run and it is marked clean.
//! 2. When a source changes, every *clean* direct dependent is marked dirty
//!    and returned. Dirty dependents are skipped: they were already told and
//!    have not re-tracked since.
//! 3. Inside a batch, returned observers are parked in an insertion-ordered
//!    pending set instead, so an observer touched by several writes in the
//!    same batch is told once.
//!
//! There are no derived nodes, so no topological ordering is required.

use std::collections::HashMap;

use indexmap::IndexSet;

use super::node::{Node, NodeId, NodeKind};

/// The update scheduler manages the dependency graph and coordinates updates.
pub struct UpdateScheduler {
    /// All nodes in the graph, indexed by ID.
    nodes: HashMap<NodeId, Node>,

    /// Observers invalidated during a batch that have not been told yet.
    pending: IndexSet<NodeId>,
}

impl UpdateScheduler {
    /// Create a new empty scheduler.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            pending: IndexSet::new(),
        }
    }

    /// Insert a node if none exists for `id`.
    pub fn ensure_node(&mut self, id: NodeId, kind: NodeKind) -> &mut Node {
        self.nodes
            .entry(id)
            .or_insert_with(|| Node::with_id(id, kind))
    }

    /// Remove a node from the graph.
    ///
    /// Also removes all edges involving this node.
    pub fn remove_node(&mut self, node_id: NodeId) {
        if let Some(node) = self.nodes.remove(&node_id) {
            for dep_id in node.dependencies() {
                if let Some(dep) = self.nodes.get_mut(dep_id) {
                    dep.remove_dependent(node_id);
                }
            }
            for dependent_id in node.dependents() {
                if let Some(dependent) = self.nodes.get_mut(dependent_id) {
                    dependent.remove_dependency(node_id);
                }
            }
        }
        self.pending.shift_remove(&node_id);
    }

    /// Get a reference to a node.
    pub fn get_node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Replace an observer's dependencies with `sources` and mark it clean.
    pub fn replace_dependencies<I>(&mut self, observer: NodeId, sources: I)
    where
        I: IntoIterator<Item = NodeId>,
    {
        let previous = self
            .ensure_node(observer, NodeKind::Observer)
            .take_dependencies();
        for source_id in previous {
            if let Some(source) = self.nodes.get_mut(&source_id) {
                source.remove_dependent(observer);
            }
        }

        for source_id in sources {
            self.ensure_node(source_id, NodeKind::Source)
                .add_dependent(observer);
            if let Some(node) = self.nodes.get_mut(&observer) {
                node.add_dependency(source_id);
            }
        }

        if let Some(node) = self.nodes.get_mut(&observer) {
            node.mark_clean();
        }
        self.pending.shift_remove(&observer);
    }

    /// Mark a source as changed.
    ///
    /// Returns the observers that went from clean to dirty, in creation order.
    pub fn mark_changed(&mut self, source_id: NodeId) -> Vec<NodeId> {
        let dependents: Vec<NodeId> = match self.nodes.get(&source_id) {
            Some(source) => source.dependents().iter().copied().collect(),
            None => return Vec::new(),
        };

        let mut invalidated = Vec::new();
        for node_id in dependents {
            if let Some(node) = self.nodes.get_mut(&node_id) {
                if node.is_clean() {
                    node.mark_dirty();
                    invalidated.push(node_id);
                }
            }
        }
        invalidated.sort();
        invalidated
    }

    /// Park invalidated observers until the current batch ends.
    pub fn defer<I>(&mut self, observers: I)
    where
        I: IntoIterator<Item = NodeId>,
    {
        self.pending.extend(observers);
    }

    /// Take every parked observer, in the order they were first parked.
    pub fn drain_pending(&mut self) -> Vec<NodeId> {
        self.pending.drain(..).collect()
    }

    /// Get the total number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Default for UpdateScheduler {
    fn default() -> Self {
        Self::new()
    }
}

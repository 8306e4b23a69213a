//! Dependency Graph
//!
//! This module implements the graph that records which tracking sessions
//! read which signals.
//!
//! # Overview
//!
//! The graph is bipartite:
//!
//! - Source nodes are signals
//! - Observer nodes are tracking sessions
//! - An edge from a source to an observer means the observer read the source
//!   during its last tracked run
//!
//! When a signal changes, the scheduler walks its dependents and picks the
//! observers that need to be invalidated.
//!
//! # Design Decisions
//!
//! 1. The graph is indexed by node ID for O(1) lookups.
//!
//! 2. We maintain both forward (dependencies) and reverse (dependents) edges
//!    so a re-track can drop its old edges without scanning every source.

mod node;
mod scheduler;

pub use node::{DirtyState, Node, NodeId, NodeKind};
pub use scheduler::UpdateScheduler;

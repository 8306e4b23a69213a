//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects signals and tracking
//! sessions. It owns the dependency graph and delivers invalidations when
//! signals change.
//!
//! # How It Works
//!
//! 1. When a session is created, it registers with the runtime.
//!
//! 2. When a session finishes a tracked run, the runtime replaces the
//!    session's recorded reads with the reads of that run.
//!
//! 3. When a signal's value changes, the runtime:
//!    a. Finds every dependent session that is still up to date
//!    b. Marks it stale
//!    c. Invalidates it, or parks it until the current batch ends
//!
//! # Threading
//!
//! Reactivity is single-threaded. All runtime state lives in a thread-local,
//! so each thread has an independent graph. No borrow of that state is held
//! while an invalidation callback runs, which lets callbacks read signals,
//! re-track sessions or start new batches.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::graph::{NodeId, NodeKind, UpdateScheduler};

use super::context::ReactiveContext;
use super::signal::SignalId;
use super::subscriber::SubscriberId;

/// A trait for types that can be told their dependencies changed.
pub trait Reactive {
    /// Get the subscriber ID for this reactive value.
    fn subscriber_id(&self) -> SubscriberId;

    /// Called once when a recorded read changes after the last tracked run.
    fn invalidate(&self);
}

/// Handle to a registered reactive value.
///
/// Dropping this handle unregisters the reactive value from the runtime.
pub struct ReactiveHandle {
    subscriber_id: SubscriberId,
}

impl ReactiveHandle {
    pub fn subscriber_id(&self) -> SubscriberId {
        self.subscriber_id
    }
}

impl Drop for ReactiveHandle {
    fn drop(&mut self) {
        Runtime::unregister(self.subscriber_id);
    }
}

#[derive(Default)]
struct RuntimeState {
    /// Live subscribers. Weak so the runtime never keeps a session alive.
    registry: HashMap<SubscriberId, Weak<dyn Reactive>>,
    scheduler: UpdateScheduler,
    batch_depth: usize,
}

thread_local! {
    static STATE: RefCell<RuntimeState> = RefCell::new(RuntimeState::default());
}

/// The per-thread reactive runtime.
pub struct Runtime;

impl Runtime {
    /// Register a reactive value with the runtime.
    ///
    /// Returns a handle that unregisters the value when dropped.
    pub fn register(reactive: Rc<dyn Reactive>) -> ReactiveHandle {
        let id = reactive.subscriber_id();

        STATE.with(|state| {
            let mut state = state.borrow_mut();
            state.registry.insert(id, Rc::downgrade(&reactive));
            state.scheduler.ensure_node(id.node(), NodeKind::Observer);
        });

        ReactiveHandle { subscriber_id: id }
    }

    /// Unregister a reactive value and drop every edge it owns.
    pub(crate) fn unregister(id: SubscriberId) {
        // The thread-local may already be gone during thread teardown.
        let _ = STATE.try_with(|state| {
            let mut state = state.borrow_mut();
            state.registry.remove(&id);
            state.scheduler.remove_node(id.node());
        });
    }

    /// Forget a signal whose last handle was dropped.
    pub(crate) fn forget_signal(id: SignalId) {
        let _ = STATE.try_with(|state| {
            state.borrow_mut().scheduler.remove_node(id.node());
        });
    }

    /// Replace everything `subscriber_id` depends on with `reads`.
    ///
    /// Also marks the subscriber up to date, so the next change to one of
    /// `reads` invalidates it again.
    pub fn set_dependencies<I>(subscriber_id: SubscriberId, reads: I)
    where
        I: IntoIterator<Item = SignalId>,
    {
        STATE.with(|state| {
            let mut state = state.borrow_mut();
            if !state.registry.contains_key(&subscriber_id) {
                return;
            }
            state
                .scheduler
                .replace_dependencies(subscriber_id.node(), reads.into_iter().map(|s| s.node()));
        });
    }

    /// Notify all subscribers that a signal changed.
    ///
    /// This is the core update propagation mechanism.
    pub fn notify_signal_change(signal_id: SignalId) {
        let invalidated = STATE.with(|state| {
            let mut state = state.borrow_mut();
            let stale = state.scheduler.mark_changed(signal_id.node());
            if state.batch_depth > 0 {
                state.scheduler.defer(stale);
                Vec::new()
            } else {
                stale
            }
        });

        Self::deliver(invalidated);
    }

    /// Invalidate `nodes`, resolving them outside of any state borrow.
    fn deliver(nodes: Vec<NodeId>) {
        if nodes.is_empty() {
            return;
        }

        let targets: Vec<Rc<dyn Reactive>> = STATE.with(|state| {
            let state = state.borrow();
            nodes
                .into_iter()
                .filter_map(|node| state.registry.get(&SubscriberId::from(node)))
                .filter_map(Weak::upgrade)
                .collect()
        });

        for reactive in targets {
            tracing::trace!(subscriber = %reactive.subscriber_id(), "invalidating subscriber");
            reactive.invalidate();
        }
    }

    pub(crate) fn begin_batch() {
        STATE.with(|state| state.borrow_mut().batch_depth += 1);
    }

    /// Leave a batch; the outermost exit delivers everything parked.
    pub(crate) fn end_batch() {
        let parked = Self::close_batch();
        Self::deliver(parked);
    }

    /// Close a batch without delivering what it parked.
    ///
    /// Parked subscribers stay dirty, so they are not notified again until
    /// they re-track.
    pub(crate) fn abandon_batch() {
        let dropped = Self::close_batch();
        if !dropped.is_empty() {
            tracing::warn!(count = dropped.len(), "batch abandoned; invalidations dropped");
        }
    }

    fn close_batch() -> Vec<NodeId> {
        STATE.with(|state| {
            let mut state = state.borrow_mut();
            state.batch_depth = state.batch_depth.saturating_sub(1);
            if state.batch_depth == 0 {
                state.scheduler.drain_pending()
            } else {
                Vec::new()
            }
        })
    }

    /// Check if a batch is open on this thread.
    pub fn is_batching() -> bool {
        STATE.with(|state| state.borrow().batch_depth > 0)
    }

    /// Number of subscribers that read `signal_id` during their last run.
    pub fn dependent_count(signal_id: SignalId) -> usize {
        STATE.with(|state| {
            state
                .borrow()
                .scheduler
                .get_node(signal_id.node())
                .map(|node| node.dependents().len())
                .unwrap_or(0)
        })
    }

    /// Number of signals `subscriber_id` read during its last run.
    pub fn dependency_count(subscriber_id: SubscriberId) -> usize {
        STATE.with(|state| {
            state
                .borrow()
                .scheduler
                .get_node(subscriber_id.node())
                .map(|node| node.dependencies().len())
                .unwrap_or(0)
        })
    }

    /// Check if a subscriber is still registered.
    pub fn is_registered(subscriber_id: SubscriberId) -> bool {
        STATE.with(|state| state.borrow().registry.contains_key(&subscriber_id))
    }

    /// Get the current subscriber being tracked, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        ReactiveContext::current_subscriber()
    }

    /// Check if we're inside a reactive context.
    pub fn is_tracking() -> bool {
        ReactiveContext::is_active()
    }
}

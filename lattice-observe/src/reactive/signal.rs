//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and
//! tracks which computations depend on it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read within a reactive context (a tracked run), the
//!    read is recorded on that context.
//!
//! 2. When the tracked run completes, the runtime turns the recorded reads
//!    into dependency edges.
//!
//! 3. When a signal's value changes, the runtime invalidates every session
//!    that read it during its last run.
//!
//! # Write Guard
//!
//! Writes issued inside a guarded tracked run are refused. The value is left
//! untouched and the refusal is remembered so the run fails afterwards.

use std::cell::{Ref, RefCell};
use std::fmt::{self, Debug};
use std::rc::Rc;

use crate::graph::NodeId;

use super::context::ReactiveContext;
use super::error::ReactiveError;
use super::runtime::Runtime;

/// Unique identifier for a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalId(NodeId);

impl SignalId {
    fn next() -> Self {
        Self(NodeId::new())
    }

    /// The graph node backing this signal.
    pub fn node(&self) -> NodeId {
        self.0
    }
}

impl From<NodeId> for SignalId {
    fn from(node: NodeId) -> Self {
        Self(node)
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "signal#{}", self.0.raw())
    }
}

struct SignalInner<T> {
    id: SignalId,
    value: RefCell<T>,
}

impl<T> Drop for SignalInner<T> {
    fn drop(&mut self) {
        Runtime::forget_signal(self.id);
    }
}

/// A reactive signal holding a value of type T.
///
/// Cloning a signal yields another handle to the same value.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
///
/// // Read the value
/// let value = count.get();
///
/// // Update the value (invalidates sessions that read it)
/// count.set(5);
/// ```
pub struct Signal<T: 'static> {
    inner: Rc<SignalInner<T>>,
}

impl<T: 'static> Signal<T> {
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                id: SignalId::next(),
                value: RefCell::new(value),
            }),
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> SignalId {
        self.inner.id
    }

    /// Borrow the current value, recording the read.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        ReactiveContext::track_dependency(self.inner.id);
        f(&*self.inner.value.borrow())
    }

    /// Borrow the current value without tracking dependencies.
    pub fn borrow_untracked(&self) -> Ref<'_, T> {
        self.inner.value.borrow()
    }

    /// Set a new value and notify subscribers.
    ///
    /// Inside a guarded tracked run the write is refused and logged; use
    /// [`Signal::try_set`] to observe the refusal directly.
    pub fn set(&self, value: T) {
        if let Err(err) = self.try_set(value) {
            tracing::error!(%err, "refused signal write");
        }
    }

    /// Set a new value, failing if writes are currently guarded.
    pub fn try_set(&self, value: T) -> Result<(), ReactiveError> {
        ReactiveContext::check_write(self.inner.id)?;
        *self.inner.value.borrow_mut() = value;
        Runtime::notify_signal_change(self.inner.id);
        Ok(())
    }

    /// Update the value using a function.
    ///
    /// This is useful for updates that depend on the current value.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let new_value = f(&*self.inner.value.borrow());
        self.set(new_value);
    }

    /// Get the number of sessions that read this signal during their last run.
    pub fn subscriber_count(&self) -> usize {
        Runtime::dependent_count(self.inner.id)
    }
}

impl<T: Clone + 'static> Signal<T> {
    /// Get the current value.
    ///
    /// If called within a reactive context, this also records the read.
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    /// Get the current value without tracking dependencies.
    pub fn get_untracked(&self) -> T {
        self.inner.value.borrow().clone()
    }
}

impl<T: 'static> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Debug + 'static> Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.borrow())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

//! Tracking Sessions
//!
//! A session is a subscription context that records which signals were read
//! during a tracked run and is invalidated when any of them changes.
//!
//! # How Sessions Work
//!
//! 1. A session is created with a label and an invalidation callback. It
//!    depends on nothing until it tracks something.
//!
//! 2. `track` runs a closure inside a write-guarded reactive context. The
//!    reads of that run replace whatever the session depended on before, so
//!    branches not taken in this run are no longer dependencies.
//!
//! 3. The first change to any recorded read calls the invalidation callback.
//!    Further changes are ignored until the session tracks again.
//!
//! 4. `dispose` drops every dependency. A disposed session never calls its
//!    callback again and refuses to track.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use super::context::ReactiveContext;
use super::error::ReactiveError;
use super::runtime::{Reactive, ReactiveHandle, Runtime};
use super::subscriber::SubscriberId;

struct SessionInner {
    subscriber_id: SubscriberId,
    label: Rc<str>,
    on_invalidate: Box<dyn Fn()>,
    disposed: Cell<bool>,
    track_count: Cell<usize>,
}

impl Reactive for SessionInner {
    fn subscriber_id(&self) -> SubscriberId {
        self.subscriber_id
    }

    fn invalidate(&self) {
        if self.disposed.get() {
            return;
        }
        tracing::debug!(label = %self.label, "tracking session invalidated");
        (self.on_invalidate)();
    }
}

/// A tracking session.
///
/// Cloning yields another handle to the same session.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
/// let session = Session::new("Counter", || println!("stale"));
///
/// let doubled = session.track(|| count.get() * 2)?;
/// count.set(5); // prints "stale"
/// ```
#[derive(Clone)]
pub struct Session {
    inner: Rc<SessionInner>,
    _handle: Rc<ReactiveHandle>,
}

impl Session {
    /// Create a session that calls `on_invalidate` when a tracked read changes.
    pub fn new<F>(label: impl Into<String>, on_invalidate: F) -> Self
    where
        F: Fn() + 'static,
    {
        let label: String = label.into();
        let inner = Rc::new(SessionInner {
            subscriber_id: SubscriberId::new(),
            label: Rc::from(label),
            on_invalidate: Box::new(on_invalidate),
            disposed: Cell::new(false),
            track_count: Cell::new(0),
        });
        let handle = Runtime::register(inner.clone());

        Self {
            inner,
            _handle: Rc::new(handle),
        }
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn subscriber_id(&self) -> SubscriberId {
        self.inner.subscriber_id
    }

    /// Run `f`, recording its reads as this session's new dependency set.
    ///
    /// Writes to signals are refused while `f` runs. If `f` attempted one,
    /// the reads are still recorded but the run fails.
    pub fn track<R>(&self, f: impl FnOnce() -> R) -> Result<R, ReactiveError> {
        if self.inner.disposed.get() {
            return Err(ReactiveError::SessionDisposed {
                label: self.inner.label.to_string(),
            });
        }

        let (result, reads, violation) = {
            let _ctx =
                ReactiveContext::enter_guarded(self.inner.subscriber_id, self.inner.label.clone());
            let result = f();
            (
                result,
                ReactiveContext::get_dependencies(),
                ReactiveContext::take_violation(),
            )
        };

        Runtime::set_dependencies(self.inner.subscriber_id, reads);
        self.inner.track_count.set(self.inner.track_count.get() + 1);
        tracing::trace!(
            label = %self.inner.label,
            dependencies = self.dependency_count(),
            "tracked run complete"
        );

        match violation {
            Some(signal) => Err(ReactiveError::MutationInTrackedScope {
                label: self.inner.label.to_string(),
                signal,
            }),
            None => Ok(result),
        }
    }

    /// Drop every dependency and stop delivering invalidations.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        Runtime::unregister(self.inner.subscriber_id);
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Number of distinct signals read during the last tracked run.
    pub fn dependency_count(&self) -> usize {
        Runtime::dependency_count(self.inner.subscriber_id)
    }

    /// Number of completed tracked runs.
    pub fn track_count(&self) -> usize {
        self.inner.track_count.get()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("label", &self.inner.label)
            .field("track_count", &self.track_count())
            .field("dependency_count", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

//! Reactive Context
//!
//! The reactive context tracks which computation is currently running.
//! This enables automatic dependency tracking: when a signal is read,
//! we can register the current computation as a dependent.
//!
//! # Implementation
//!
//! We use a thread-local stack to track the currently executing computation.
//! When entering a reactive context (e.g., a tracked render), we push a frame
//! onto the stack. When the computation completes, we pop it.
//!
//! Each frame also carries a write guard. While the innermost frame is
//! guarded, writes to signals are refused and the first refused write is
//! remembered on the frame so the owner of the frame can fail its run.
//! Guards belong to a single frame, so nested frames never leak a guard or
//! an exemption into one another.

use std::cell::RefCell;
use std::rc::Rc;

use smallvec::SmallVec;

use super::error::ReactiveError;
use super::signal::SignalId;
use super::SubscriberId;

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<ContextEntry>> = const { RefCell::new(Vec::new()) };
}

/// An entry in the reactive context stack.
#[derive(Debug)]
struct ContextEntry {
    /// The subscriber reads are attributed to. `None` for untracked frames.
    subscriber_id: Option<SubscriberId>,
    /// Label used when reporting a refused write.
    label: Option<Rc<str>>,
    /// Signals read during this frame, in read order, possibly repeated.
    dependencies: SmallVec<[SignalId; 8]>,
    /// Whether writes are refused in this frame.
    guarded: bool,
    /// Depth of `allow_mutations` calls active on this frame.
    exemptions: usize,
    /// The first signal whose write was refused.
    violation: Option<SignalId>,
}

impl ContextEntry {
    fn refuses_writes(&self) -> bool {
        self.guarded && self.exemptions == 0
    }
}

/// Guard that pops the context when dropped.
///
/// This ensures the context stack is properly maintained even if
/// the computation panics.
pub struct ReactiveContext {
    subscriber_id: Option<SubscriberId>,
}

impl ReactiveContext {
    /// Enter a new reactive context for the given subscriber.
    ///
    /// While this context is active, any signals that are read will
    /// register the subscriber as a dependent. Writes are allowed.
    pub fn enter(subscriber_id: SubscriberId) -> Self {
        Self::push(ContextEntry {
            subscriber_id: Some(subscriber_id),
            label: None,
            dependencies: SmallVec::new(),
            guarded: false,
            exemptions: 0,
            violation: None,
        })
    }

    /// Enter a reactive context that refuses signal writes.
    pub fn enter_guarded(subscriber_id: SubscriberId, label: Rc<str>) -> Self {
        Self::push(ContextEntry {
            subscriber_id: Some(subscriber_id),
            label: Some(label),
            dependencies: SmallVec::new(),
            guarded: true,
            exemptions: 0,
            violation: None,
        })
    }

    /// Enter a frame that records no reads.
    ///
    /// The frame inherits the write guard of the frame it sits on, so an
    /// untracked read inside a guarded render is still a pure read.
    pub fn enter_untracked() -> Self {
        let (guarded, label) = CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .map(|entry| (entry.refuses_writes(), entry.label.clone()))
                .unwrap_or((false, None))
        });
        Self::push(ContextEntry {
            subscriber_id: None,
            label,
            dependencies: SmallVec::new(),
            guarded,
            exemptions: 0,
            violation: None,
        })
    }

    fn push(entry: ContextEntry) -> Self {
        let subscriber_id = entry.subscriber_id;
        CONTEXT_STACK.with(|stack| stack.borrow_mut().push(entry));
        Self { subscriber_id }
    }

    /// Check if reads are currently being recorded.
    pub fn is_active() -> bool {
        Self::current_subscriber().is_some()
    }

    /// Get the current subscriber ID, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .and_then(|entry| entry.subscriber_id)
        })
    }

    /// Record a dependency on the given signal.
    ///
    /// This is called by signals when they are read.
    pub fn track_dependency(signal_id: SignalId) {
        CONTEXT_STACK.with(|stack| {
            if let Some(entry) = stack.borrow_mut().last_mut() {
                if entry.subscriber_id.is_some() {
                    entry.dependencies.push(signal_id);
                }
            }
        });
    }

    /// Get the dependencies collected in the current context.
    pub fn get_dependencies() -> Vec<SignalId> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .map(|entry| entry.dependencies.to_vec())
                .unwrap_or_default()
        })
    }

    /// Whether a write issued right now would be refused.
    pub fn is_write_guarded() -> bool {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .map(ContextEntry::refuses_writes)
                .unwrap_or(false)
        })
    }

    /// Ask permission to write `signal_id`.
    ///
    /// A refused write is remembered on the innermost frame. If that frame is
    /// untracked, the refusal is also pushed down to the guarded frame it
    /// inherited the guard from, which is the one whose run must fail.
    pub(crate) fn check_write(signal_id: SignalId) -> Result<(), ReactiveError> {
        CONTEXT_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            let refuses = stack
                .last()
                .map(ContextEntry::refuses_writes)
                .unwrap_or(false);
            if !refuses {
                return Ok(());
            }

            let mut label = None;
            for entry in stack.iter_mut().rev() {
                entry.violation.get_or_insert(signal_id);
                if label.is_none() {
                    label = entry.label.clone();
                }
                if entry.subscriber_id.is_some() {
                    break;
                }
            }

            Err(ReactiveError::MutationInTrackedScope {
                label: label.map(|l| l.to_string()).unwrap_or_default(),
                signal: signal_id,
            })
        })
    }

    /// Take the first refused write recorded on the current frame.
    pub fn take_violation() -> Option<SignalId> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow_mut()
                .last_mut()
                .and_then(|entry| entry.violation.take())
        })
    }

    fn adjust_exemptions(delta: isize) {
        CONTEXT_STACK.with(|stack| {
            if let Some(entry) = stack.borrow_mut().last_mut() {
                entry.exemptions = entry.exemptions.saturating_add_signed(delta);
            }
        });
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            if let Some(entry) = popped {
                debug_assert_eq!(
                    entry.subscriber_id, self.subscriber_id,
                    "ReactiveContext mismatch: expected {:?}, got {:?}",
                    self.subscriber_id, entry.subscriber_id
                );
            }
        });
    }
}

/// Run `f` without recording any signal reads.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let _ctx = ReactiveContext::enter_untracked();
    f()
}

/// Run `f` with the innermost frame's write guard lifted.
///
/// Only the current frame is affected: a tracked run started inside `f` is
/// guarded again.
pub fn allow_mutations<R>(f: impl FnOnce() -> R) -> R {
    struct Exemption;

    impl Drop for Exemption {
        fn drop(&mut self) {
            ReactiveContext::adjust_exemptions(-1);
        }
    }

    ReactiveContext::adjust_exemptions(1);
    let _exemption = Exemption;
    f()
}

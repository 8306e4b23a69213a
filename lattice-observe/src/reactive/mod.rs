//! Reactive Primitives
//!
//! This module implements the reactive tracker that views are observed
//! through: signals, tracking sessions, and batched updates.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal's value is read
//! within a tracking context, the read is recorded. When the signal's value
//! changes, every session that read it during its last run is invalidated.
//!
//! ## Sessions
//!
//! A Session is a subscription context. Each call to `track` records a fresh
//! dependency set, replacing the previous one, and forbids signal writes for
//! the duration of the call. The session's invalidation callback fires once
//! per change to that set; it is not re-armed until the session tracks again.
//!
//! ## Transactions
//!
//! Writes made inside `batch` are delivered together when the outermost
//! batch ends, so a session touched several times is invalidated once.
//!
//! # Implementation Notes
//!
//! The reactive system uses a thread-local tracking context to automatically
//! detect dependencies. When a signal is read, we check if there is an active
//! tracking context and, if so, record the read on it.
//!
//! This approach (sometimes called "automatic dependency tracking" or
//! "transparent reactivity") is used by SolidJS, Vue 3, MobX and Leptos.

mod context;
mod error;
mod runtime;
mod session;
mod signal;
mod subscriber;
mod transaction;

pub use context::{allow_mutations, untracked, ReactiveContext};
pub use error::ReactiveError;
pub use runtime::{Reactive, ReactiveHandle, Runtime};
pub use session::Session;
pub use signal::{Signal, SignalId};
pub use subscriber::SubscriberId;
pub use transaction::{batch, Transaction};

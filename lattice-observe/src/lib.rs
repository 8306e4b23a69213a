//! Lattice Observe
//!
//! This crate connects Lattice's fine-grained reactive tracker to a
//! retained-mode view runtime, so that a view re-renders exactly when the
//! reactive data it read during its last render changes.
//! It implements:
//!
//! - Reactive primitives (signals, tracking sessions, batches)
//! - A dependency graph with deduplicated change propagation
//! - A small view runtime (descriptors, instances, redraw scheduling)
//! - The observer integration that ties the two together
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Signals, tracking sessions and the thread-local tracker
//! - `graph`: Bipartite source/observer graph and pending-change scheduler
//! - `view`: View declarations, instances and the runtime that drives them
//! - `observer`: Staleness tracking and slot decoration for observed views
//! - `config`: Runtime configuration
//!
//! Everything is single-threaded. Reactive state lives in thread-locals and
//! is shared through `Rc`.
//!
//! # Example
//!
//! ```rust,ignore
//! use lattice_observe::{observer, Component, Signal, VNode, ViewRuntime};
//! use serde_json::json;
//!
//! let count = Signal::new(1);
//! let reader = count.clone();
//! let view = observer(
//!     Component::new(move |_| Ok(VNode::text(reader.get().to_string()))).into_view(),
//!     Some("Counter"),
//! );
//!
//! let runtime = ViewRuntime::default();
//! let instance = runtime.mount(&view, json!({}))?;
//! assert_eq!(instance.last_output().unwrap().to_string(), "1");
//!
//! count.set(2);
//! runtime.flush()?;
//! assert_eq!(instance.last_output().unwrap().to_string(), "2");
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod observer;
pub mod reactive;
pub mod view;

pub use config::{RedrawMode, RuntimeConfig};
pub use error::{Error, Result};
pub use observer::{observer, ObserverState};
pub use reactive::{allow_mutations, batch, untracked, Session, Signal};
pub use view::{Assessment, Component, Instance, InstanceId, VNode, View, ViewRuntime};

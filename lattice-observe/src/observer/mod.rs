//! Observer
//!
//! Makes a view re-render exactly when the reactive data it read during its
//! last render changes, and never otherwise.
//!
//! # How It Works
//!
//! [`observer`] wraps a view declaration so that every instance resolved from
//! it runs the hook installer at the start of `init`. The installer:
//!
//! 1. Attaches a tracking session to the instance.
//! 2. Replaces the render slot with a tracked render. Whatever the original
//!    render reads becomes the instance's dependency set; writes to signals
//!    fail the render. A completed render clears the instance's stale flag.
//! 3. Replaces the change-assessment slot with a gate that still calls the
//!    original assessment every time, but forces a render while the
//!    instance is stale.
//! 4. Wraps `will_unmount` so the session is disposed before the original
//!    hook runs.
//! 5. Installs a default `become_stale` hook (redraw through the runtime)
//!    unless one is configured, including an explicit opt-out.
//!
//! When a tracked read changes, the session marks the instance stale and
//! calls `become_stale` with the instance and its attrs. When and how the
//! redraw happens is up to the runtime's [`RedrawMode`](crate::config::RedrawMode).
//!
//! An instance reused after `will_unmount` without another `init` has no
//! session; its next render creates one before tracking.
//!
//! # Example
//!
//! ```rust,ignore
//! let count = Signal::new(0);
//! let view = observer(
//!     Component::new(move |_| Ok(VNode::text(count.get().to_string()))).into_view(),
//!     Some("Counter"),
//! );
//!
//! let runtime = ViewRuntime::default();
//! let instance = runtime.mount(&view, json!({}))?;
//! count.set(1);
//! runtime.flush()?; // renders "1"
//! ```

mod gate;
mod install;
mod session;
mod shape;
mod track;

pub use session::ObserverState;
pub use shape::{debug_label, ANONYMOUS_VIEW};

use crate::view::View;

/// Wrap `view` so its instances re-render when, and only when, the reactive
/// data they read changes.
///
/// `name` overrides the debug label used in logs and errors.
pub fn observer(view: View, name: Option<&str>) -> View {
    shape::wrap(view, name)
}

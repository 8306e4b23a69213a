//! Error types shared by the view runtime and the observer integration.

use thiserror::Error;

use crate::reactive::ReactiveError;
use crate::view::InstanceId;

/// Errors surfaced to whoever drives the view runtime.
#[derive(Debug, Error)]
pub enum Error {
    /// A tracking session was attached to an instance that already had one.
    /// A detach was skipped somewhere; this is a bug in the integration.
    #[error("view `{label}` already has a tracking session; an unmount was skipped")]
    SessionAlreadyAttached { label: String },

    /// A tracking session was detached from an instance that had none.
    #[error("view `{label}` has no tracking session to detach")]
    SessionNotAttached { label: String },

    /// The reactive tracker refused an operation, e.g. a write during render.
    #[error(transparent)]
    Reactive(#[from] ReactiveError),

    /// A render function reported a failure of its own.
    #[error("render failed: {0}")]
    Render(String),

    #[error("no instance with id {0}")]
    UnknownInstance(InstanceId),

    #[error("invalid runtime configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    /// Convenience constructor for render functions.
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render(message.into())
    }

    /// Whether this error means the session pairing invariant was broken.
    pub fn is_integration_bug(&self) -> bool {
        matches!(
            self,
            Self::SessionAlreadyAttached { .. } | Self::SessionNotAttached { .. }
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

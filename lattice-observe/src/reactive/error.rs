use thiserror::Error;

use super::signal::SignalId;

/// Errors raised by the reactive tracker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactiveError {
    /// A signal was written while a write-guarded tracked run was active.
    #[error("{signal} was written while tracking `{label}`; tracked runs may only read reactive state")]
    MutationInTrackedScope { label: String, signal: SignalId },

    /// `track` was called on a session after `dispose`.
    #[error("tracking session `{label}` was used after it was disposed")]
    SessionDisposed { label: String },
}

//! # Dispatcher Error Types
//!
//! Structured error handling for the dispatch system using thiserror
//! for typed errors instead of `Box<dyn Error>` patterns.

use crate::dispatcher::DispatchToken;
use thiserror::Error;

/// Every failure mode the dispatch system can surface.
///
/// All errors are raised synchronously to the immediate caller; nothing is
/// swallowed or retried. A failed dispatch pass leaves already-run callbacks
/// applied and skips the rest, but never leaves the dispatcher wedged.
#[derive(Error, Debug)]
pub enum DispatcherError {
    /// `dispatch` was called while another dispatch is in flight.
    #[error("Cannot dispatch in the middle of a dispatch")]
    ReentrantDispatch,

    /// `wait_for` was called with no dispatch in flight.
    #[error("wait_for: Must be invoked while dispatching")]
    OutsideDispatch,

    /// `wait_for` targeted a callback that is currently executing: a direct
    /// self-wait or a circular wait-for chain.
    #[error("wait_for: Circular dependency detected while waiting for `{token}`")]
    PendingCallback { token: DispatchToken },

    /// A token with no registered callback was passed to `wait_for` or
    /// `unregister`.
    #[error("`{token}` does not map to a registered callback")]
    UnregisteredToken { token: DispatchToken },

    /// A collaborating component was constructed with invalid arguments.
    #[error("Invariant violation: {message}")]
    InvariantViolation { message: String },

    /// A registered callback failed; propagated out of `dispatch`/`wait_for`
    /// and aborts the remainder of the current pass.
    #[error("Callback failed: {0}")]
    Callback(#[from] anyhow::Error),
}

impl DispatcherError {
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DispatcherError>;

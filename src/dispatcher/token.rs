//! Dispatch token generation.
//!
//! Tokens are opaque, monotonically increasing identifiers handed out by
//! [`Dispatcher::register`](crate::Dispatcher::register). They are never
//! reused for the lifetime of a dispatcher, even after `unregister`, which
//! also means an ordered map keyed by token iterates in registration order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle identifying one registered callback.
///
/// A newtype rather than a raw integer so tokens cannot be confused with
/// payload data or fabricated from arbitrary numbers outside this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DispatchToken(u64);

impl fmt::Display for DispatchToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID_{}", self.0)
    }
}

/// Monotonic token source owned by a dispatcher instance.
#[derive(Debug, Default)]
pub(crate) struct TokenGenerator {
    last_id: u64,
}

impl TokenGenerator {
    pub(crate) fn next_token(&mut self) -> DispatchToken {
        self.last_id += 1;
        DispatchToken(self.last_id)
    }
}

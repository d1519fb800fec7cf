//! # Dispatcher
//!
//! Synchronous action dispatch with dependency resolution.
//!
//! The dispatcher owns an insertion-ordered registry of callbacks and, for
//! the duration of one `dispatch` call, a per-token phase machine that lets
//! any callback wait for others to finish first. See [`Dispatcher`] for the
//! full contract.

mod core;
mod token;

pub use self::core::{ActionCallback, Dispatcher};
pub use self::token::DispatchToken;

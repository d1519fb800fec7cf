#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Flux Dispatch
//!
//! Synchronous intra-process action dispatch with dependency resolution.
//!
//! ## Overview
//!
//! A [`Dispatcher`] broadcasts actions to a dynamic set of registered
//! callbacks in registration order. Any callback can call
//! [`Dispatcher::wait_for`] to require other callbacks to finish first within
//! the same dispatch, turning independently registered listeners into a
//! deterministically ordered, cycle-safe execution DAG — re-evaluated on
//! every dispatch, with no persistent schedule.
//!
//! ## Key Features
//!
//! - **Registration-order delivery**: without `wait_for`, callbacks run in
//!   exactly the order they registered, each exactly once per dispatch
//! - **`wait_for` dependency edges**: declared lazily during execution,
//!   cycle-checked in O(1) per edge via a pending flag
//! - **Strictly synchronous**: one logical flow of control, no queues, no
//!   deferred delivery; nested dispatch is rejected outright
//! - **Store layer**: [`ReduceStore`] folds actions into derived state and
//!   fires change listeners from inside its callback; [`StoreGroup`] treats
//!   N stores as one unit that fires after all members have updated
//!
//! ## Module Organization
//!
//! - [`dispatcher`] - The dispatch engine and token bookkeeping
//! - [`store`] - Reducer-driven stores and store groups
//! - [`error`] - Structured error handling
//! - [`logging`] - Tracing subscriber bootstrap for embedders
//!
//! ## Quick Start
//!
//! ```rust
//! use flux_dispatch::Dispatcher;
//! use serde_json::{json, Value};
//!
//! let dispatcher: Dispatcher<Value> = Dispatcher::new();
//!
//! let flights = dispatcher.register(|_, _action| {
//!     // update flight prices from the action
//!     Ok(())
//! });
//!
//! dispatcher.register(move |d, _action| {
//!     d.wait_for(&[flights])?; // price totals need updated flight prices
//!     Ok(())
//! });
//!
//! dispatcher.dispatch(json!({"type": "country-update", "selected": "australia"}))?;
//! # Ok::<(), flux_dispatch::DispatcherError>(())
//! ```
//!
//! ## Concurrency
//!
//! The dispatcher assumes one logical thread of control per dispatch. It is
//! `Send + Sync` so hosts may share an `Arc<Dispatcher<A>>`, and the
//! reentrancy flag serializes `dispatch` attempts, but the intended
//! deployment is confinement to a single event-loop style thread.

pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod store;

pub use dispatcher::{ActionCallback, DispatchToken, Dispatcher};
pub use error::{DispatcherError, Result};
pub use logging::init_logging;
pub use store::{ListenerToken, ReduceStore, Store, StoreGroup};

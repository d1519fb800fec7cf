//! # Dispatcher Core
//!
//! The dispatch engine: an insertion-ordered registry of callbacks plus the
//! per-pass state machine that drives `wait_for` dependency resolution.
//!
//! ## Overview
//!
//! `Dispatcher<A>` broadcasts each action to every registered callback in
//! registration order. During one pass a callback may call
//! [`Dispatcher::wait_for`] to pull other callbacks ahead of itself; the
//! per-token [`CallbackPhase`] machine makes that re-entrant invocation safe,
//! detects cycles in O(1) per edge, and guarantees each callback runs at most
//! once per pass.
//!
//! ## Key Features
//!
//! - **Registration-order delivery** with `wait_for` as the only override
//! - **Cycle detection** via the `Pending` phase flag, no dependency graph
//! - **Reentrancy guard** rejecting nested `dispatch` calls
//! - **Failure isolation**: a failing callback aborts the pass but never
//!   wedges the dispatcher
//!
//! ## Usage
//!
//! ```rust
//! use flux_dispatch::Dispatcher;
//! use serde_json::{json, Value};
//!
//! let dispatcher: Dispatcher<Value> = Dispatcher::new();
//!
//! let token = dispatcher.register(|_, action| {
//!     println!("received {action}");
//!     Ok(())
//! });
//!
//! dispatcher.register(move |d, _| {
//!     d.wait_for(&[token])?; // runs after the first callback
//!     Ok(())
//! });
//!
//! dispatcher.dispatch(json!({"type": "ping"}))?;
//! # Ok::<(), flux_dispatch::DispatcherError>(())
//! ```

use crate::dispatcher::token::{DispatchToken, TokenGenerator};
use crate::error::{DispatcherError, Result};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Boxed callback as stored in the registry. The dispatcher hands itself to
/// the callback so `wait_for` needs no captured handle back to the owner.
pub type ActionCallback<A> = Box<dyn FnMut(&Dispatcher<A>, &A) -> Result<()> + Send>;

/// Where a callback stands within the current dispatch pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallbackPhase {
    /// Not yet invoked for this pass.
    Waiting,
    /// Currently executing; its frame is on the call stack of this pass.
    /// Waiting on a `Pending` callback is by definition a cycle.
    Pending,
    /// Completed for this pass; further waits are no-ops.
    Handled,
}

/// Insertion-ordered callback registry. Tokens are monotonic, so a `BTreeMap`
/// keyed by token iterates in registration order.
struct Registry<A: 'static> {
    callbacks: BTreeMap<DispatchToken, Arc<Mutex<ActionCallback<A>>>>,
    tokens: TokenGenerator,
}

/// Mutable state scoped to one in-flight dispatch. `payload` and the phase
/// map carry meaning only while `dispatching` is true; both are rebuilt at
/// the start of every pass.
struct DispatchState<A> {
    dispatching: bool,
    payload: Option<Arc<A>>,
    phases: HashMap<DispatchToken, CallbackPhase>,
}

/// Synchronous action dispatcher.
///
/// Every lock is released before user code runs, so callbacks are free to
/// call `register`, `unregister` and `wait_for` on the dispatcher they were
/// handed. Nested `dispatch` calls are rejected with
/// [`DispatcherError::ReentrantDispatch`].
pub struct Dispatcher<A: 'static> {
    registry: Mutex<Registry<A>>,
    state: Mutex<DispatchState<A>>,
}

impl<A: 'static> Default for Dispatcher<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: 'static> Dispatcher<A> {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(Registry {
                callbacks: BTreeMap::new(),
                tokens: TokenGenerator::default(),
            }),
            state: Mutex::new(DispatchState {
                dispatching: false,
                payload: None,
                phases: HashMap::new(),
            }),
        }
    }

    /// Register a callback to be invoked with every dispatched action.
    /// Returns a token usable with [`wait_for`](Self::wait_for) and
    /// [`unregister`](Self::unregister).
    ///
    /// Registration during an in-flight dispatch is allowed, but the new
    /// callback only joins the top-level loop of the *next* dispatch (a
    /// `wait_for` naming it in the current pass still runs it on demand).
    pub fn register<F>(&self, callback: F) -> DispatchToken
    where
        F: FnMut(&Dispatcher<A>, &A) -> Result<()> + Send + 'static,
    {
        let mut registry = self.registry.lock();
        let token = registry.tokens.next_token();
        registry
            .callbacks
            .insert(token, Arc::new(Mutex::new(Box::new(callback))));
        debug!(token = %token, registered = registry.callbacks.len(), "Registered dispatch callback");
        token
    }

    /// Remove the callback registered under `token`.
    ///
    /// During an in-flight dispatch the callback is removed from future
    /// passes only; phase bookkeeping already captured for the current pass
    /// is untouched.
    pub fn unregister(&self, token: DispatchToken) -> Result<()> {
        let mut registry = self.registry.lock();
        match registry.callbacks.remove(&token) {
            Some(_) => {
                debug!(token = %token, registered = registry.callbacks.len(), "Unregistered dispatch callback");
                Ok(())
            }
            None => Err(DispatcherError::UnregisteredToken { token }),
        }
    }

    /// Dispatch `payload` to every registered callback in registration order.
    ///
    /// Fails with [`DispatcherError::ReentrantDispatch`] when called from
    /// inside a callback. A callback error aborts the remainder of the pass
    /// and propagates to the caller; the dispatcher itself stays usable and
    /// a subsequent dispatch starts from a clean slate.
    pub fn dispatch(&self, payload: A) -> Result<()> {
        let snapshot: Vec<DispatchToken> = {
            let registry = self.registry.lock();
            registry.callbacks.keys().copied().collect()
        };

        {
            let mut state = self.state.lock();
            if state.dispatching {
                return Err(DispatcherError::ReentrantDispatch);
            }
            state.dispatching = true;
            state.payload = Some(Arc::new(payload));
            state.phases.clear();
            for token in &snapshot {
                state.phases.insert(*token, CallbackPhase::Waiting);
            }
        }
        debug!(callbacks = snapshot.len(), "Dispatch pass started");

        // Clears the guard flag and payload on every exit path, including
        // callback errors and panics, so a failed pass cannot wedge us.
        let _guard = DispatchGuard { dispatcher: self };

        for token in snapshot {
            let phase = {
                let state = self.state.lock();
                state
                    .phases
                    .get(&token)
                    .copied()
                    .unwrap_or(CallbackPhase::Waiting)
            };
            if phase != CallbackPhase::Waiting {
                trace!(token = %token, ?phase, "Skipping callback already run via wait_for");
                continue;
            }
            self.invoke_callback(token)?;
        }

        debug!("Dispatch pass completed");
        Ok(())
    }

    /// Block until every callback named in `tokens` has completed for the
    /// current pass, invoking any that have not yet run.
    ///
    /// Only callable from inside a callback of the current dispatch. Tokens
    /// are resolved in the given order; a token whose callback is already
    /// handled is skipped, a currently-pending token is a dependency cycle.
    pub fn wait_for(&self, tokens: &[DispatchToken]) -> Result<()> {
        if !self.is_dispatching() {
            return Err(DispatcherError::OutsideDispatch);
        }

        for &token in tokens {
            let phase = {
                let state = self.state.lock();
                state
                    .phases
                    .get(&token)
                    .copied()
                    .unwrap_or(CallbackPhase::Waiting)
            };
            match phase {
                CallbackPhase::Pending => {
                    return Err(DispatcherError::PendingCallback { token });
                }
                CallbackPhase::Handled => {
                    trace!(token = %token, "wait_for target already handled");
                }
                CallbackPhase::Waiting => {
                    let registered = self.registry.lock().callbacks.contains_key(&token);
                    if !registered {
                        return Err(DispatcherError::UnregisteredToken { token });
                    }
                    trace!(token = %token, "wait_for invoking dependency");
                    self.invoke_callback(token)?;
                }
            }
        }
        Ok(())
    }

    /// Whether a dispatch pass is currently executing.
    pub fn is_dispatching(&self) -> bool {
        self.state.lock().dispatching
    }

    /// Number of currently registered callbacks.
    pub fn callback_count(&self) -> usize {
        self.registry.lock().callbacks.len()
    }

    /// Run one callback for the current pass: mark it `Pending`, call it with
    /// the in-flight payload, mark it `Handled` whether it succeeded or not,
    /// then propagate its result.
    fn invoke_callback(&self, token: DispatchToken) -> Result<()> {
        let callback = {
            let registry = self.registry.lock();
            registry.callbacks.get(&token).cloned()
        };
        let Some(callback) = callback else {
            // Unregistered after the pass snapshot was taken; nothing to run.
            trace!(token = %token, "Callback unregistered mid-pass, skipping");
            return Ok(());
        };

        let payload = {
            let mut state = self.state.lock();
            let Some(payload) = state.payload.clone() else {
                return Err(DispatcherError::OutsideDispatch);
            };
            state.phases.insert(token, CallbackPhase::Pending);
            payload
        };

        // The per-callback mutex is held across the call. Re-invocation of a
        // pending callback is impossible (the phase check errors first), so
        // this cannot self-deadlock.
        let result = {
            let mut cb = callback.lock();
            (*cb)(self, payload.as_ref())
        };

        {
            let mut state = self.state.lock();
            state.phases.insert(token, CallbackPhase::Handled);
        }

        if let Err(ref error) = result {
            debug!(token = %token, %error, "Callback failed, aborting dispatch pass");
        }
        result
    }
}

impl<A: 'static> fmt::Debug for Dispatcher<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("callbacks", &self.callback_count())
            .field("dispatching", &self.is_dispatching())
            .finish()
    }
}

/// Resets the in-flight dispatch state when the pass unwinds, normally or
/// otherwise.
struct DispatchGuard<'a, A: 'static> {
    dispatcher: &'a Dispatcher<A>,
}

impl<A: 'static> Drop for DispatchGuard<'_, A> {
    fn drop(&mut self) {
        let mut state = self.dispatcher.state.lock();
        state.dispatching = false;
        state.payload = None;
    }
}

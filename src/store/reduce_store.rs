//! # ReduceStore
//!
//! A store whose state is derived by reducing dispatched actions.
//!
//! ## Overview
//!
//! `ReduceStore` registers one dispatcher callback that folds each action
//! into the current state via a pure reducer. When the reduced state differs
//! from the previous one, every change listener fires — synchronously,
//! inside the dispatch callback. Equal states produce no notification, but
//! the callback itself still ran and still participates in `wait_for`
//! ordering.
//!
//! ## Usage
//!
//! ```rust
//! use flux_dispatch::{Dispatcher, ReduceStore};
//! use std::sync::Arc;
//!
//! let dispatcher: Arc<Dispatcher<i64>> = Arc::new(Dispatcher::new());
//! let counter = ReduceStore::new(Arc::clone(&dispatcher), 0i64, |state, action| {
//!     state + action
//! });
//!
//! counter.add_listener(|state| println!("counter is now {state}"));
//! dispatcher.dispatch(5)?;
//! assert_eq!(counter.state(), 5);
//! # Ok::<(), flux_dispatch::DispatcherError>(())
//! ```

use crate::dispatcher::{DispatchToken, Dispatcher};
use crate::store::Store;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Change listener as stored by the store; receives the post-reduction state.
pub type ChangeListener<S> = Box<dyn FnMut(&S) + Send>;

/// Handle identifying one registered change listener. Listener tokens follow
/// the same monotonic never-reused discipline as dispatch tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerToken(u64);

/// State plus listener registry shared between the store handle and its
/// dispatcher callback. State and listeners sit behind separate locks so a
/// listener reading `state()` does not deadlock against notification.
struct StoreShared<S: 'static> {
    state: Mutex<S>,
    listeners: Mutex<ListenerRegistry<S>>,
}

struct ListenerRegistry<S: 'static> {
    listeners: BTreeMap<ListenerToken, Arc<Mutex<ChangeListener<S>>>>,
    last_id: u64,
}

impl<S: Clone + 'static> StoreShared<S> {
    fn notify(&self) {
        let state = self.state.lock().clone();
        let snapshot: Vec<_> = {
            let registry = self.listeners.lock();
            registry.listeners.values().cloned().collect()
        };
        trace!(listeners = snapshot.len(), "Store state changed, notifying");
        for listener in snapshot {
            let mut listener = listener.lock();
            (*listener)(&state);
        }
    }
}

/// A reducer-driven store registered with one dispatcher.
pub struct ReduceStore<S: 'static, A: 'static> {
    dispatcher: Arc<Dispatcher<A>>,
    token: DispatchToken,
    shared: Arc<StoreShared<S>>,
}

impl<S, A: 'static> ReduceStore<S, A>
where
    S: Clone + PartialEq + Send + 'static,
{
    /// Create a store with `initial` state and register its reducing
    /// callback with `dispatcher`.
    ///
    /// The reducer must be pure: given the current state and an action it
    /// returns the next state and nothing else. Side effects belong in
    /// change listeners.
    pub fn new<R>(dispatcher: Arc<Dispatcher<A>>, initial: S, mut reducer: R) -> Self
    where
        R: FnMut(&S, &A) -> S + Send + 'static,
    {
        let shared = Arc::new(StoreShared {
            state: Mutex::new(initial),
            listeners: Mutex::new(ListenerRegistry {
                listeners: BTreeMap::new(),
                last_id: 0,
            }),
        });

        let callback_shared = Arc::clone(&shared);
        let token = dispatcher.register(move |_, action| {
            let changed = {
                let mut state = callback_shared.state.lock();
                let next = reducer(&state, action);
                if next == *state {
                    false
                } else {
                    *state = next;
                    true
                }
            };
            if changed {
                callback_shared.notify();
            }
            Ok(())
        });
        debug!(token = %token, "ReduceStore registered");

        Self {
            dispatcher,
            token,
            shared,
        }
    }

    /// Current state of the store.
    pub fn state(&self) -> S {
        self.shared.state.lock().clone()
    }

    /// Register a listener fired after every state change, with the new
    /// state. Listeners run inside the dispatch callback that produced the
    /// change.
    pub fn add_listener<F>(&self, listener: F) -> ListenerToken
    where
        F: FnMut(&S) + Send + 'static,
    {
        let mut registry = self.shared.listeners.lock();
        registry.last_id += 1;
        let token = ListenerToken(registry.last_id);
        registry
            .listeners
            .insert(token, Arc::new(Mutex::new(Box::new(listener))));
        token
    }

    /// Remove a previously added listener. Returns whether a listener was
    /// registered under `token`.
    pub fn remove_listener(&self, token: ListenerToken) -> bool {
        self.shared.listeners.lock().listeners.remove(&token).is_some()
    }
}

impl<S: 'static, A: 'static> Store<A> for ReduceStore<S, A> {
    fn dispatch_token(&self) -> DispatchToken {
        self.token
    }

    fn dispatcher(&self) -> &Arc<Dispatcher<A>> {
        &self.dispatcher
    }
}

impl<S: 'static, A: 'static> fmt::Debug for ReduceStore<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReduceStore")
            .field("token", &self.token)
            .field("listeners", &self.shared.listeners.lock().listeners.len())
            .finish()
    }
}

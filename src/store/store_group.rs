//! # StoreGroup
//!
//! Executes one callback on every dispatch after waiting for each member
//! store, so a batch of stores can be observed as a single unit that only
//! fires once all members have updated.

use crate::dispatcher::{DispatchToken, Dispatcher};
use crate::error::{DispatcherError, Result};
use crate::store::Store;
use std::sync::Arc;
use tracing::debug;

/// One registered callback covering a batch of stores.
///
/// The group's callback body is `wait_for(member tokens)` followed by the
/// aggregate notification, which gives the notification a happens-after
/// relationship with every member's reduction for the same action.
#[derive(Debug)]
pub struct StoreGroup<A: 'static> {
    dispatcher: Arc<Dispatcher<A>>,
    token: DispatchToken,
}

impl<A: 'static> StoreGroup<A> {
    /// Register a group over `stores`, firing `callback` once per dispatch
    /// after every member store has handled the action.
    ///
    /// Fails with [`DispatcherError::InvariantViolation`] when `stores` is
    /// empty or the stores are not all registered with the same dispatcher.
    pub fn new<F>(stores: &[&dyn Store<A>], mut callback: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let dispatcher = uniform_dispatcher(stores)?;
        let member_tokens: Vec<DispatchToken> =
            stores.iter().map(|store| store.dispatch_token()).collect();

        let token = dispatcher.register(move |d, _| {
            d.wait_for(&member_tokens)?;
            callback();
            Ok(())
        });
        debug!(token = %token, members = stores.len(), "StoreGroup registered");

        Ok(Self { dispatcher, token })
    }

    /// Token of the group's own callback, usable as a `wait_for` target.
    pub fn dispatch_token(&self) -> DispatchToken {
        self.token
    }

    /// Unregister the group's callback from the dispatcher.
    pub fn release(&self) -> Result<()> {
        self.dispatcher.unregister(self.token)
    }
}

/// Validate that every store shares one dispatcher and return it.
fn uniform_dispatcher<A: 'static>(stores: &[&dyn Store<A>]) -> Result<Arc<Dispatcher<A>>> {
    let Some(first) = stores.first() else {
        return Err(DispatcherError::invariant(
            "Must provide at least one store to StoreGroup",
        ));
    };
    let dispatcher = first.dispatcher();
    for store in stores {
        if !Arc::ptr_eq(store.dispatcher(), dispatcher) {
            return Err(DispatcherError::invariant(
                "All stores in a StoreGroup must use the same dispatcher",
            ));
        }
    }
    Ok(Arc::clone(dispatcher))
}

//! # Stores
//!
//! Dispatcher clients that hold derived state.
//!
//! ## Overview
//!
//! A store wraps exactly one [`Dispatcher::register`](crate::Dispatcher::register)
//! call: its callback reduces each action into the store's state and fires
//! the store's own change listeners from inside that callback, never outside
//! a dispatch. [`StoreGroup`] aggregates several stores into a single
//! callback that waits for every member before firing one notification, so a
//! consumer can treat N stores as one unit that is only observed in a
//! consistent state.

mod reduce_store;
mod store_group;

pub use reduce_store::{ChangeListener, ListenerToken, ReduceStore};
pub use store_group::StoreGroup;

use crate::dispatcher::{DispatchToken, Dispatcher};
use std::sync::Arc;

/// Minimum surface a dispatcher client must expose to participate in a
/// [`StoreGroup`]: its registration token and the dispatcher it registered
/// with.
pub trait Store<A: 'static> {
    /// Token returned by the store's single `register` call.
    fn dispatch_token(&self) -> DispatchToken;

    /// The dispatcher this store is registered with.
    fn dispatcher(&self) -> &Arc<Dispatcher<A>>;
}

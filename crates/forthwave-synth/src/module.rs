//! Wiring between module state and a [`Runtime`].
//!
//! A module's state lives in one [`Shared`] cell. Its natives and its ticker
//! each hold a clone and lock it for the duration of one call. Both only ever
//! run on the audio thread under the scheduler lock, so these locks are
//! uncontended in practice.

use forthwave_core::{Runtime, Stack, StackError};
use parking_lot::Mutex;
use std::sync::Arc;

/// Module state shared between its natives and its ticker.
pub type Shared<T> = Arc<Mutex<T>>;

/// State advanced once per sample, before the program runs.
pub trait Tick: Send + 'static {
    /// Advance by one sample.
    fn tick(&mut self);
}

/// Wrap `state` for sharing without registering a ticker.
pub fn share<T>(state: T) -> Shared<T> {
    Arc::new(Mutex::new(state))
}

/// Wrap `state` and register its ticker.
pub fn attach<T: Tick>(runtime: &Runtime, state: T) -> Shared<T> {
    let shared = share(state);
    let ticking = Arc::clone(&shared);
    runtime.register_tick(move || ticking.lock().tick());
    shared
}

/// Register a native that operates on `state`.
pub fn native<T, F>(runtime: &Runtime, name: impl Into<String>, state: &Shared<T>, f: F)
where
    T: Send + 'static,
    F: Fn(&mut T, &mut Stack) -> Result<(), StackError> + Send + Sync + 'static,
{
    let state = Arc::clone(state);
    runtime.register(name, move |stack| f(&mut state.lock(), stack));
}

//! Runtime parameter control engine.
//!
//! ```text
//!  control listener ──▶ SharedRuntime::dispatch ──▶ dispatcher ──▶ RuntimeStore
//!  session loop     ──▶ SharedRuntime::params_for_tick ─────────▶ convergence
//!  status endpoint  ──▶ SharedRuntime::snapshot
//! ```
//!
//! [`RuntimeStore`] is single-owner; [`SharedRuntime`] wraps one store in
//! an `Arc<Mutex<_>>` so the listener thread and the tick loop serialise on
//! the same lock.  Several independent runtimes can coexist (tests do).

pub mod bus;
pub mod capability;
pub mod convergence;
pub mod dispatcher;
pub mod events;
pub mod limits;
pub mod modes;
pub mod params;
pub mod store;

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use bus::{SubscriptionId, Topic};
pub use capability::CapabilitySet;
pub use dispatcher::{CommandOutcome, WireCommand};
pub use events::{ChangeEvent, EventKind};
pub use modes::Mode;
pub use params::{Param, ParamSet};
pub use store::{RuntimeSnapshot, RuntimeStore};

use crate::app::ports::Clock;
use crate::error::CommandError;
use bus::EventSubscriber;

/// Cloneable handle to one runtime store.
#[derive(Clone)]
pub struct SharedRuntime {
    inner: Arc<Mutex<RuntimeStore>>,
    clock: Arc<dyn Clock>,
}

impl SharedRuntime {
    pub fn new(mode: Mode, capabilities: CapabilitySet, clock: Arc<dyn Clock>) -> Self {
        Self::from_store(RuntimeStore::new(mode, capabilities, clock))
    }

    pub fn from_store(store: RuntimeStore) -> Self {
        let clock = store.clock();
        Self {
            inner: Arc::new(Mutex::new(store)),
            clock,
        }
    }

    /// Validate `cmd` outside the lock, then apply it under the lock.
    pub fn dispatch(&self, cmd: &WireCommand) -> Result<CommandOutcome, CommandError> {
        let accepted_at = self.clock.now();
        let validated = cmd.validate()?;
        dispatcher::apply(&mut *self.lock(), validated, accepted_at)
    }

    pub fn snapshot(&self) -> RuntimeSnapshot {
        self.lock().snapshot()
    }

    /// Advance convergence and return the applied parameters.
    pub fn params_for_tick(&self, elapsed_ms: i64) -> ParamSet {
        self.lock().params_for_tick(elapsed_ms)
    }

    /// Register a change subscriber.  Subscribers run while the store lock
    /// is held and must not call back into this runtime; doing so fails that
    /// delivery with a [`SubscriberError`](crate::error::SubscriberError)
    /// instead of deadlocking.
    pub fn subscribe(
        &self,
        topic: impl Into<Topic>,
        subscriber: impl EventSubscriber + 'static,
    ) -> SubscriptionId {
        self.lock().subscribe(topic, subscriber)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.lock().unsubscribe(id)
    }

    /// Run `f` with exclusive access to the store.
    pub fn with_store<R>(&self, f: impl FnOnce(&mut RuntimeStore) -> R) -> R {
        f(&mut *self.lock())
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    // Poisoning only follows a panic inside the store itself; every
    // mutation commits in a single assignment pass, so the state is whole.
    //
    // Re-entry from the same thread panics before touching the mutex.  The
    // bus catches that panic and reports it as a failed delivery.
    fn lock(&self) -> StoreGuard<'_> {
        let key = Arc::as_ptr(&self.inner) as usize;
        let reentered = LOCKED.with(|held| held.borrow().contains(&key));
        if reentered {
            panic!("runtime re-entered while its lock is held on this thread");
        }
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        LOCKED.with(|held| held.borrow_mut().push(key));
        StoreGuard { guard, key }
    }
}

thread_local! {
    /// Runtimes whose lock the current thread holds.
    static LOCKED: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

struct StoreGuard<'a> {
    guard: MutexGuard<'a, RuntimeStore>,
    key: usize,
}

impl Deref for StoreGuard<'_> {
    type Target = RuntimeStore;

    fn deref(&self) -> &RuntimeStore {
        &self.guard
    }
}

impl DerefMut for StoreGuard<'_> {
    fn deref_mut(&mut self) -> &mut RuntimeStore {
        &mut self.guard
    }
}

impl Drop for StoreGuard<'_> {
    fn drop(&mut self) {
        LOCKED.with(|held| {
            let mut held = held.borrow_mut();
            if let Some(pos) = held.iter().rposition(|k| *k == self.key) {
                held.swap_remove(pos);
            }
        });
    }
}

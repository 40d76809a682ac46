use std::{
    convert::Infallible,
    fmt,
    sync::{
        Arc, Condvar, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use scopeguard::ScopeGuard;
use tracing::trace;

use crate::{geom::Expanse, invalidate::InvalidationReason};

/// State behind the cache lock.
struct Slot<T> {
    /// The last rendered value.
    value: Option<Arc<T>>,
    /// Dimensions `value` was rendered at.
    dims: Expanse,
    /// False after an invalidation, until the next completed render.
    valid: bool,
    /// Bumped by every invalidation.
    generation: u64,
    /// True while one caller is running the factory.
    computing: bool,
    /// Reason given to the most recent invalidation.
    last_reason: Option<InvalidationReason>,
}

/// A per-node cache of rendered content.
///
/// The cache is safe to share between threads. Concurrent requests for the
/// same entry are single-flight: one caller runs the factory and the others
/// block until it finishes, then reuse its result. An invalidation that lands
/// while a render is in progress wins: the in-flight result is handed to its
/// caller but not stored as valid, so the next request renders again.
pub struct RenderCache<T> {
    /// Cached value and bookkeeping.
    slot: Mutex<Slot<T>>,
    /// Signalled whenever a render finishes or is abandoned.
    ready: Condvar,
    /// Number of factory invocations that completed.
    renders: AtomicU64,
}

impl<T> Default for RenderCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for RenderCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.lock();
        f.debug_struct("RenderCache")
            .field("dims", &slot.dims)
            .field("valid", &slot.valid)
            .field("generation", &slot.generation)
            .finish_non_exhaustive()
    }
}

impl<T> RenderCache<T> {
    /// An empty cache.
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                value: None,
                dims: Expanse::ZERO,
                valid: false,
                generation: 0,
                computing: false,
                last_reason: None,
            }),
            ready: Condvar::new(),
            renders: AtomicU64::new(0),
        }
    }

    /// Lock the slot. A panic inside a factory never happens under the lock,
    /// so a poisoned lock still holds consistent state.
    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached value for `dims`, rendering it with `factory` if the
    /// entry is missing, invalid, or was rendered at other dimensions.
    pub fn get_or_render(&self, dims: Expanse, factory: impl FnOnce() -> T) -> Arc<T> {
        match self.try_get_or_render(dims, || Ok::<T, Infallible>(factory())) {
            Ok(v) => v,
            Err(e) => match e {},
        }
    }

    /// As [`get_or_render`](Self::get_or_render), with a fallible factory.
    /// A failed render stores nothing and wakes any waiters so one of them
    /// can try again.
    pub fn try_get_or_render<E>(
        &self,
        dims: Expanse,
        factory: impl FnOnce() -> Result<T, E>,
    ) -> Result<Arc<T>, E> {
        let mut slot = self.lock();
        loop {
            if slot.valid
                && slot.dims == dims
                && let Some(v) = &slot.value
            {
                return Ok(Arc::clone(v));
            }
            if !slot.computing {
                break;
            }
            slot = self
                .ready
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
        slot.computing = true;
        let generation = slot.generation;
        drop(slot);

        // Release the slot if the factory unwinds.
        let abandon = scopeguard::guard((), |()| {
            self.lock().computing = false;
            self.ready.notify_all();
        });
        let rendered = factory();
        ScopeGuard::into_inner(abandon);
        self.renders.fetch_add(1, Ordering::Relaxed);

        let mut slot = self.lock();
        slot.computing = false;
        let out = rendered.map(|v| {
            let v = Arc::new(v);
            if slot.generation == generation {
                slot.value = Some(Arc::clone(&v));
                slot.dims = dims;
                slot.valid = true;
            } else {
                trace!("render cache invalidated mid-render, result not stored");
            }
            v
        });
        drop(slot);
        self.ready.notify_all();
        out
    }

    /// Mark the entry stale.
    pub fn invalidate(&self, reason: InvalidationReason) {
        let mut slot = self.lock();
        slot.valid = false;
        slot.generation = slot.generation.wrapping_add(1);
        slot.last_reason = Some(reason);
    }

    /// True if a request at `dims` would be served without rendering.
    pub fn is_valid_for(&self, dims: Expanse) -> bool {
        let slot = self.lock();
        slot.valid && slot.dims == dims && slot.value.is_some()
    }

    /// Number of completed factory calls.
    pub fn renders(&self) -> u64 {
        self.renders.load(Ordering::Relaxed)
    }

    /// Number of invalidations seen.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Reason given to the most recent invalidation.
    pub fn last_reason(&self) -> Option<InvalidationReason> {
        self.lock().last_reason
    }
}

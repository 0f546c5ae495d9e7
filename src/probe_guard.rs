//! Debug-only guard against reentering a table from key callbacks.
//!
//! Probing calls into the key binding (`hash_key`/`keys_equal`). If that
//! code reaches back into the same table while a probe or resize is in
//! flight, the table may be observed half-updated. Debug builds panic on
//! the nested entry; release builds compile the guard away.

use core::cell::Cell;
use core::marker::PhantomData;

#[derive(Debug)]
pub struct ProbeGuard {
    #[cfg(debug_assertions)]
    active: Cell<bool>,
    // The table is single-threaded; keep the guard !Sync.
    _not_sync: PhantomData<Cell<()>>,
}

impl ProbeGuard {
    pub const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(false),
            _not_sync: PhantomData,
        }
    }

    /// Mark a probe as in flight until the returned scope drops.
    #[inline]
    pub fn enter(&self) -> ProbeScope<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.active.replace(true),
                "table reentered from a key binding during a probe"
            );
            return ProbeScope { guard: self };
        }

        #[cfg(not(debug_assertions))]
        {
            return ProbeScope { _lt: PhantomData };
        }
    }
}

impl Default for ProbeGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ProbeGuard {
    // A cloned table starts with no probe in flight.
    fn clone(&self) -> Self {
        Self::new()
    }
}

pub struct ProbeScope<'a> {
    #[cfg(debug_assertions)]
    guard: &'a ProbeGuard,
    #[cfg(not(debug_assertions))]
    _lt: PhantomData<&'a ()>,
}

impl Drop for ProbeScope<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.guard.active.set(false);
    }
}

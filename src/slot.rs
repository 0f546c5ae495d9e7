//! Slot array storage.

use crate::error::TableError;

/// One storage cell. Exactly one state at a time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Slot<K, V> {
    Empty,
    /// Left behind by a removal; probes continue past it.
    Tombstone,
    Occupied(K, V),
}

impl<K, V> Slot<K, V> {
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    #[inline]
    pub fn is_tombstone(&self) -> bool {
        matches!(self, Slot::Tombstone)
    }

    #[inline]
    pub fn is_occupied(&self) -> bool {
        matches!(self, Slot::Occupied(..))
    }

    /// Replace the slot with a tombstone, returning the entry if there was one.
    pub(crate) fn bury(&mut self) -> Option<(K, V)> {
        match core::mem::replace(self, Slot::Tombstone) {
            Slot::Occupied(k, v) => Some((k, v)),
            other => {
                *self = other;
                None
            }
        }
    }
}

/// Allocate `capacity` empty slots, reporting allocator refusal instead of
/// aborting.
pub(crate) fn alloc_slots<K, V>(capacity: usize) -> Result<Box<[Slot<K, V>]>, TableError> {
    debug_assert!(capacity.is_power_of_two());
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(capacity)
        .map_err(|e| TableError::from_reserve(capacity, e))?;
    slots.resize_with(capacity, || Slot::Empty);
    Ok(slots.into_boxed_slice())
}

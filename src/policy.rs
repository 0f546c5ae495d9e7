//! Sizing and resize policy.
//!
//! Capacities are powers of two no smaller than [`MIN_CAPACITY`] so that
//! probe indices wrap with `& (capacity - 1)`. The maximum load factor is
//! kept as an integer ratio; "load" counts live entries plus tombstones.

use crate::error::TableError;

pub const MIN_CAPACITY: usize = 8;
pub const LOAD_NUMERATOR: usize = 3;
pub const LOAD_DENOMINATOR: usize = 4;

/// True when `used` slots (live + tombstones) exceed the maximum load of
/// `capacity`.
#[inline]
pub fn exceeds_max_load(used: usize, capacity: usize) -> bool {
    // used / capacity > 3/4, without floats. `used <= capacity`, and
    // capacity is a slice length, so neither product can overflow for
    // any table that could actually be allocated with these ratios.
    used.saturating_mul(LOAD_DENOMINATOR) > capacity.saturating_mul(LOAD_NUMERATOR)
}

/// Smallest capacity that holds `entries` live entries without crossing the
/// maximum load.
pub fn capacity_for(entries: usize) -> Result<usize, TableError> {
    let overflow = TableError::CapacityOverflow { requested: entries };
    if entries == 0 {
        return Ok(MIN_CAPACITY);
    }
    // ceil(entries * 4 / 3)
    let scaled = entries
        .checked_mul(LOAD_DENOMINATOR)
        .ok_or_else(|| overflow.clone())?;
    let slots = scaled.div_ceil(LOAD_NUMERATOR);
    let cap = slots.checked_next_power_of_two().ok_or(overflow)?;
    Ok(cap.max(MIN_CAPACITY))
}

/// Capacity to rehash into when the load limit trips: the smallest power of
/// two holding twice the live entries. Tombstones are not counted, which is
/// what purges them.
pub fn rehash_capacity(len: usize) -> Result<usize, TableError> {
    let doubled = len
        .checked_mul(2)
        .and_then(usize::checked_next_power_of_two)
        .ok_or(TableError::CapacityOverflow { requested: len })?;
    Ok(doubled.max(MIN_CAPACITY))
}

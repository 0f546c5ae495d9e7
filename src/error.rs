//! Failures surfaced by sizing and allocation.
//!
//! A missing key is never an error; lookups and removals return `Option`.

use std::collections::TryReserveError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// Sizing arithmetic for `requested` entries does not fit in `usize`.
    #[error("capacity overflow: cannot size a table for {requested} entries")]
    CapacityOverflow { requested: usize },

    /// The allocator refused a slot array of `slots` slots.
    #[error("allocation failed: slot array of {slots} slots")]
    AllocFailed { slots: usize },
}

impl TableError {
    pub(crate) fn from_reserve(slots: usize, _err: TryReserveError) -> Self {
        TableError::AllocFailed { slots }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failed_size() {
        let e = TableError::CapacityOverflow { requested: 7 };
        assert_eq!(
            e.to_string(),
            "capacity overflow: cannot size a table for 7 entries"
        );
        let e = TableError::AllocFailed { slots: 1024 };
        assert_eq!(e.to_string(), "allocation failed: slot array of 1024 slots");
    }

    #[test]
    fn reserve_error_maps_to_alloc_failed() {
        let mut v: Vec<u64> = Vec::new();
        let err = v.try_reserve_exact(usize::MAX).unwrap_err();
        assert_eq!(
            TableError::from_reserve(usize::MAX, err),
            TableError::AllocFailed { slots: usize::MAX }
        );
    }
}

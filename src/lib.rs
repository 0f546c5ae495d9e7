//! oa-hashmap: a single-threaded open-addressing hash map whose instances
//! share one operation table per `(key, value, binding)` instantiation.
//!
//! Internal Design:
//!
//! Summary
//! - Layers:
//!   - `RawTable<K, V, B>`: the engine. A power-of-two slot array with
//!     Empty/Tombstone/Occupied slots, linear probing, tombstone deletion and
//!     load-factor driven rehashing.
//!   - `OpTable<K, V, B>`: a read-only bundle of function pointers, built once
//!     per instantiation and shared process-wide.
//!   - `OaMap<K, V, B>`: public map; a `RawTable` plus a `&'static OpTable`.
//! - Keys are hashed and compared through a `KeyBinding`: `StdBinding` derives
//!   it from `Hash + Eq`, `FnBinding` takes two plain functions.
//!
//! Constraints
//! - Single-threaded: no locks or atomics on the hot path; tables are `!Sync`.
//!   Share a table across threads only behind an external `Mutex`.
//! - `len + tombstones <= 3/4 * capacity` after every operation; capacity is a
//!   power of two and at least 8. A probe therefore always reaches an Empty
//!   slot.
//! - Removal leaves a tombstone; tombstones are purged only when the table is
//!   rehashed.
//! - Overwriting a key drops the previous value without returning it.
//!
//! Failure model
//! - Absent keys and exhausted iterators are `None`, never errors.
//! - Sizing overflow and allocator refusal surface as `TableError` from the
//!   `try_*` operations; the infallible forms panic with the same message.
//! - Mutating a table while an iterator over it is alive is rejected by the
//!   borrow checker; there is no runtime check.
//! - Debug builds panic if key binding code reenters the table it is being
//!   called from.
//!
//! Notes and non-goals
//! - No ordered iteration; order is slot order and changes across resizes.
//! - No persistence and no DoS-resistant hashing beyond what the chosen
//!   `BuildHasher` provides.
//! - `OaMap` requires `'static` type parameters because operation tables are
//!   looked up by `TypeId`. `RawTable` has no such bound.

pub mod binding;
mod error;
pub mod oa_map;
pub mod ops;
pub mod policy;
mod probe_guard;
pub mod raw_table;
mod raw_table_proptest;
pub mod slot;

// Public surface
pub use binding::{FnBinding, KeyBinding, StdBinding};
pub use error::TableError;
pub use oa_map::OaMap;
pub use ops::OpTable;
pub use raw_table::{IntoIter, Iter, MapPair, RawTable};

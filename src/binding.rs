//! Key bindings: the hash function and equality predicate a table is
//! instantiated with.
//!
//! A binding is fixed when the table is built and never changes afterward.
//! Implementations must keep `keys_equal(a, b) => hash_key(a) == hash_key(b)`
//! and must hash deterministically for as long as the binding value lives.

use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

pub trait KeyBinding<K: ?Sized> {
    fn hash_key(&self, key: &K) -> u64;
    fn keys_equal(&self, a: &K, b: &K) -> bool;
}

/// Binding derived from `K: Hash + Eq`, hashing through a `BuildHasher`.
#[derive(Clone, Debug, Default)]
pub struct StdBinding<S = RandomState> {
    hasher: S,
}

impl<S> StdBinding<S> {
    pub fn new(hasher: S) -> Self {
        Self { hasher }
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }
}

impl<K, S> KeyBinding<K> for StdBinding<S>
where
    K: ?Sized + Hash + Eq,
    S: BuildHasher,
{
    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        self.hasher.hash_one(key)
    }

    #[inline]
    fn keys_equal(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

/// Binding built from two plain functions, for keys that do not implement
/// `Hash`/`Eq` or need a different notion of identity.
pub struct FnBinding<K: ?Sized> {
    hash: fn(&K) -> u64,
    eq: fn(&K, &K) -> bool,
}

impl<K: ?Sized> FnBinding<K> {
    pub const fn new(hash: fn(&K) -> u64, eq: fn(&K, &K) -> bool) -> Self {
        Self { hash, eq }
    }
}

impl<K: ?Sized> Clone for FnBinding<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: ?Sized> Copy for FnBinding<K> {}

impl<K: ?Sized> fmt::Debug for FnBinding<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnBinding")
            .field("hash", &(self.hash as *const ()))
            .field("eq", &(self.eq as *const ()))
            .finish()
    }
}

impl<K: ?Sized> KeyBinding<K> for FnBinding<K> {
    #[inline]
    fn hash_key(&self, key: &K) -> u64 {
        (self.hash)(key)
    }

    #[inline]
    fn keys_equal(&self, a: &K, b: &K) -> bool {
        (self.eq)(a, b)
    }
}

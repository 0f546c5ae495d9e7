//! Shared operation tables.
//!
//! One [`OpTable`] exists per `(K, V, B)` instantiation. It is built the first
//! time any [`OaMap`] of that instantiation is created, leaked, and shared by
//! reference from then on; every map of the same instantiation points at the
//! same object. Each entry is the corresponding inherent `OaMap` method, so
//! calling through the table runs exactly the code a direct call runs.

use crate::binding::KeyBinding;
use crate::error::TableError;
use crate::oa_map::OaMap;
use crate::raw_table::Iter;
use core::any::{Any, TypeId};
use core::fmt;
use hashbrown::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};

pub struct OpTable<K: 'static, V: 'static, B: 'static> {
    pub insert: fn(&mut OaMap<K, V, B>, K, V),
    pub try_insert: fn(&mut OaMap<K, V, B>, K, V) -> Result<(), TableError>,
    pub get: for<'a, 'k> fn(&'a OaMap<K, V, B>, &'k K) -> Option<&'a V>,
    pub contains: fn(&OaMap<K, V, B>, &K) -> bool,
    pub remove: fn(&mut OaMap<K, V, B>, &K) -> Option<V>,
    pub len: fn(&OaMap<K, V, B>) -> usize,
    pub is_empty: fn(&OaMap<K, V, B>) -> bool,
    pub capacity: fn(&OaMap<K, V, B>) -> usize,
    pub clear: fn(&mut OaMap<K, V, B>),
    pub iter: for<'a> fn(&'a OaMap<K, V, B>) -> Iter<'a, K, V>,
}

impl<K, V, B> OpTable<K, V, B>
where
    K: 'static,
    V: 'static,
    B: KeyBinding<K> + 'static,
{
    /// The process-wide table for this instantiation, built on first use.
    pub fn shared() -> &'static Self {
        intern(Self::build)
    }

    fn build() -> Self {
        OpTable {
            insert: OaMap::<K, V, B>::insert,
            try_insert: OaMap::<K, V, B>::try_insert,
            get: OaMap::<K, V, B>::get,
            contains: OaMap::<K, V, B>::contains_key,
            remove: OaMap::<K, V, B>::remove,
            len: OaMap::<K, V, B>::len,
            is_empty: OaMap::<K, V, B>::is_empty,
            capacity: OaMap::<K, V, B>::capacity,
            clear: OaMap::<K, V, B>::clear,
            iter: OaMap::<K, V, B>::iter,
        }
    }
}

impl<K: 'static, V: 'static, B: 'static> fmt::Debug for OpTable<K, V, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpTable<{}>", core::any::type_name::<OaMap<K, V, B>>())
    }
}

type Interned = &'static (dyn Any + Send + Sync);

static REGISTRY: OnceLock<Mutex<HashMap<TypeId, Interned>>> = OnceLock::new();

/// Return the single leaked `T` for this process, building it with `build`
/// the first time `T` is requested.
fn intern<T: Any + Send + Sync>(build: fn() -> T) -> &'static T {
    let registry = REGISTRY.get_or_init(|| Mutex::new(HashMap::new()));
    let mut tables = registry.lock().unwrap_or_else(PoisonError::into_inner);
    let interned: Interned = *tables.entry(TypeId::of::<T>()).or_insert_with(|| {
        tracing::trace!(
            instantiation = core::any::type_name::<T>(),
            "built shared operation table"
        );
        let leaked: Interned = Box::leak(Box::new(build()));
        leaked
    });
    interned
        .downcast_ref::<T>()
        .expect("registry entries are keyed by their own TypeId")
}

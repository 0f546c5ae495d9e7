//! OaMap: public map pairing a [`RawTable`] with its instantiation's shared
//! [`OpTable`].

use crate::binding::{KeyBinding, StdBinding};
use crate::error::TableError;
use crate::ops::OpTable;
use crate::raw_table::{IntoIter, Iter, RawTable};
use core::fmt;
use core::hash::Hash;

/// An open-addressing hash map.
///
/// Every `OaMap<K, V, B>` holds a reference to the one [`OpTable`] for its
/// `(K, V, B)`; see [`OaMap::ops`].
///
/// Iterators borrow the map, so it cannot be mutated while one is alive.
#[derive(Clone)]
pub struct OaMap<K: 'static, V: 'static, B: 'static = StdBinding> {
    table: RawTable<K, V, B>,
    ops: &'static OpTable<K, V, B>,
}

impl<K, V> OaMap<K, V>
where
    K: Eq + Hash + 'static,
    V: 'static,
{
    pub fn new() -> Self {
        Self::from_raw(RawTable::new())
    }

    /// Map that accepts `entries` inserts without resizing.
    pub fn with_capacity(entries: usize) -> Self {
        Self::from_raw(RawTable::with_capacity(entries))
    }
}

impl<K, V, B> Default for OaMap<K, V, B>
where
    K: 'static,
    V: 'static,
    B: KeyBinding<K> + Default + 'static,
{
    fn default() -> Self {
        Self::with_binding(B::default())
    }
}

impl<K, V, B> From<RawTable<K, V, B>> for OaMap<K, V, B>
where
    K: 'static,
    V: 'static,
    B: KeyBinding<K> + 'static,
{
    fn from(table: RawTable<K, V, B>) -> Self {
        Self::from_raw(table)
    }
}

impl<K, V, B> OaMap<K, V, B>
where
    K: 'static,
    V: 'static,
    B: KeyBinding<K> + 'static,
{
    pub fn with_binding(binding: B) -> Self {
        Self::from_raw(RawTable::with_binding(binding))
    }

    pub fn with_capacity_and_binding(entries: usize, binding: B) -> Self {
        Self::from_raw(RawTable::with_capacity_and_binding(entries, binding))
    }

    pub fn try_with_capacity_and_binding(entries: usize, binding: B) -> Result<Self, TableError> {
        RawTable::try_with_capacity_and_binding(entries, binding).map(Self::from_raw)
    }

    pub fn from_raw(table: RawTable<K, V, B>) -> Self {
        Self {
            table,
            ops: OpTable::shared(),
        }
    }

    pub fn into_raw(self) -> RawTable<K, V, B> {
        self.table
    }

    pub fn as_raw(&self) -> &RawTable<K, V, B> {
        &self.table
    }

    /// The operation table shared by every map of this instantiation.
    pub fn ops(&self) -> &'static OpTable<K, V, B> {
        self.ops
    }

    /// True when both maps reference the same operation table object.
    pub fn shares_ops_with(&self, other: &Self) -> bool {
        core::ptr::eq(self.ops, other.ops)
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.table.insert(key, value)
    }

    pub fn try_insert(&mut self, key: K, value: V) -> Result<(), TableError> {
        self.table.try_insert(key, value)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.table.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.table.get_mut(key)
    }

    pub fn get_cloned(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.table.get_cloned(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.table.contains_key(key)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.table.remove(key)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn tombstones(&self) -> usize {
        self.table.tombstones()
    }

    pub fn clear(&mut self) {
        self.table.clear()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional)
    }

    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TableError> {
        self.table.try_reserve(additional)
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        self.table.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.table.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.table.values()
    }

    pub fn binding(&self) -> &B {
        self.table.binding()
    }
}

impl<K, V, B> fmt::Debug for OaMap<K, V, B>
where
    K: fmt::Debug + 'static,
    V: fmt::Debug + 'static,
    B: 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.table, f)
    }
}

impl<K, V, B> PartialEq for OaMap<K, V, B>
where
    K: 'static,
    V: PartialEq + 'static,
    B: KeyBinding<K> + 'static,
{
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table
    }
}

impl<K, V, B> Extend<(K, V)> for OaMap<K, V, B>
where
    K: 'static,
    V: 'static,
    B: KeyBinding<K> + 'static,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.table.extend(iter)
    }
}

impl<K, V, B> FromIterator<(K, V)> for OaMap<K, V, B>
where
    K: 'static,
    V: 'static,
    B: KeyBinding<K> + Default + 'static,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_raw(iter.into_iter().collect())
    }
}

impl<'a, K, V, B> IntoIterator for &'a OaMap<K, V, B>
where
    K: 'static,
    V: 'static,
    B: 'static,
{
    type Item = crate::raw_table::MapPair<&'a K, &'a V>;
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.table.iter()
    }
}

impl<K, V, B> IntoIterator for OaMap<K, V, B>
where
    K: 'static,
    V: 'static,
    B: 'static,
{
    type Item = crate::raw_table::MapPair<K, V>;
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.table.into_iter()
    }
}

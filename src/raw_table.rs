//! RawTable: the open-addressing engine.
//!
//! Layout
//! - A power-of-two array of [`Slot`]s, a live-entry count (`len`) and a
//!   tombstone count. `len + tombstones <= capacity` always holds, and at rest
//!   `len + tombstones <= 3/4 * capacity`, so every table keeps Empty slots.
//!
//! Probing
//! - Linear, step 1, wrapped with `& (capacity - 1)`. A probe stops at the
//!   matching key or at the first Empty slot; it never stops at a Tombstone.
//!   Inserts fill the first Tombstone seen on the way if the key is absent.
//!
//! Resizing
//! - When an insert would take `len + tombstones` past 3/4 of capacity, the
//!   table is rehashed into the smallest power of two holding `2 * len`
//!   entries. Tombstones are dropped there and nowhere else. Removal never
//!   resizes.
//!
//! Iteration
//! - [`Iter`] walks slots in index order. It borrows the table, so the table
//!   cannot be mutated while an iterator is alive.

use crate::binding::{KeyBinding, StdBinding};
use crate::error::TableError;
use crate::policy;
use crate::probe_guard::ProbeGuard;
use crate::slot::{alloc_slots, Slot};
use core::fmt;
use core::hash::Hash;
use core::iter::FusedIterator;
use core::mem;

/// A key and value yielded by iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MapPair<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> From<(K, V)> for MapPair<K, V> {
    fn from((key, value): (K, V)) -> Self {
        MapPair { key, value }
    }
}

impl<K, V> From<MapPair<K, V>> for (K, V) {
    fn from(p: MapPair<K, V>) -> Self {
        (p.key, p.value)
    }
}

#[derive(Clone)]
pub struct RawTable<K, V, B = StdBinding> {
    slots: Box<[Slot<K, V>]>,
    len: usize,
    tombstones: usize,
    binding: B,
    guard: ProbeGuard,
}

/// Outcome of probing for a key.
enum Probe {
    Found(usize),
    /// Key absent; index of the slot an insert should fill.
    Vacant(usize),
}

#[inline]
fn home_index(hash: u64, mask: usize) -> usize {
    (hash as usize) & mask
}

fn probe<K, V, B>(slots: &[Slot<K, V>], binding: &B, key: &K) -> Probe
where
    B: KeyBinding<K>,
{
    let mask = slots.len() - 1;
    let mut idx = home_index(binding.hash_key(key), mask);
    let mut first_tombstone = None;
    for _ in 0..slots.len() {
        match &slots[idx] {
            Slot::Empty => return Probe::Vacant(first_tombstone.unwrap_or(idx)),
            Slot::Tombstone => {
                if first_tombstone.is_none() {
                    first_tombstone = Some(idx);
                }
            }
            Slot::Occupied(k, _) if binding.keys_equal(k, key) => return Probe::Found(idx),
            Slot::Occupied(..) => {}
        }
        idx = (idx + 1) & mask;
    }
    match first_tombstone {
        Some(idx) => Probe::Vacant(idx),
        None => unreachable!("load limit keeps at least one Empty slot"),
    }
}

/// First Empty slot from `hash`'s home. Only used while rehashing into a
/// fresh array, which holds no tombstones and no duplicate keys.
fn empty_slot_for<K, V>(slots: &[Slot<K, V>], hash: u64) -> usize {
    let mask = slots.len() - 1;
    let mut idx = home_index(hash, mask);
    while !slots[idx].is_empty() {
        idx = (idx + 1) & mask;
    }
    idx
}

pub(crate) fn or_panic<T>(r: Result<T, TableError>) -> T {
    match r {
        Ok(t) => t,
        Err(e) => panic!("{e}"),
    }
}

impl<K, V> RawTable<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_binding(StdBinding::default())
    }

    pub fn with_capacity(entries: usize) -> Self {
        Self::with_capacity_and_binding(entries, StdBinding::default())
    }
}

impl<K, V, B: Default> Default for RawTable<K, V, B> {
    fn default() -> Self {
        Self::with_binding(B::default())
    }
}

impl<K, V, B> RawTable<K, V, B> {
    pub fn with_binding(binding: B) -> Self {
        Self::with_capacity_and_binding(0, binding)
    }

    /// Table that accepts `entries` inserts without resizing.
    ///
    /// # Panics
    /// If the size overflows or the slot array cannot be allocated; see
    /// [`try_with_capacity_and_binding`](Self::try_with_capacity_and_binding).
    pub fn with_capacity_and_binding(entries: usize, binding: B) -> Self {
        or_panic(Self::try_with_capacity_and_binding(entries, binding))
    }

    pub fn try_with_capacity_and_binding(entries: usize, binding: B) -> Result<Self, TableError> {
        let capacity = policy::capacity_for(entries)?;
        Ok(Self {
            slots: alloc_slots(capacity)?,
            len: 0,
            tombstones: 0,
            binding,
            guard: ProbeGuard::new(),
        })
    }

    /// Live entries. Tombstones are never counted.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    /// Slots counted against the load limit: live entries plus tombstones.
    pub fn load(&self) -> usize {
        self.len + self.tombstones
    }

    pub fn binding(&self) -> &B {
        &self.binding
    }

    /// Drop every entry and tombstone, keeping the current capacity.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = Slot::Empty;
        }
        self.len = 0;
        self.tombstones = 0;
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            cursor: 0,
            remaining: self.len,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|p| p.key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|p| p.value)
    }

    #[cfg(test)]
    pub(crate) fn slots(&self) -> &[Slot<K, V>] {
        &self.slots
    }
}

impl<K, V, B> RawTable<K, V, B>
where
    B: KeyBinding<K>,
{
    /// Insert or overwrite. The previous value, if any, is dropped.
    ///
    /// # Panics
    /// If a needed resize cannot be sized or allocated; see
    /// [`try_insert`](Self::try_insert).
    pub fn insert(&mut self, key: K, value: V) {
        or_panic(self.try_insert(key, value))
    }

    /// Insert or overwrite, reporting allocation failure during growth.
    /// On `Err` the table is unchanged.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<(), TableError> {
        let grow_to = {
            let _g = self.guard.enter();
            match probe(&self.slots, &self.binding, &key) {
                Probe::Found(idx) => {
                    if let Slot::Occupied(_, v) = &mut self.slots[idx] {
                        *v = value;
                    }
                    return Ok(());
                }
                Probe::Vacant(idx) if self.slots[idx].is_tombstone() => {
                    // Reusing a tombstone leaves the load unchanged.
                    self.slots[idx] = Slot::Occupied(key, value);
                    self.tombstones -= 1;
                    self.len += 1;
                    return Ok(());
                }
                Probe::Vacant(idx) => {
                    if !policy::exceeds_max_load(self.load() + 1, self.slots.len()) {
                        self.slots[idx] = Slot::Occupied(key, value);
                        self.len += 1;
                        return Ok(());
                    }
                    policy::rehash_capacity(self.len + 1)?
                }
            }
        };
        // Growing first and then placing the entry ends in the same state as
        // placing it and then growing, but leaves the table untouched if the
        // allocation fails.
        self.rehash(grow_to)?;
        let _g = self.guard.enter();
        let idx = empty_slot_for(&self.slots, self.binding.hash_key(&key));
        self.slots[idx] = Slot::Occupied(key, value);
        self.len += 1;
        Ok(())
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let _g = self.guard.enter();
        match probe(&self.slots, &self.binding, key) {
            Probe::Found(idx) => match &self.slots[idx] {
                Slot::Occupied(_, v) => Some(v),
                _ => None,
            },
            Probe::Vacant(_) => None,
        }
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let _g = self.guard.enter();
        match probe(&self.slots, &self.binding, key) {
            Probe::Found(idx) => match &mut self.slots[idx] {
                Slot::Occupied(_, v) => Some(v),
                _ => None,
            },
            Probe::Vacant(_) => None,
        }
    }

    /// Copy of the stored value.
    pub fn get_cloned(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.get(key).cloned()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Remove `key`, leaving a tombstone in its slot.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let _g = self.guard.enter();
        match probe(&self.slots, &self.binding, key) {
            Probe::Found(idx) => {
                let (_k, v) = self.slots[idx].bury()?;
                self.len -= 1;
                self.tombstones += 1;
                Some(v)
            }
            Probe::Vacant(_) => None,
        }
    }

    /// Make room so that `additional` more inserts cannot trigger a resize.
    /// Never shrinks.
    pub fn reserve(&mut self, additional: usize) {
        or_panic(self.try_reserve(additional))
    }

    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TableError> {
        let worst_case = self
            .load()
            .checked_add(additional)
            .ok_or(TableError::CapacityOverflow {
                requested: additional,
            })?;
        if !policy::exceeds_max_load(worst_case, self.slots.len()) {
            return Ok(());
        }
        let wanted = self
            .len
            .checked_add(additional)
            .ok_or(TableError::CapacityOverflow {
                requested: additional,
            })?;
        let capacity = policy::capacity_for(wanted)?.max(self.slots.len());
        self.rehash(capacity)
    }

    /// Move every live entry into a fresh array of `capacity` slots,
    /// discarding tombstones.
    fn rehash(&mut self, capacity: usize) -> Result<(), TableError> {
        let _g = self.guard.enter();
        let fresh = alloc_slots(capacity)?;
        let old = mem::replace(&mut self.slots, fresh);
        let old_capacity = old.len();
        let purged = self.tombstones;
        // Counted back up as entries land, so a panicking hash leaves the
        // counters matching what was actually moved.
        self.len = 0;
        self.tombstones = 0;
        for slot in old.into_vec() {
            if let Slot::Occupied(k, v) = slot {
                let idx = empty_slot_for(&self.slots, self.binding.hash_key(&k));
                self.slots[idx] = Slot::Occupied(k, v);
                self.len += 1;
            }
        }
        tracing::debug!(
            old_capacity,
            new_capacity = capacity,
            len = self.len,
            purged_tombstones = purged,
            "rehashed open-addressing table"
        );
        Ok(())
    }
}

impl<K, V, B> fmt::Debug for RawTable<K, V, B>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|p| (p.key, p.value)))
            .finish()
    }
}

impl<K, V, B> PartialEq for RawTable<K, V, B>
where
    B: KeyBinding<K>,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len
            && self
                .iter()
                .all(|p| other.get(p.key).is_some_and(|v| v == p.value))
    }
}

impl<K, V, B> Extend<(K, V)> for RawTable<K, V, B>
where
    B: KeyBinding<K>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, B> FromIterator<(K, V)> for RawTable<K, V, B>
where
    B: KeyBinding<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut table = Self::with_capacity_and_binding(iter.size_hint().0, B::default());
        table.extend(iter);
        table
    }
}

/// Borrowing iterator in slot order.
pub struct Iter<'a, K, V> {
    slots: &'a [Slot<K, V>],
    cursor: usize,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = MapPair<&'a K, &'a V>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(slot) = self.slots.get(self.cursor) {
            self.cursor += 1;
            if let Slot::Occupied(key, value) = slot {
                self.remaining -= 1;
                return Some(MapPair { key, value });
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            slots: self.slots,
            cursor: self.cursor,
            remaining: self.remaining,
        }
    }
}

/// Owning iterator in slot order.
pub struct IntoIter<K, V> {
    slots: std::vec::IntoIter<Slot<K, V>>,
    remaining: usize,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = MapPair<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Slot::Occupied(key, value) = slot {
                self.remaining -= 1;
                return Some(MapPair { key, value });
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<'a, K, V, B> IntoIterator for &'a RawTable<K, V, B> {
    type Item = MapPair<&'a K, &'a V>;
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, B> IntoIterator for RawTable<K, V, B> {
    type Item = MapPair<K, V>;
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            remaining: self.len,
            slots: self.slots.into_vec().into_iter(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::FnBinding;
    use std::collections::BTreeSet;
    use std::hash::BuildHasher;

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    // Every key shares one home slot.
    impl core::hash::Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        }
    }

    fn colliding<K: Eq + Hash, V>() -> RawTable<K, V, StdBinding<ConstBuildHasher>> {
        RawTable::with_binding(StdBinding::new(ConstBuildHasher))
    }

    fn assert_counters<K, V, B>(t: &RawTable<K, V, B>) {
        let occupied = t.slots().iter().filter(|s| s.is_occupied()).count();
        let tombs = t.slots().iter().filter(|s| s.is_tombstone()).count();
        assert_eq!(t.len(), occupied, "len must count Occupied slots");
        assert_eq!(t.tombstones(), tombs, "tombstones must count Tombstone slots");
        assert!(t.load() <= t.capacity());
        assert!(!policy::exceeds_max_load(t.load(), t.capacity()));
        assert!(t.capacity().is_power_of_two());
        assert!(t.capacity() >= policy::MIN_CAPACITY);
    }

    #[test]
    fn new_table_is_empty_with_min_capacity() {
        let t: RawTable<u32, u32> = RawTable::new();
        assert_eq!(t.len(), 0);
        assert!(t.is_empty());
        assert_eq!(t.tombstones(), 0);
        assert_eq!(t.capacity(), policy::MIN_CAPACITY);
        assert_eq!(t.iter().count(), 0);
    }

    #[test]
    fn with_capacity_zero_matches_new() {
        let a: RawTable<u32, u32> = RawTable::with_capacity(0);
        let b: RawTable<u32, u32> = RawTable::new();
        assert_eq!(a.capacity(), b.capacity());
        assert_eq!(a.len(), b.len());
        assert_eq!(a.tombstones(), b.tombstones());
    }

    /// The concrete int->int scenario.
    #[test]
    fn salary_scenario() {
        let mut t: RawTable<i32, i32> = RawTable::new();
        t.insert(101, 2500);
        t.insert(102, 1800);
        t.insert(103, 3200);
        t.insert(104, 2100);
        assert_eq!(t.len(), 4);
        assert_eq!(t.get(&103), Some(&3200));
        assert_eq!(t.remove(&104), Some(2100));
        assert_eq!(t.len(), 3);
        assert_eq!(t.get(&104), None);
        assert_counters(&t);
    }

    /// Invariant: overwriting keeps `len` and replaces the value.
    #[test]
    fn overwrite_keeps_len() {
        let mut t: RawTable<String, i32> = RawTable::new();
        t.insert("k".to_string(), 1);
        t.insert("k".to_string(), 2);
        assert_eq!(t.len(), 1);
        assert_eq!(t.get(&"k".to_string()), Some(&2));
        assert_eq!(t.get_cloned(&"k".to_string()), Some(2));
    }

    /// Invariant: removal leaves a tombstone, and `get`/`contains_key`
    /// report the key absent.
    #[test]
    fn remove_leaves_tombstone() {
        let mut t: RawTable<u32, &str> = RawTable::new();
        t.insert(1, "one");
        assert_eq!(t.remove(&1), Some("one"));
        assert_eq!(t.len(), 0);
        assert_eq!(t.tombstones(), 1);
        assert_eq!(t.get(&1), None);
        assert!(!t.contains_key(&1));
        assert_eq!(t.remove(&1), None, "second removal finds nothing");
        assert_eq!(t.tombstones(), 1);
        assert_counters(&t);
    }

    /// Invariant: re-inserting a removed key fills its tombstone.
    #[test]
    fn reinsert_reuses_tombstone() {
        let mut t: RawTable<u32, u32, _> = colliding();
        t.insert(1, 10);
        t.insert(2, 20);
        t.remove(&1);
        assert_eq!((t.len(), t.tombstones()), (1, 1));
        t.insert(1, 11);
        assert_eq!((t.len(), t.tombstones()), (2, 0));
        assert_eq!(t.get(&1), Some(&11));
        assert_eq!(t.get(&2), Some(&20));
        // All keys share home slot 0; the reused tombstone is slot 0.
        assert_eq!(t.slots()[0], Slot::Occupied(1, 11));
    }

    /// Invariant: a probe continues past tombstones, so keys placed after a
    /// removed key in the same chain stay reachable.
    #[test]
    fn lookups_skip_tombstones_in_chain() {
        let mut t: RawTable<u32, u32, _> = colliding();
        for k in 0..5 {
            t.insert(k, k * 100);
        }
        t.remove(&0);
        t.remove(&2);
        for k in [1, 3, 4] {
            assert_eq!(t.get(&k), Some(&(k * 100)), "key {k}");
        }
        assert!(!t.contains_key(&0));
        assert!(!t.contains_key(&2));
        assert_counters(&t);
    }

    /// Invariant: inserting an existing key that sits behind a tombstone
    /// overwrites it instead of creating a duplicate in the tombstone.
    #[test]
    fn overwrite_behind_tombstone_does_not_duplicate() {
        let mut t: RawTable<u32, u32, _> = colliding();
        t.insert(1, 1);
        t.insert(2, 2);
        t.remove(&1);
        t.insert(2, 22);
        assert_eq!(t.len(), 1);
        assert_eq!(t.tombstones(), 1);
        assert_eq!(t.iter().count(), 1);
        assert_eq!(t.get(&2), Some(&22));
    }

    /// Invariant: growth happens once load passes 3/4, capacity doubles,
    /// tombstones are purged, and every entry survives with its last value.
    #[test]
    fn growth_preserves_entries() {
        let mut t: RawTable<u64, u64> = RawTable::new();
        let mut capacities = vec![t.capacity()];
        for k in 0..1000u64 {
            t.insert(k, k);
            if k % 3 == 0 {
                t.insert(k, k + 1);
            }
            if *capacities.last().unwrap() != t.capacity() {
                capacities.push(t.capacity());
                assert_eq!(t.tombstones(), 0, "resize must purge tombstones");
            }
            assert_counters(&t);
        }
        assert!(capacities.len() > 1, "table must have grown");
        for w in capacities.windows(2) {
            assert_eq!(w[1], w[0] * 2);
        }
        for k in 0..1000u64 {
            let want = if k % 3 == 0 { k + 1 } else { k };
            assert_eq!(t.get(&k), Some(&want));
        }
    }

    #[test]
    fn seventh_insert_into_min_table_grows() {
        let mut t: RawTable<u32, u32> = RawTable::new();
        for k in 0..6 {
            t.insert(k, k);
        }
        assert_eq!(t.capacity(), 8);
        t.insert(6, 6);
        assert_eq!(t.capacity(), 16);
        assert_eq!(t.len(), 7);
    }

    /// Invariant: a pre-sized table absorbs its stated number of inserts
    /// without resizing.
    #[test]
    fn presized_table_never_resizes() {
        let mut t: RawTable<u32, u32> = RawTable::with_capacity(1000);
        let cap = t.capacity();
        for k in 0..100 {
            t.insert(k, k);
        }
        assert_eq!(t.capacity(), cap);

        let mut t: RawTable<u32, u32> = RawTable::with_capacity(1000);
        for k in 0..1000 {
            t.insert(k, k);
            assert_eq!(t.capacity(), cap);
        }
    }

    /// Invariant: tombstones count against the load and are compacted on the
    /// next resize, which may shrink the table back toward `2 * len`.
    #[test]
    fn tombstones_trigger_compacting_rehash() {
        let identity = FnBinding::<u32>::new(|k: &u32| *k as u64, |a: &u32, b: &u32| a == b);
        let mut t: RawTable<u32, u32, FnBinding<u32>> =
            RawTable::with_capacity_and_binding(12, identity);
        assert_eq!(t.capacity(), 16);
        for k in 0..12 {
            t.insert(k, k);
        }
        for k in 0..12 {
            assert_eq!(t.remove(&k), Some(k));
            assert_counters(&t);
        }
        // 12 tombstones, load 12/16: at the limit, not past it.
        assert_eq!((t.len(), t.tombstones(), t.capacity()), (0, 12, 16));
        // Slot 12 is Empty, so key 12 lands there and pushes the load past 3/4.
        t.insert(12, 12);
        assert_eq!(t.tombstones(), 0);
        assert_eq!(t.len(), 1);
        assert_eq!(t.capacity(), policy::MIN_CAPACITY);
        assert_eq!(t.get(&12), Some(&12));
        assert_counters(&t);
    }

    /// Invariant: a new key passing a tombstone on its way to an Empty slot
    /// reuses the tombstone, so the load does not grow.
    #[test]
    fn new_key_reuses_first_tombstone_on_path() {
        let mut t: RawTable<u32, u32, _> = colliding();
        t.insert(1, 1);
        t.insert(2, 2);
        t.remove(&1);
        let load = t.load();
        t.insert(3, 3);
        assert_eq!(t.load(), load);
        assert_eq!(t.slots()[0], Slot::Occupied(3, 3));
        assert_counters(&t);
    }

    /// Invariant: iteration yields every live entry exactly once and its
    /// length is exact.
    #[test]
    fn iteration_is_complete() {
        let mut t: RawTable<String, usize> = RawTable::new();
        for i in 0..50 {
            t.insert(format!("k{i}"), i);
        }
        for i in (0..50).step_by(5) {
            t.remove(&format!("k{i}"));
        }
        let it = t.iter();
        assert_eq!(it.len(), t.len());
        let seen: Vec<String> = it.map(|p| p.key.clone()).collect();
        let unique: BTreeSet<_> = seen.iter().cloned().collect();
        assert_eq!(seen.len(), unique.len(), "no key yielded twice");
        let expected: BTreeSet<_> = (0..50)
            .filter(|i| i % 5 != 0)
            .map(|i| format!("k{i}"))
            .collect();
        assert_eq!(unique, expected);
    }

    #[test]
    fn iterator_is_fused_and_single_pass() {
        let mut t: RawTable<u8, u8> = RawTable::new();
        t.insert(1, 1);
        let mut it = t.iter();
        assert!(it.next().is_some());
        assert!(it.next().is_none());
        assert!(it.next().is_none());
        assert_eq!(t.iter().count(), 1, "a fresh iter starts over");
    }

    #[test]
    fn iteration_follows_slot_order() {
        let mut t: RawTable<u32, u32, _> = colliding();
        for k in [5, 3, 9] {
            t.insert(k, k);
        }
        let keys: Vec<u32> = t.keys().copied().collect();
        assert_eq!(keys, vec![5, 3, 9]);
    }

    #[test]
    fn into_iter_yields_owned_pairs() {
        let mut t: RawTable<String, Vec<u8>> = RawTable::new();
        t.insert("a".into(), vec![1]);
        t.insert("b".into(), vec![2, 2]);
        t.remove(&"a".to_string());
        let it = t.into_iter();
        assert_eq!(it.len(), 1);
        let pairs: Vec<(String, Vec<u8>)> = it.map(Into::into).collect();
        assert_eq!(pairs, vec![("b".to_string(), vec![2, 2])]);
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut t: RawTable<&str, i32> = RawTable::new();
        t.insert("x", 1);
        *t.get_mut(&"x").unwrap() += 41;
        assert_eq!(t.get(&"x"), Some(&42));
        assert!(t.get_mut(&"y").is_none());
    }

    #[test]
    fn clear_resets_counters_but_keeps_capacity() {
        let mut t: RawTable<u32, u32> = RawTable::new();
        for k in 0..20 {
            t.insert(k, k);
        }
        t.remove(&3);
        let cap = t.capacity();
        t.clear();
        assert_eq!((t.len(), t.tombstones(), t.capacity()), (0, 0, cap));
        assert!(t.slots().iter().all(Slot::is_empty));
        assert!(!t.contains_key(&4));
    }

    /// Invariant: after `reserve(n)`, `n` inserts of new keys never resize,
    /// even when the table holds tombstones.
    #[test]
    fn reserve_prevents_later_resizes() {
        let mut t: RawTable<u32, u32> = RawTable::new();
        for k in 0..5 {
            t.insert(k, k);
        }
        t.remove(&0);
        t.remove(&1);
        t.reserve(100);
        let cap = t.capacity();
        assert_eq!(t.tombstones(), 0);
        for k in 1000..1100 {
            t.insert(k, k);
        }
        assert_eq!(t.capacity(), cap);
        assert_counters(&t);
    }

    #[test]
    fn reserve_never_shrinks_and_noop_when_room() {
        let mut t: RawTable<u32, u32> = RawTable::with_capacity(500);
        let cap = t.capacity();
        t.reserve(1);
        assert_eq!(t.capacity(), cap);
        t.reserve(0);
        assert_eq!(t.capacity(), cap);
    }

    #[test]
    fn try_reserve_reports_overflow_and_leaves_table_intact() {
        let mut t: RawTable<u32, u32> = RawTable::new();
        t.insert(1, 1);
        assert!(matches!(
            t.try_reserve(usize::MAX),
            Err(TableError::CapacityOverflow { .. })
        ));
        assert_eq!(t.get(&1), Some(&1));
        assert_eq!(t.capacity(), policy::MIN_CAPACITY);
    }

    #[test]
    fn try_with_capacity_reports_overflow() {
        let r: Result<RawTable<u8, u8>, _> =
            RawTable::try_with_capacity_and_binding(usize::MAX, StdBinding::default());
        assert!(matches!(r, Err(TableError::CapacityOverflow { .. })));
    }

    #[test]
    #[should_panic(expected = "capacity overflow")]
    fn with_capacity_panics_on_overflow() {
        let _t: RawTable<u8, u8> = RawTable::with_capacity(usize::MAX);
    }

    /// Invariant: with every key colliding, a full table of distinct keys is
    /// still resolved purely by equality.
    #[test]
    fn collisions_resolved_by_equality() {
        let mut t: RawTable<String, i32, _> = colliding();
        for i in 0..40 {
            t.insert(format!("k{i}"), i);
        }
        for i in 0..40 {
            assert_eq!(t.get(&format!("k{i}")), Some(&i));
        }
        assert!(t.get(&"nope".to_string()).is_none());
        assert_counters(&t);
    }

    fn pair_hash(p: &(u8, u8)) -> u64 {
        p.0 as u64 * 31 + p.1 as u64
    }
    fn pair_eq_unordered(a: &(u8, u8), b: &(u8, u8)) -> bool {
        (a.0 == b.0 && a.1 == b.1) || (a.0 == b.1 && a.1 == b.0)
    }
    fn pair_hash_unordered(p: &(u8, u8)) -> u64 {
        pair_hash(&(p.0.min(p.1), p.0.max(p.1)))
    }

    /// Invariant: an explicit binding defines key identity for the table.
    #[test]
    fn explicit_binding_defines_identity() {
        let binding: FnBinding<(u8, u8)> =
            FnBinding::new(pair_hash_unordered, pair_eq_unordered);
        let mut t: RawTable<(u8, u8), &str, _> = RawTable::with_binding(binding);
        t.insert((1, 2), "edge");
        assert_eq!(t.get(&(2, 1)), Some(&"edge"));
        t.insert((2, 1), "same edge");
        assert_eq!(t.len(), 1);
        assert_eq!(t.remove(&(1, 2)), Some("same edge"));
        assert!(t.is_empty());
    }

    #[test]
    fn equality_ignores_slot_layout() {
        let mut a: RawTable<u32, u32> = RawTable::new();
        let mut b: RawTable<u32, u32> = RawTable::new();
        for k in 0..30 {
            a.insert(k, k);
        }
        for k in (0..30).rev() {
            b.insert(k, k);
        }
        b.insert(99, 0);
        b.remove(&99);
        assert!(a == b);
        b.insert(7, 8);
        assert!(a != b);
    }

    #[test]
    fn collect_and_debug() {
        let t: RawTable<u32, &str> = [(1, "a")].into_iter().collect();
        assert_eq!(format!("{t:?}"), r#"{1: "a"}"#);
    }

    /// Invariant (debug-only): re-entering the table from `keys_equal` during
    /// a probe panics instead of observing a half-updated table.
    #[cfg(debug_assertions)]
    #[test]
    fn reentrancy_panics_from_binding_during_probe() {
        use std::cell::Cell;

        thread_local! {
            static TABLE: Cell<*const RawTable<u32, u32, FnBinding<u32>>> =
                const { Cell::new(core::ptr::null()) };
        }

        fn reentrant_eq(a: &u32, b: &u32) -> bool {
            let t = TABLE.with(Cell::get);
            if !t.is_null() {
                // SAFETY: the pointer is set to a live table for the duration
                // of the probe below.
                unsafe {
                    let _ = (*t).contains_key(a);
                }
            }
            a == b
        }

        let mut t: RawTable<u32, u32, FnBinding<u32>> =
            RawTable::with_binding(FnBinding::new(|_: &u32| 0, reentrant_eq));
        t.insert(1, 1);
        TABLE.with(|c| c.set(&t as *const _));
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = t.get(&2);
        }));
        TABLE.with(|c| c.set(core::ptr::null()));
        assert!(res.is_err(), "expected reentrancy to panic in debug builds");
    }
}

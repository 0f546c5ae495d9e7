#![cfg(test)]

// Property tests for RawTable kept inside the crate so they can inspect the
// slot array directly.

use crate::binding::StdBinding;
use crate::policy;
use crate::raw_table::RawTable;
use crate::slot::Slot;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::hash::{BuildHasher, Hasher};

// Pool-indexed operations: indices shrink toward earlier keys, the pool
// shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Remove(usize),
    Get(usize),
    Contains(String),
    Mutate(usize, i32),
    Reserve(u8),
    Clear,
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            3 => idx.clone().prop_map(Op::Remove),
            2 => idx.clone().prop_map(Op::Get),
            1 => "[a-z]{0,4}".prop_map(Op::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => any::<u8>().prop_map(Op::Reserve),
            1 => Just(Op::Clear),
            1 => Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..200).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn check_structure<B>(t: &RawTable<String, i32, B>) -> Result<(), TestCaseError> {
    let occupied = t.slots().iter().filter(|s| matches!(s, Slot::Occupied(..))).count();
    let tombs = t.slots().iter().filter(|s| matches!(s, Slot::Tombstone)).count();
    prop_assert_eq!(t.len(), occupied);
    prop_assert_eq!(t.tombstones(), tombs);
    prop_assert!(t.capacity().is_power_of_two());
    prop_assert!(t.capacity() >= policy::MIN_CAPACITY);
    prop_assert!(t.len() + t.tombstones() <= t.capacity());
    prop_assert!(!policy::exceeds_max_load(t.load(), t.capacity()));
    prop_assert!(t.slots().iter().any(Slot::is_empty), "an Empty slot must remain");
    Ok(())
}

fn run<B>(mut sut: RawTable<String, i32, B>, pool: Vec<String>, ops: Vec<Op>) -> Result<(), TestCaseError>
where
    B: crate::binding::KeyBinding<String>,
{
    let mut model: HashMap<String, i32> = HashMap::new();
    for op in ops {
        let cap_before = sut.capacity();
        match op {
            Op::Insert(i, v) => {
                let k = pool[i].clone();
                let was_new = !model.contains_key(&k);
                sut.insert(k.clone(), v);
                model.insert(k, v);
                if sut.capacity() != cap_before {
                    prop_assert!(was_new, "overwrites never resize");
                    prop_assert_eq!(sut.tombstones(), 0, "resize purges tombstones");
                }
            }
            Op::Remove(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.remove(k), model.remove(k));
                prop_assert_eq!(sut.capacity(), cap_before, "removal never resizes");
            }
            Op::Get(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.get(k), model.get(k));
                prop_assert_eq!(sut.contains_key(k), model.contains_key(k));
            }
            Op::Contains(s) => {
                prop_assert_eq!(sut.contains_key(&s), model.contains_key(&s));
            }
            Op::Mutate(i, d) => {
                let k = &pool[i];
                if let Some(v) = sut.get_mut(k) {
                    *v = v.saturating_add(d);
                }
                if let Some(v) = model.get_mut(k) {
                    *v = v.saturating_add(d);
                }
            }
            Op::Reserve(n) => {
                let n = n as usize;
                sut.reserve(n);
                prop_assert!(sut.capacity() >= cap_before, "reserve never shrinks");
                prop_assert!(!policy::exceeds_max_load(sut.load() + n, sut.capacity()));
            }
            Op::Clear => {
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.capacity(), cap_before);
            }
            Op::Iterate => {
                let pairs: Vec<_> = sut.iter().map(|p| (p.key.clone(), *p.value)).collect();
                prop_assert_eq!(pairs.len(), sut.len());
                let keys: BTreeSet<_> = pairs.iter().map(|(k, _)| k.clone()).collect();
                prop_assert_eq!(keys.len(), pairs.len(), "each key yielded once");
                for (k, v) in &pairs {
                    prop_assert_eq!(model.get(k), Some(v));
                }
            }
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        check_structure(&sut)?;
    }
    for (k, v) in &model {
        prop_assert_eq!(sut.get(k), Some(v));
    }
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - get/contains/remove agree with the model; overwrites keep len.
// - `len` counts Occupied slots and `tombstones` counts Tombstone slots.
// - Load stays at or under 3/4 and an Empty slot always remains.
// - Any resize leaves zero tombstones; removal never resizes.
// - Iteration yields exactly the live entries, each once.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run(RawTable::<String, i32>::new(), pool, ops)?;
    }
}

#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: the same invariants when every key shares one home slot, so all
// probes run through long chains of occupied slots and tombstones.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run(RawTable::with_binding(StdBinding::new(ConstBuildHasher)), pool, ops)?;
    }
}

// Property: a table pre-sized for n entries absorbs n distinct inserts
// without changing capacity.
proptest! {
    #[test]
    fn prop_presized_never_resizes(n in 0usize..3000) {
        let mut t: RawTable<usize, usize> = RawTable::with_capacity(n);
        let cap = t.capacity();
        for k in 0..n {
            t.insert(k, k);
        }
        prop_assert_eq!(t.capacity(), cap);
        prop_assert_eq!(t.len(), n);
    }
}

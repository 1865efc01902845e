#![cfg(test)]

// Property tests for ChainedHashMap kept inside the crate so they can see
// bucket existence and arena occupancy.

use crate::chained_hash_map::{ChainedHashMap, DEFAULT_CAPACITY, LOAD_FACTOR_THRESHOLD};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::fmt;
use std::hash::{Hash, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Every value hashes identically, so all entries share one chain.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
struct Clash(String);
impl Hash for Clash {
    fn hash<H: Hasher>(&self, _state: &mut H) {}
}

#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    Lookup(usize),
    Clear,
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => idx.clone().prop_map(OpI::Remove),
            3 => idx.clone().prop_map(OpI::Lookup),
            1 => Just(OpI::Clear),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

/// Bucket-level reference: chains stored head first, indices taken from
/// the table under test once it has settled on its capacity.
struct Model<K> {
    buckets: Vec<Option<Vec<(K, i32)>>>,
    size: usize,
}

impl<K: Clone + Eq + Hash> Model<K> {
    fn new() -> Self {
        Self {
            buckets: vec![None; DEFAULT_CAPACITY],
            size: 0,
        }
    }

    fn push(&mut self, index: usize, k: K, v: i32) {
        self.buckets[index].get_or_insert_with(Vec::new).insert(0, (k, v));
        self.size += 1;
    }

    fn grow(&mut self, sut: &ChainedHashMap<K, i32>) {
        let old = std::mem::replace(&mut self.buckets, vec![None; sut.capacity()]);
        self.size = 0;
        for chain in old.into_iter().flatten() {
            for (k, v) in chain {
                let index = sut.bucket_index(&k);
                self.push(index, k, v);
            }
        }
    }

    fn lookup(&self, index: usize, k: &K) -> Option<i32> {
        self.buckets[index]
            .as_ref()?
            .iter()
            .find(|(kk, _)| kk == k)
            .map(|&(_, v)| v)
    }

    fn remove(&mut self, index: usize, k: &K) -> bool {
        match &mut self.buckets[index] {
            None => false,
            Some(chain) => {
                if let Some(p) = chain.iter().position(|(kk, _)| kk == k) {
                    chain.remove(p);
                }
                true
            }
        }
    }

    fn stored(&self) -> usize {
        self.buckets.iter().flatten().map(Vec::len).sum()
    }
}

// Property: state-machine equivalence against the bucket-level model.
// Invariants exercised across random operation sequences:
// - Growth happens exactly when the pre-insert load factor is >= 0.5 and
//   yields `2c + 1` buckets; relocation order matches the model.
// - Duplicate keys stack; lookup/remove only see the head-most match.
// - `remove` reports bucket existence, not whether a match was removed.
// - `len` is never decremented by `remove` and is recounted on growth.
// - Every node sits at its hash index; no arena node is orphaned.
fn run_scenario<K>(pool: Vec<K>, ops: Vec<OpI>) -> Result<(), TestCaseError>
where
    K: Clone + Eq + Hash + Ord + fmt::Debug,
{
    let mut sut: ChainedHashMap<K, i32> = ChainedHashMap::new();
    let mut model: Model<K> = Model::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = pool[i].clone();
                let before = sut.capacity();
                let grows = model.size as f64 / model.buckets.len() as f64 >= LOAD_FACTOR_THRESHOLD;
                sut.insert(k.clone(), v);
                if grows {
                    prop_assert_eq!(sut.capacity(), before * 2 + 1);
                    model.grow(&sut);
                } else {
                    prop_assert_eq!(sut.capacity(), before);
                }
                let index = sut.bucket_index(&k);
                model.push(index, k, v);
            }
            OpI::Remove(i) => {
                let k = &pool[i];
                let index = sut.bucket_index(k);
                let expected = model.remove(index, k);
                prop_assert_eq!(sut.remove(k), expected);
            }
            OpI::Lookup(i) => {
                let k = &pool[i];
                let index = sut.bucket_index(k);
                prop_assert_eq!(sut.lookup(k).copied(), model.lookup(index, k));
                prop_assert_eq!(sut.contains_key(k), model.lookup(index, k).is_some());
            }
            OpI::Clear => {
                sut.clear();
                model = Model::new();
            }
            OpI::Iterate => {
                let mut seen: Vec<(K, i32)> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                let mut expected: Vec<(K, i32)> =
                    model.buckets.iter().flatten().flatten().cloned().collect();
                seen.sort();
                expected.sort();
                prop_assert_eq!(seen, expected);
            }
        }

        // Post-conditions after each op
        prop_assert_eq!(sut.capacity(), model.buckets.len());
        prop_assert_eq!(sut.len(), model.size);
        prop_assert_eq!(sut.node_count(), model.stored());
        prop_assert_eq!(sut.load_factor(), model.size as f64 / model.buckets.len() as f64);
        for (index, slot) in model.buckets.iter().enumerate() {
            prop_assert_eq!(sut.bucket_exists(index), slot.is_some());
        }
        sut.assert_invariants();
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario(pool.into_iter().map(Key).collect(), ops)?;
    }
}

// Same model under worst-case collisions: every entry lands in one chain,
// so equality alone separates keys and every remove hits an existing bucket.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario(pool.into_iter().map(Clash).collect(), ops)?;
    }
}

proptest! {
    // Property: borrowed `&str` queries agree with owned-key queries.
    #[test]
    fn prop_borrowed_queries_agree(keys in proptest::collection::vec("[a-z]{1,6}", 1..30)) {
        let mut m: ChainedHashMap<Key, usize> = ChainedHashMap::new();
        for (i, k) in keys.iter().enumerate() {
            m.insert(Key(k.clone()), i);
        }
        for k in &keys {
            prop_assert_eq!(m.lookup(k.as_str()), m.lookup(&Key(k.clone())));
            prop_assert_eq!(m.bucket_index(k.as_str()), m.bucket_index(&Key(k.clone())));
        }
    }
}

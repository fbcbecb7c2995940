#![cfg(test)]

// Property tests for HashDictionary kept inside the crate so they can use
// small bucket tables and the constant hasher without extra features.

use crate::error::DictionaryError;
use crate::hash_dictionary::HashDictionary;
use core::num::NonZeroUsize;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};

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

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Add(usize, i32),
    AddAbsent(i32),
    TryGet(usize),
    Get(usize),
    Contains(String),
    Iterate,
    Buckets,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Add(i, v)),
            1 => any::<i32>().prop_map(OpI::AddAbsent),
            2 => idx.clone().prop_map(OpI::TryGet),
            2 => idx.clone().prop_map(OpI::Get),
            1 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            1 => Just(OpI::Iterate),
            1 => Just(OpI::Buckets),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Replays `ops` against the dictionary and a std HashMap model plus the
// global insertion order. Invariants checked after each op:
// - A duplicate add fails iff the model already holds the key, and never
//   changes the stored value.
// - An absent key is always rejected with InvalidKey.
// - try_get_value/get/contains_key agree with the model; misses yield 0.
// - iter yields exactly the model's key set.
// - Each bucket's chain lists its keys in global insertion order.
// - len/is_empty parity with the model.
fn run<S: BuildHasher>(
    mut sut: HashDictionary<Key, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Key, i32> = HashMap::new();
    let mut order: Vec<Key> = Vec::new();

    for op in ops {
        match op {
            OpI::Add(i, v) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                match sut.add(k.clone(), v) {
                    Ok(()) => {
                        prop_assert!(!already, "add must fail on duplicate");
                        model.insert(k.clone(), v);
                        order.push(k);
                    }
                    Err(DictionaryError::DuplicateKey) => {
                        prop_assert!(already, "duplicate error only when key exists");
                        prop_assert_eq!(sut.get(&k), model.get(&k));
                    }
                    Err(e) => {
                        prop_assert!(false, "unexpected error {:?}", e);
                    }
                }
            }
            OpI::AddAbsent(v) => {
                prop_assert_eq!(sut.add(None, v), Err(DictionaryError::InvalidKey));
            }
            OpI::TryGet(i) => {
                let k = key_from(pool, i);
                let expected = match model.get(&k) {
                    Some(&v) => (true, v),
                    None => (false, 0),
                };
                prop_assert_eq!(sut.try_get_value(&k), Ok(expected));
                // Repeated lookups are stable.
                prop_assert_eq!(sut.try_get_value(&k), Ok(expected));
            }
            OpI::Get(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.get(&k), model.get(&k));
            }
            OpI::Contains(s) => {
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
            }
            OpI::Iterate => {
                let s_keys: BTreeSet<_> = sut.iter().map(|(k, _)| k.clone()).collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
            }
            OpI::Buckets => {
                for (b, chain) in sut.buckets().enumerate() {
                    let got: Vec<Key> = chain.map(|(k, _)| k.clone()).collect();
                    let want: Vec<Key> = order
                        .iter()
                        .filter(|k| sut.index_of(*k) == b)
                        .cloned()
                        .collect();
                    prop_assert_eq!(got, want);
                }
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run(HashDictionary::new(), &pool, ops)?;
    }

    // Few buckets force long chains with mixed hashes per bucket.
    #[test]
    fn prop_state_machine_small_table((pool, ops) in arb_scenario(), n in 1usize..4) {
        let buckets = NonZeroUsize::new(n).unwrap();
        run(HashDictionary::with_buckets(buckets), &pool, ops)?;
    }
}

// Collision variant using a constant hasher: every key shares bucket 0.
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

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let sut: HashDictionary<Key, i32, _> = HashDictionary::with_hasher(ConstBuildHasher);
        prop_assert!(sut.buckets().skip(1).all(|c| c.is_empty()));
        run(sut, &pool, ops)?;
    }
}

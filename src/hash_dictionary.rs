//! HashDictionary: fixed bucket table with separately chained entries.

use crate::chain::{self, Arena, Cell, Chain, Probe};
use crate::error::DictionaryError;
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::num::NonZeroUsize;
use hashbrown::hash_map::DefaultHashBuilder;
use slotmap::DefaultKey;

/// Bucket count used by `new` and `with_hasher`.
pub const DEFAULT_BUCKETS: usize = 23;

const DEFAULT_BUCKET_COUNT: NonZeroUsize = match NonZeroUsize::new(DEFAULT_BUCKETS) {
    Some(n) => n,
    None => panic!("DEFAULT_BUCKETS must be non-zero"),
};

// Clears the top bit so the reduced hash is always a valid non-negative code.
const SIGN_MASK: u64 = 0x7fff_ffff_ffff_ffff;

/// A dictionary of unique keys backed by a table of `bucket_count()` chains.
///
/// The table never grows. Each bucket's chain keeps its entries in insertion
/// order, and lookups only walk the chain of the key's own bucket.
pub struct HashDictionary<K, V, S = DefaultHashBuilder> {
    hasher: S,
    heads: Box<[Option<DefaultKey>]>,
    cells: Arena<K, V>,
    reentrancy: DebugReentrancy,
}

impl<K, V> HashDictionary<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_buckets(buckets: NonZeroUsize) -> Self {
        Self::with_buckets_and_hasher(buckets, Default::default())
    }
}

impl<K, V> Default for HashDictionary<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> HashDictionary<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_buckets_and_hasher(DEFAULT_BUCKET_COUNT, hasher)
    }

    pub fn with_buckets_and_hasher(buckets: NonZeroUsize, hasher: S) -> Self {
        log::trace!("HashDictionary created with {} buckets", buckets);
        Self {
            hasher,
            heads: vec![None; buckets.get()].into_boxed_slice(),
            cells: Arena::new(),
            reentrancy: DebugReentrancy::new(),
        }
    }

    fn slot<Q>(&self, q: &Q) -> usize
    where
        Q: ?Sized + Hash,
    {
        let hash = self.hasher.hash_one(q) & SIGN_MASK;
        // `heads` is never empty, so the modulus is non-zero.
        (hash % self.heads.len() as u64) as usize
    }

    /// Bucket index in `0..bucket_count()` that `key` maps to.
    pub fn index_of<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash,
    {
        let _g = self.reentrancy.enter();
        self.slot(key)
    }

    fn find<Q>(&self, q: &Q) -> Option<&Cell<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let head = self.heads[self.slot(q)];
        match chain::probe(&self.cells, head, q) {
            Probe::Found(k) => self.cells.get(k),
            Probe::Vacant { .. } => None,
        }
    }

    /// Looks `key` up, returning whether it was found together with its value
    /// or `V::default()` when absent.
    ///
    /// A `None` key is rejected with `DictionaryError::InvalidKey`.
    pub fn try_get_value<'q>(
        &self,
        key: impl Into<Option<&'q K>>,
    ) -> Result<(bool, V), DictionaryError>
    where
        K: 'q,
        V: Clone + Default,
    {
        let key = key.into().ok_or(DictionaryError::InvalidKey)?;
        let _g = self.reentrancy.enter();
        Ok(match self.find(key) {
            Some(cell) => (true, cell.value.clone()),
            None => (false, V::default()),
        })
    }

    /// Stores `key -> value`.
    ///
    /// Fails with `InvalidKey` for a `None` key and with `DuplicateKey` when an
    /// equal key is already present; in both cases nothing is linked and the
    /// rejected key and value are dropped.
    pub fn add(&mut self, key: impl Into<Option<K>>, value: V) -> Result<(), DictionaryError> {
        let Some(key) = key.into() else {
            log::debug!("HashDictionary::add rejected an absent key");
            return Err(DictionaryError::InvalidKey);
        };
        let _g = self.reentrancy.enter();
        let index = self.slot(&key);
        let tail = match chain::probe(&self.cells, self.heads[index], &key) {
            Probe::Found(_) => {
                log::debug!("HashDictionary::add rejected a duplicate key in bucket {index}");
                return Err(DictionaryError::DuplicateKey);
            }
            Probe::Vacant { tail } => tail,
        };
        let cell = self.cells.insert(Cell {
            key,
            value,
            next: None,
        });
        chain::link(&mut self.cells, &mut self.heads[index], tail, cell);
        log::trace!(
            "HashDictionary::add linked a new entry into bucket {index} ({} entries)",
            self.cells.len()
        );
        Ok(())
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        self.find(key).map(|cell| &cell.value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        self.find(key).is_some()
    }
}

impl<K, V, S> HashDictionary<K, V, S> {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of buckets, fixed at construction.
    pub fn bucket_count(&self) -> usize {
        self.heads.len()
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// The chain stored in bucket `index`, or `None` if `index` is out of
    /// range.
    pub fn bucket(&self, index: usize) -> Option<Chain<'_, K, V>> {
        let head = *self.heads.get(index)?;
        Some(Chain::new(&self.cells, head))
    }

    /// Every bucket in table order, empty ones included.
    pub fn buckets(&self) -> Buckets<'_, K, V> {
        Buckets {
            cells: &self.cells,
            heads: self.heads.iter(),
        }
    }

    /// All entries, bucket by bucket, each bucket in insertion order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets(),
            chain: None,
        }
    }
}

/// Iterator over the buckets of a `HashDictionary`, see
/// [`HashDictionary::buckets`].
pub struct Buckets<'a, K, V> {
    cells: &'a Arena<K, V>,
    heads: core::slice::Iter<'a, Option<DefaultKey>>,
}

impl<'a, K, V> Iterator for Buckets<'a, K, V> {
    type Item = Chain<'a, K, V>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let &head = self.heads.next()?;
        Some(Chain::new(self.cells, head))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.heads.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Buckets<'_, K, V> {}

impl<K, V> Clone for Buckets<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            cells: self.cells,
            heads: self.heads.clone(),
        }
    }
}

// Lists only occupied buckets, keyed by their index.
impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Buckets<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.clone().enumerate().filter(|(_, c)| !c.is_empty()))
            .finish()
    }
}

/// Iterator over the entries of a `HashDictionary`, see
/// [`HashDictionary::iter`].
pub struct Iter<'a, K, V> {
    buckets: Buckets<'a, K, V>,
    chain: Option<Chain<'a, K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.chain.as_mut().and_then(Iterator::next) {
                return Some(entry);
            }
            self.chain = Some(self.buckets.next()?);
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashDictionary<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for HashDictionary<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity_hash::BuildIdentityHasher;
    use std::collections::BTreeSet;
    use std::hash::Hasher;

    fn identity<K: Eq + Hash, V>() -> HashDictionary<K, V, BuildIdentityHasher> {
        HashDictionary::with_hasher(BuildIdentityHasher)
    }

    /// Invariant: a fresh dictionary has the default bucket count and no entries.
    #[test]
    fn new_dictionary_is_empty() {
        let d: HashDictionary<String, i32> = HashDictionary::new();
        assert_eq!(d.bucket_count(), DEFAULT_BUCKETS);
        assert_eq!(d.len(), 0);
        assert!(d.is_empty());
        assert!(d.buckets().all(|c| c.is_empty()));
        assert_eq!(d.iter().count(), 0);
    }

    /// Invariant: the index is the masked hash modulo the table length.
    #[test]
    fn index_of_reduces_modulo_bucket_count() {
        let d: HashDictionary<u64, (), _> = identity();
        assert_eq!(d.index_of(&0), 0);
        assert_eq!(d.index_of(&22), 22);
        assert_eq!(d.index_of(&23), 0);
        assert_eq!(d.index_of(&700), 700 % 23);
        assert_eq!(d.index_of(&700), d.index_of(&723));
        assert_eq!(d.index_of(&723), d.index_of(&746));
        // The top bit is masked before reduction.
        assert_eq!(d.index_of(&u64::MAX), (SIGN_MASK % 23) as usize);
    }

    /// Invariant: every index is in range for arbitrary hashers and table sizes.
    #[test]
    fn index_of_is_always_in_range() {
        for n in [1usize, 2, 7, 23, 64] {
            let d: HashDictionary<String, ()> =
                HashDictionary::with_buckets(NonZeroUsize::new(n).unwrap());
            for i in 0..200 {
                assert!(d.index_of(&format!("k{i}")) < n);
            }
        }
    }

    /// Invariant: a single-bucket table puts every key on one chain and still
    /// resolves each one.
    #[test]
    fn single_bucket_table_chains_everything() {
        let mut d: HashDictionary<String, usize> =
            HashDictionary::with_buckets(NonZeroUsize::new(1).unwrap());
        for i in 0..50 {
            d.add(format!("k{i}"), i).unwrap();
        }
        assert_eq!(d.bucket(0).unwrap().count(), 50);
        for i in 0..50 {
            assert_eq!(d.get(format!("k{i}").as_str()), Some(&i));
        }
    }

    /// Invariant: duplicate keys are rejected and the stored value is kept.
    #[test]
    fn duplicate_add_rejected() {
        let mut d: HashDictionary<i32, &str> = HashDictionary::new();
        d.add(4, "four").unwrap();
        assert_eq!(d.add(4, "again"), Err(DictionaryError::DuplicateKey));
        assert_eq!(d.try_get_value(&4), Ok((true, "four")));
        assert_eq!(d.len(), 1);
    }

    /// Invariant: absent keys are rejected by both core operations without
    /// touching the table.
    #[test]
    fn absent_key_rejected() {
        let mut d: HashDictionary<String, i32> = HashDictionary::new();
        assert_eq!(d.add(None, 1), Err(DictionaryError::InvalidKey));
        assert_eq!(d.try_get_value(None), Err(DictionaryError::InvalidKey));
        assert!(d.is_empty());

        d.add(Some("k".to_string()), 2).unwrap();
        assert_eq!(d.try_get_value(Some(&"k".to_string())), Ok((true, 2)));
        assert_eq!(d.try_get_value(None), Err(DictionaryError::InvalidKey));
        assert_eq!(d.len(), 1);
    }

    /// Invariant: misses report `false` with the value type's default.
    #[test]
    fn missing_key_yields_default() {
        let mut d: HashDictionary<String, i32> = HashDictionary::new();
        assert_eq!(d.try_get_value(&"key".to_string()), Ok((false, 0)));
        d.add("other".to_string(), 9).unwrap();
        assert_eq!(d.try_get_value(&"key".to_string()), Ok((false, 0)));
        assert_eq!(d.get("key"), None);
        assert!(!d.contains_key("key"));
    }

    /// Invariant: borrowed lookup works (store `String`, query with `&str`).
    #[test]
    fn borrowed_lookup_with_str() {
        let mut d: HashDictionary<String, i32> = HashDictionary::new();
        d.add("hello".to_string(), 1).unwrap();
        assert!(d.contains_key("hello"));
        assert!(!d.contains_key("world"));
        assert_eq!(d.get("hello"), Some(&1));
        assert_eq!(d.index_of("hello"), d.index_of(&"hello".to_string()));
    }

    /// Invariant: colliding keys are appended, so a bucket's chain lists them
    /// in insertion order.
    #[test]
    fn chain_preserves_insertion_order() {
        let mut d: HashDictionary<u32, i32, _> = identity();
        d.add(700u32, 1).unwrap();
        d.add(5u32, 0).unwrap();
        d.add(723u32, 2).unwrap();
        d.add(746u32, 3).unwrap();
        let slot = d.index_of(&700);
        let chain: Vec<_> = d.bucket(slot).unwrap().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(chain, vec![(700, 1), (723, 2), (746, 3)]);
        assert_eq!(d.try_get_value(&723), Ok((true, 2)));
    }

    /// Invariant: `bucket` is `None` past the end of the table.
    #[test]
    fn bucket_out_of_range_is_none() {
        let d: HashDictionary<u32, i32> = HashDictionary::new();
        assert!(d.bucket(DEFAULT_BUCKETS - 1).is_some());
        assert!(d.bucket(DEFAULT_BUCKETS).is_none());
        assert_eq!(d.buckets().len(), DEFAULT_BUCKETS);
    }

    /// Invariant: iteration yields each entry once, grouped by bucket.
    #[test]
    fn iter_visits_every_entry_once() {
        let mut d: HashDictionary<u32, u32, _> = identity();
        for k in [1u32, 24, 2, 47, 3] {
            d.add(k, k * 10).unwrap();
        }
        let order: Vec<u32> = d.iter().map(|(k, _)| *k).collect();
        assert_eq!(order, vec![1, 24, 47, 2, 3]);
        let seen: BTreeSet<u32> = (&d).into_iter().map(|(k, _)| *k).collect();
        assert_eq!(seen, BTreeSet::from([1, 2, 3, 24, 47]));
        assert!(d.iter().all(|(k, v)| *v == *k * 10));
    }

    /// Invariant: `Debug` renders entries as a map and buckets by index.
    #[test]
    fn debug_output() {
        let mut d: HashDictionary<u32, &str, _> = identity();
        d.add(1u32, "one").unwrap();
        d.add(24u32, "twenty-four").unwrap();
        assert_eq!(format!("{:?}", d), r#"{1: "one", 24: "twenty-four"}"#);
        assert_eq!(
            format!("{:?}", d.buckets()),
            r#"{1: [(1, "one"), (24, "twenty-four")]}"#
        );
    }

    /// Invariant (debug-only): calling back into the dictionary from `K: Eq`
    /// while a chain is being walked panics.
    #[cfg(debug_assertions)]
    #[test]
    fn reentrancy_panics_from_eq_during_lookup() {
        struct ReentryKey {
            id: u32,
            dict: *const HashDictionary<ReentryKey, i32, BuildIdentityHasher>,
        }
        impl PartialEq for ReentryKey {
            fn eq(&self, other: &Self) -> bool {
                if !other.dict.is_null() {
                    unsafe {
                        let d = &*other.dict;
                        let _ = d.len();
                        let _ = d.index_of(&ReentryKey {
                            id: 0,
                            dict: core::ptr::null(),
                        });
                    }
                }
                self.id == other.id
            }
        }
        impl Eq for ReentryKey {}
        impl Hash for ReentryKey {
            fn hash<H: Hasher>(&self, state: &mut H) {
                state.write_u32(0);
            }
        }

        let mut d: HashDictionary<ReentryKey, i32, _> = identity();
        d.add(
            ReentryKey {
                id: 1,
                dict: core::ptr::null(),
            },
            1,
        )
        .unwrap();
        let query = ReentryKey {
            id: 2,
            dict: &d as *const _,
        };
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = d.contains_key(&query);
        }));
        assert!(res.is_err(), "expected reentrancy to panic in debug builds");
    }
}

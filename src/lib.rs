//! chain-dict: a single-threaded dictionary of unique keys backed by a
//! fixed-size table of separately chained buckets.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: the smallest hash dictionary whose bucket layout is fully
//!   observable, so that collision handling can be inspected and tested.
//! - Pieces:
//!   - `chain`: cells stored in a `SlotMap` arena, linked through
//!     `Option<DefaultKey>` handles into one singly linked chain per bucket.
//!     Holds the chain walk shared by lookup and duplicate detection.
//!   - `HashDictionary<K, V, S>`: the bucket table (boxed slice of chain
//!     heads), index computation, `add`/`try_get_value` and read-only views.
//!   - `IdentityHasher`: optional pass-through `BuildHasher` for keys that
//!     carry their own hash code.
//!
//! Constraints
//! - Single-threaded: `!Send`/`!Sync` (enforced by the reentrancy marker).
//! - Table length is fixed at construction (default 23) and non-zero by
//!   type, so index reduction never divides by zero.
//! - Unique keys: `add` scans the key's chain with `K: Eq` and rejects a
//!   match with `DictionaryError::DuplicateKey`, leaving the table
//!   untouched.
//! - Insertion order within a bucket is preserved: new cells are linked at
//!   the tail.
//! - Not-found is an ordinary outcome (`(false, V::default())` or `None`),
//!   never an error.
//!
//! Absent keys
//! - `add` and `try_get_value` take `impl Into<Option<..>>`. Passing a key
//!   works as usual; passing `None` is the absent key and fails with
//!   `DictionaryError::InvalidKey` before anything is hashed.
//!
//! Index computation
//! - `index_of(k) = (S::hash_one(k) & 0x7fff_ffff_ffff_ffff) % bucket_count`.
//!   Equal keys must hash equally; the dictionary relies on this contract
//!   but does not check it. Chain matching uses `K: Eq` only, so keys with
//!   different hashes in the same bucket are still compared.
//!
//! Reentrancy
//! - Every entry point that runs `K: Hash`/`K: Eq` holds a debug-only
//!   guard; calling back into the same dictionary from those impls panics
//!   in debug builds.
//!
//! Notes and non-goals
//! - No resizing or rehashing. A growth policy would slot in at `add`,
//!   relinking every cell into a larger head table.
//! - No removal; cells live as long as the dictionary.
//! - Iteration order is bucket order, then chain order.

mod chain;
mod error;
mod hash_dictionary;
mod hash_dictionary_proptest;
pub mod identity_hash;
mod reentrancy;

// Public surface
pub use chain::Chain;
pub use error::DictionaryError;
pub use hash_dictionary::{Buckets, HashDictionary, Iter, DEFAULT_BUCKETS};
pub use identity_hash::{BuildIdentityHasher, IdentityHasher};

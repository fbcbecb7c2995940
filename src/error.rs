//! Errors reported by `HashDictionary` operations.

use thiserror::Error;

/// Failure of a dictionary operation. Both variants leave the dictionary
/// exactly as it was before the call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictionaryError {
    /// The key was absent (`None`).
    #[error("key must not be absent")]
    InvalidKey,
    /// `add` was given a key equal to one already stored.
    #[error("an entry with the same key already exists")]
    DuplicateKey,
}

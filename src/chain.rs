//! Chain cells and the arena that owns them.
//!
//! Every entry lives in one `SlotMap` slot. A bucket head points at the first
//! cell of its chain and each cell points at the next one, so a chain is a
//! singly linked list threaded through the arena. Cells are only ever
//! appended, which keeps each chain in insertion order.

use core::borrow::Borrow;
use core::fmt;
use slotmap::{DefaultKey, SlotMap};

#[derive(Debug)]
pub(crate) struct Cell<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) next: Option<DefaultKey>,
}

pub(crate) type Arena<K, V> = SlotMap<DefaultKey, Cell<K, V>>;

/// Outcome of scanning one chain for a key.
pub(crate) enum Probe {
    /// A cell whose key compared equal.
    Found(DefaultKey),
    /// No match; carries the last cell of the chain (`None` if empty) so an
    /// insert can link after it without a second walk.
    Vacant { tail: Option<DefaultKey> },
}

/// Walks the chain starting at `head`, comparing with `K: Eq` in chain
/// order. Only equality decides a match; two keys in the same bucket with
/// different hashes are still compared.
pub(crate) fn probe<K, V, Q>(arena: &Arena<K, V>, head: Option<DefaultKey>, q: &Q) -> Probe
where
    K: Borrow<Q>,
    Q: ?Sized + Eq,
{
    let mut tail = None;
    let mut cur = head;
    while let Some(k) = cur {
        let Some(cell) = arena.get(k) else {
            debug_assert!(false, "chain links a cell that is not in the arena");
            break;
        };
        if cell.key.borrow() == q {
            return Probe::Found(k);
        }
        tail = Some(k);
        cur = cell.next;
    }
    Probe::Vacant { tail }
}

/// Links `cell` after `tail`, or makes it the bucket head when the chain was
/// empty. `tail` must be the last cell returned by `probe` for this bucket.
pub(crate) fn link<K, V>(
    arena: &mut Arena<K, V>,
    head: &mut Option<DefaultKey>,
    tail: Option<DefaultKey>,
    cell: DefaultKey,
) {
    match tail {
        Some(t) => match arena.get_mut(t) {
            Some(last) => {
                debug_assert!(last.next.is_none(), "chain tail already has a successor");
                last.next = Some(cell);
            }
            None => debug_assert!(false, "chain tail is not in the arena"),
        },
        None => *head = Some(cell),
    }
}

/// Read-only view of one bucket's chain. Iterates `(&K, &V)` in chain
/// (insertion) order.
pub struct Chain<'a, K, V> {
    arena: &'a Arena<K, V>,
    cur: Option<DefaultKey>,
}

impl<'a, K, V> Chain<'a, K, V> {
    pub(crate) fn new(arena: &'a Arena<K, V>, head: Option<DefaultKey>) -> Self {
        Self { arena, cur: head }
    }

    /// True when the bucket holds no entries.
    pub fn is_empty(&self) -> bool {
        self.cur.is_none()
    }
}

impl<'a, K, V> Iterator for Chain<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let cell = self.arena.get(self.cur?)?;
        self.cur = cell.next;
        Some((&cell.key, &cell.value))
    }
}

impl<K, V> Clone for Chain<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            arena: self.arena,
            cur: self.cur,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Chain<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

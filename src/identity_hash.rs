//! Pass-through hashing for keys that already carry a hash code.
//!
//! `IdentityHasher` returns the integer written to it unchanged, so a
//! key whose `Hash` impl writes a single integer lands in bucket
//! `code % bucket_count`. This makes bucket placement predictable, which is
//! what structure viewers and collision tests need. Byte writes (strings,
//! slices) are folded with FNV-1a so any key type still hashes. Signed codes
//! have their sign bit cleared at their own width first, so a negative `i32`
//! code `c` lands in bucket `(c & 0x7fff_ffff) % bucket_count`.

use core::hash::{BuildHasher, Hasher};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Hasher that passes the first integer written to it through untouched.
/// Anything written after that, and any byte-slice write, is folded in with
/// FNV-1a.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityHasher {
    hash: u64,
    written: bool,
}

impl IdentityHasher {
    #[inline]
    fn put(&mut self, i: u64) {
        if self.written {
            self.fold(&i.to_le_bytes());
        } else {
            self.hash = i;
            self.written = true;
        }
    }

    fn fold(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.hash ^= u64::from(b);
            self.hash = self.hash.wrapping_mul(FNV_PRIME);
        }
    }
}

impl Hasher for IdentityHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        if !self.written {
            self.hash = FNV_OFFSET;
            self.written = true;
        }
        self.fold(bytes);
    }

    #[inline]
    fn write_u8(&mut self, i: u8) {
        self.put(u64::from(i));
    }

    #[inline]
    fn write_u16(&mut self, i: u16) {
        self.put(u64::from(i));
    }

    #[inline]
    fn write_u32(&mut self, i: u32) {
        self.put(u64::from(i));
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.put(i);
    }

    #[inline]
    fn write_usize(&mut self, i: usize) {
        self.put(i as u64);
    }

    // Signed writes drop their sign bit at their own width, so a negative
    // code `c` becomes `c & MAX` (e.g. `-1i32` -> `0x7fff_ffff`).
    #[inline]
    fn write_i8(&mut self, i: i8) {
        self.write_u8((i & i8::MAX) as u8);
    }

    #[inline]
    fn write_i16(&mut self, i: i16) {
        self.write_u16((i & i16::MAX) as u16);
    }

    #[inline]
    fn write_i32(&mut self, i: i32) {
        self.write_u32((i & i32::MAX) as u32);
    }

    #[inline]
    fn write_i64(&mut self, i: i64) {
        self.write_u64((i & i64::MAX) as u64);
    }

    #[inline]
    fn write_isize(&mut self, i: isize) {
        self.write_usize((i & isize::MAX) as usize);
    }
}

/// `BuildHasher` producing fresh `IdentityHasher`s.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuildIdentityHasher;

impl BuildHasher for BuildIdentityHasher {
    type Hasher = IdentityHasher;

    #[inline]
    fn build_hasher(&self) -> IdentityHasher {
        IdentityHasher::default()
    }
}

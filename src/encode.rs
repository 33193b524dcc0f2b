//! K-mer encoding: 2-bit mapping, reverse complement, canonicalization and slots.
//!
//! Conventions
//! - Bases fold **most-significant first**: the first base of a window lands in
//!   the top two of the low `2k` bits.
//! - A=00, C=01, T=10, G=11, so the complement of a code is `code ^ 0b10`.
//! - The canonical value of a k-mer is `min(value, revcomp(value))`.
//! - A *slot* is the dense index of a canonical class in `[0, 2^(2k-1))`; it is
//!   how counters and solid maps address their storage.

use crate::error::{Error, Result};

/// 256-entry LUT: ASCII → 2-bit (A=0, C=1, T=2, G=3), 0xFF for anything else.
pub static MAP_LUT: [u8; 256] = {
    const X: u8 = 0xFF;
    let mut t = [X; 256];
    t[b'A' as usize] = 0;
    t[b'C' as usize] = 1;
    t[b'T' as usize] = 2;
    t[b'G' as usize] = 3;
    t
};

/// Inverse of [`MAP_LUT`].
pub const BASES: [u8; 4] = [b'A', b'C', b'T', b'G'];

/// XOR with this complements every base of a word.
const COMP_MASK: u64 = 0xAAAA_AAAA_AAAA_AAAA;

/// Largest k a `u64` can hold.
pub const MAX_K: u8 = 32;

/// Map one base to its 2-bit code.
#[inline]
pub fn nuc_to_bit(base: u8) -> Result<u64> {
    match MAP_LUT[base as usize] {
        v if v <= 3 => Ok(v as u64),
        _ => Err(Error::invalid_base(base)),
    }
}

/// Encode the first `k` bases of `seq`.
pub fn seq_to_value(seq: &[u8], k: u8) -> Result<u64> {
    check_k(k)?;
    if seq.len() < k as usize {
        return Err(Error::InvalidK(format!(
            "sequence of length {} is shorter than k={k}",
            seq.len()
        )));
    }
    let mut value: u64 = 0;
    for &b in &seq[..k as usize] {
        value = (value << 2) | nuc_to_bit(b)?;
    }
    Ok(value)
}

/// Decode a `k`-mer value back to its sequence.
pub fn value_to_seq(mut value: u64, k: u8) -> String {
    debug_assert!(k >= 1 && k <= MAX_K);
    let mut out = vec![0u8; k as usize];
    for base in out.iter_mut().rev() {
        *base = BASES[(value & 0b11) as usize];
        value >>= 2;
    }
    // BASES is ASCII
    out.into_iter().map(char::from).collect()
}

/// Reverse-complement a value over `k` bases (lower `2k` bits used).
#[inline]
pub fn revcomp(value: u64, k: u8) -> u64 {
    debug_assert!(k >= 1 && k <= MAX_K);
    let mut x = value ^ COMP_MASK;
    // reverse the 32 two-bit groups of the word
    x = ((x >> 2) & 0x3333_3333_3333_3333) | ((x & 0x3333_3333_3333_3333) << 2);
    x = ((x >> 4) & 0x0F0F_0F0F_0F0F_0F0F) | ((x & 0x0F0F_0F0F_0F0F_0F0F) << 4);
    x = x.swap_bytes();
    x >> (64 - 2 * k as u32)
}

/// Canonical form: the smaller of a value and its reverse complement.
#[inline]
pub fn canonical(value: u64, k: u8) -> u64 {
    value.min(revcomp(value, k))
}

/// Number of canonical classes for an odd `k`: `2^(2k-1)`.
#[inline]
pub fn kmer_space_size(k: u8) -> u64 {
    1u64 << (2 * k as u32 - 1)
}

/// Largest raw value for `k`: `4^k - 1`.
#[inline]
pub fn max_value(k: u8) -> u64 {
    if k >= MAX_K {
        u64::MAX
    } else {
        (1u64 << (2 * k as u32)) - 1
    }
}

/// Dense storage index of the canonical class containing `value`.
#[inline]
pub fn slot(value: u64, k: u8) -> u64 {
    slot_of_pair(value, revcomp(value, k), k)
}

/// Same as [`slot`] when the reverse complement is already known.
///
/// For odd `k` the middle bases of `fwd` and `rc` are complements, so bit `k`
/// (high bit of the middle code) is clear in exactly one of them. Dropping that
/// bit from that one gives a bijection onto `[0, 2^(2k-1))`.
#[inline]
pub fn slot_of_pair(fwd: u64, rc: u64, k: u8) -> u64 {
    debug_assert!(k % 2 == 1);
    let k = k as u32;
    let v = if (fwd >> k) & 1 == 0 { fwd } else { rc };
    ((v >> (k + 1)) << k) | (v & ((1u64 << k) - 1))
}

/// `k` accepted by the pure codec functions.
pub fn check_k(k: u8) -> Result<()> {
    if k == 0 || k > MAX_K {
        return Err(Error::InvalidK(format!("k={k} is outside [1, {MAX_K}]")));
    }
    Ok(())
}

/// `k` accepted by slot-addressed storage: valid and odd.
pub fn check_storage_k(k: u8) -> Result<()> {
    check_k(k)?;
    if k % 2 == 0 {
        return Err(Error::InvalidK(format!(
            "k={k} is even, canonical k-mers only fill 2^(2k-1) slots for odd k"
        )));
    }
    Ok(())
}

/// Iterator over every window of `k` valid bases, in O(1) per base.
///
/// Yields `(start, forward, reverse_complement)`. An invalid base resets the
/// window, so counting resumes `k` bases after it.
pub struct RollingKmers<'a> {
    seq: &'a [u8],
    k: usize,
    mask: u64,
    rc_shift: u32,
    fwd: u64,
    rc: u64,
    len: usize,
    pos: usize,
}

impl<'a> RollingKmers<'a> {
    pub fn new(seq: &'a [u8], k: u8) -> Self {
        debug_assert!(k >= 1 && k <= MAX_K);
        Self {
            seq,
            k: k as usize,
            mask: max_value(k),
            rc_shift: 2 * (k as u32 - 1),
            fwd: 0,
            rc: 0,
            len: 0,
            pos: 0,
        }
    }
}

impl Iterator for RollingKmers<'_> {
    type Item = (usize, u64, u64);

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.seq.len() {
            let v_raw = MAP_LUT[self.seq[self.pos] as usize];
            self.pos += 1;
            if v_raw > 3 {
                self.fwd = 0;
                self.rc = 0;
                self.len = 0;
                continue;
            }
            let v = v_raw as u64;
            self.fwd = ((self.fwd << 2) | v) & self.mask;
            self.rc = (self.rc >> 2) | ((v ^ 0b10) << self.rc_shift);
            self.len += 1;
            if self.len >= self.k {
                return Some((self.pos - self.k, self.fwd, self.rc));
            }
        }
        None
    }
}

/// Canonical values `[0, 4^k)` in ascending order, one per strand pair.
pub fn canonical_values(k: u8) -> impl Iterator<Item = u64> {
    (0..=max_value(k)).filter(move |&v| v <= revcomp(v, k))
}

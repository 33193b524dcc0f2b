//! Fixed-width fields packed back to back in a byte buffer.
//!
//! Field `i` of width `w` occupies bits `[i*w, (i+1)*w)`; bit `j` of the buffer
//! is bit `j % 8` of byte `j / 8` (LSB-first). A field of up to 32 bits spans
//! at most 5 bytes.

use crate::error::{Error, Result};

/// Widest supported field.
pub const MAX_WIDTH: u8 = 32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PackedArray {
    width: u8,
    len: u64,
    data: Vec<u8>,
}

impl PackedArray {
    /// Zeroed array of `len` fields of `width` bits in `bytes` bytes.
    pub(crate) fn zeroed(len: u64, width: u8, bytes: u64) -> Result<Self> {
        debug_assert!(width >= 1 && width <= MAX_WIDTH);
        debug_assert!(bytes as u128 * 8 >= len as u128 * width as u128);
        let n = usize::try_from(bytes)
            .map_err(|_| Error::InvalidK(format!("{bytes} bytes exceed the address space")))?;
        let mut data = Vec::new();
        data.try_reserve_exact(n)
            .map_err(|e| Error::InvalidK(format!("cannot allocate {bytes} bytes: {e}")))?;
        data.resize(n, 0);
        Ok(Self { width, len, data })
    }

    #[inline]
    pub(crate) fn width(&self) -> u8 {
        self.width
    }

    #[inline]
    pub(crate) fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    fn mask(&self) -> u64 {
        (1u64 << self.width) - 1
    }

    /// Largest value a field can hold.
    #[inline]
    pub(crate) fn max_value(&self) -> u32 {
        self.mask() as u32
    }

    /// (first byte, bit shift inside it, number of bytes touched)
    #[inline]
    fn locate(&self, index: u64) -> (usize, u32, usize) {
        debug_assert!(index < self.len);
        let bit = index * self.width as u64;
        let shift = (bit % 8) as u32;
        let nbytes = (shift as usize + self.width as usize).div_ceil(8);
        ((bit / 8) as usize, shift, nbytes)
    }

    #[inline]
    pub(crate) fn get(&self, index: u64) -> u32 {
        let (start, shift, nbytes) = self.locate(index);
        let mut acc: u64 = 0;
        for (i, &b) in self.data[start..start + nbytes].iter().enumerate() {
            acc |= (b as u64) << (8 * i);
        }
        ((acc >> shift) & self.mask()) as u32
    }

    /// Store `value`, clamped to the field range.
    #[inline]
    pub(crate) fn set(&mut self, index: u64, value: u32) {
        let mask = self.mask();
        let value = (value as u64).min(mask);
        let (start, shift, nbytes) = self.locate(index);
        let bytes = &mut self.data[start..start + nbytes];
        let mut acc: u64 = 0;
        for (i, &b) in bytes.iter().enumerate() {
            acc |= (b as u64) << (8 * i);
        }
        acc &= !(mask << shift);
        acc |= value << shift;
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = (acc >> (8 * i)) as u8;
        }
    }

    /// Saturating +1. Returns the stored value.
    #[inline]
    pub(crate) fn increment(&mut self, index: u64) -> u32 {
        let cur = self.get(index);
        if cur < self.max_value() {
            self.set(index, cur + 1);
            cur + 1
        } else {
            cur
        }
    }

    #[inline]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

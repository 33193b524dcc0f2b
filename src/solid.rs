//! Solid map: one bit per canonical k-mer, set when its count reached a threshold.

use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

use crate::counter::{Count, Counter};
use crate::encode::{canonical_values, check_storage_k, kmer_space_size, max_value, slot};
use crate::error::{Error, Result};
use crate::io::{self, PackedStore};
use crate::packed::PackedArray;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Solid {
    k: u8,
    bits: PackedArray,
}

impl Solid {
    /// All-false map for odd `k`.
    pub fn new(k: u8) -> Result<Self> {
        check_storage_k(k)?;
        let bytes = io::data_size(k, 1)?;
        let bits = PackedArray::zeroed(kmer_space_size(k), 1, bytes)?;
        Ok(Self { k, bits })
    }

    /// k-mers of `counter` with a count of at least `threshold` are solid.
    ///
    /// The threshold is not stored.
    pub fn from_counter(counter: &Counter, threshold: Count) -> Result<Self> {
        let mut solid = Self::new(counter.k())?;
        let mut nb_solid = 0u64;
        for value in canonical_values(counter.k()) {
            if counter.get(value) >= threshold {
                solid.set(value, true);
                nb_solid += 1;
            }
        }
        info!(k = solid.k, threshold, nb_solid, "solid map built");
        Ok(solid)
    }

    #[inline]
    pub fn k(&self) -> u8 {
        self.k
    }

    #[inline]
    fn index(&self, value: u64) -> u64 {
        slot(value & max_value(self.k), self.k)
    }

    /// Only the low `2k` bits of `value` are read.
    #[inline]
    pub fn get(&self, value: u64) -> bool {
        self.bits.get(self.index(value)) == 1
    }

    #[inline]
    pub fn set(&mut self, value: u64, solid: bool) {
        let i = self.index(value);
        self.bits.set(i, solid as u32);
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        io::write(self, path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading solid map");
        let (header, reader) = io::open_sized(path)?;
        Self::from_header(&header, reader)
    }

    pub fn load_from<R: Read>(mut reader: R) -> Result<Self> {
        let header = io::FileHeader::read_from(&mut reader)?;
        Self::from_header(&header, reader)
    }

    fn from_header<R: Read>(header: &io::FileHeader, mut reader: R) -> Result<Self> {
        if header.bit_width != 1 {
            return Err(Error::Format(format!(
                "solid file with bit_width={}",
                header.bit_width
            )));
        }
        header.data_size()?;
        let mut solid = Solid::new(header.k)?;
        io::read_exact_payload(&mut reader, solid.payload_mut())?;
        Ok(solid)
    }
}

impl PackedStore for Solid {
    const FIXED_BIT_WIDTH: Option<u8> = Some(1);

    fn k(&self) -> u8 {
        self.k
    }

    fn bit_width(&self) -> u8 {
        1
    }

    fn payload(&self) -> &[u8] {
        self.bits.as_bytes()
    }

    fn payload_mut(&mut self) -> &mut [u8] {
        self.bits.as_bytes_mut()
    }
}

//! Counter: one saturating `bit_width`-bit counter per canonical k-mer.

use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;
use tracing::{debug, info};

use crate::encode::{
    RollingKmers, check_storage_k, kmer_space_size, max_value, slot, slot_of_pair,
};
use crate::error::{Error, Result};
use crate::io::{self, PackedStore};
use crate::packed::PackedArray;

/// Count value type; `bit_width` is at most 32.
pub type Count = u32;

/// Dense canonical k-mer counter.
///
/// Not thread-safe; one caller drives a counter at a time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Counter {
    k: u8,
    counts: PackedArray,
}

impl Counter {
    /// Zeroed counter for odd `k` with `bit_width` bits per k-mer.
    pub fn new(k: u8, bit_width: u8) -> Result<Self> {
        check_storage_k(k)?;
        let bytes = io::data_size(k, bit_width)?;
        let counts = PackedArray::zeroed(kmer_space_size(k), bit_width, bytes)?;
        Ok(Self { k, counts })
    }

    #[inline]
    pub fn k(&self) -> u8 {
        self.k
    }

    #[inline]
    pub fn bit_width(&self) -> u8 {
        self.counts.width()
    }

    /// Saturation value, `2^bit_width - 1`.
    #[inline]
    pub fn max_count(&self) -> Count {
        self.counts.max_value()
    }

    /// Number of canonical k-mers, `2^(2k-1)`.
    #[inline]
    pub fn len(&self) -> u64 {
        self.counts.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.len() == 0
    }

    /// Bits of `value` above `2k` are ignored.
    #[inline]
    fn index(&self, value: u64) -> u64 {
        slot(value & max_value(self.k), self.k)
    }

    /// Add one to the count of `value` (either strand), saturating.
    #[inline]
    pub fn increment(&mut self, value: u64) {
        let i = self.index(value);
        self.counts.increment(i);
    }

    /// Count of `value`; only its low `2k` bits are read.
    #[inline]
    pub fn get(&self, value: u64) -> Count {
        self.counts.get(self.index(value))
    }

    /// Store `count`, clamped to [`Self::max_count`].
    #[inline]
    pub fn set(&mut self, value: u64, count: Count) {
        let i = self.index(value);
        self.counts.set(i, count);
    }

    /// Count every window of `k` valid bases of `seq`. Returns the number of windows.
    pub fn count_sequence(&mut self, seq: &[u8]) -> u64 {
        let k = self.k;
        let mut n = 0u64;
        for (_, fwd, rc) in RollingKmers::new(seq, k) {
            self.counts.increment(slot_of_pair(fwd, rc, k));
            n += 1;
        }
        n
    }

    /// Count all records of a FASTA stream.
    ///
    /// Counts applied before a parse error are kept.
    pub fn count_fasta_reader<R: Read>(&mut self, reader: R) -> Result<()> {
        let reader = bio::io::fasta::Reader::new(reader);
        let mut records = 0u64;
        let mut windows = 0u64;
        for record in reader.records() {
            let record = record.map_err(fasta_error)?;
            let n = self.count_sequence(record.seq());
            debug!(id = record.id(), len = record.seq().len(), windows = n, "counted record");
            records += 1;
            windows += n;
        }
        info!(records, windows, k = self.k, "counting done");
        Ok(())
    }

    /// Count all records of the FASTA file at `path`.
    pub fn count_fasta(&mut self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), "counting fasta");
        self.count_fasta_reader(BufReader::new(io::open(path)?))
    }

    /// Write in pcon format.
    pub fn save(&self, path: &Path) -> Result<()> {
        io::write(self, path)
    }

    /// Build a counter from a pcon file, sized from its header.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading counter");
        let (header, reader) = io::open_sized(path)?;
        Self::from_header(&header, reader)
    }

    /// Same as [`Self::load`] over any reader.
    pub fn load_from<R: Read>(mut reader: R) -> Result<Self> {
        let header = io::FileHeader::read_from(&mut reader)?;
        Self::from_header(&header, reader)
    }

    fn from_header<R: Read>(header: &io::FileHeader, mut reader: R) -> Result<Self> {
        header.data_size()?;
        let mut counter = Counter::new(header.k, header.bit_width)?;
        io::read_exact_payload(&mut reader, counter.payload_mut())?;
        Ok(counter)
    }
}

/// bio reports malformed input as `Other` or `InvalidData`.
fn fasta_error(e: std::io::Error) -> Error {
    match e.kind() {
        ErrorKind::Other | ErrorKind::InvalidData => Error::Parse(e.to_string()),
        _ => Error::Io(e),
    }
}

impl PackedStore for Counter {
    fn k(&self) -> u8 {
        self.k
    }

    fn bit_width(&self) -> u8 {
        self.counts.width()
    }

    fn payload(&self) -> &[u8] {
        self.counts.as_bytes()
    }

    fn payload_mut(&mut self) -> &mut [u8] {
        self.counts.as_bytes_mut()
    }
}

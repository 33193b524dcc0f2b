//! pcon: Prompt COuNter, a dense counter for short canonical k-mers.
//!
//! - 2-bit encoding (A=00, C=01, T=10, G=11), most significant base first
//! - one saturating counter of 1..=32 bits per canonical k-mer, bit-packed
//! - 1-bit solid maps derived from a counter by thresholding
//! - a headered binary format shared by counters and solid maps
//! - CSV, solid-list and spectrum exports
//!
//! Counters address `2^(2k-1)` slots, one per strand pair, so `k` must be odd.
//!
//! ```no_run
//! use pcon::{Counter, Solid};
//! # fn main() -> pcon::Result<()> {
//! let mut counter = Counter::new(15, 8)?;
//! counter.count_fasta("reads.fasta".as_ref())?;
//! counter.save("reads.pcon".as_ref())?;
//! Solid::from_counter(&counter, 3)?.save("reads.solid".as_ref())?;
//! # Ok(())
//! # }
//! ```

mod counter;
pub mod dump;
pub mod encode;
mod error;
pub mod io;
mod packed;
mod solid;
pub mod spectrum;

pub use counter::{Count, Counter};
pub use encode::{canonical, nuc_to_bit, revcomp, seq_to_value, value_to_seq};
pub use error::{Error, Result};
pub use io::{PackedStore, data_size};
pub use solid::Solid;
pub use spectrum::{Spectrum, ThresholdMethod};

//! Text exports of a counter.
//!
//! Every export walks the canonical values in ascending order, so each strand
//! pair is written once under its smaller value.

use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::counter::{Count, Counter};
use crate::encode::{canonical_values, value_to_seq};
use crate::error::Result;
use crate::io::create;
use crate::spectrum::Spectrum;

fn csv_writer<W: Write>(w: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(w)
}

/// `sequence,count` for each k-mer with `count >= min_count`. Returns rows written.
pub fn write_csv<W: Write>(counter: &Counter, min_count: Count, w: W) -> Result<u64> {
    let k = counter.k();
    let mut writer = csv_writer(w);
    let mut rows = 0u64;
    for value in canonical_values(k) {
        let count = counter.get(value);
        if count >= min_count {
            writer.write_record([value_to_seq(value, k), count.to_string()])?;
            rows += 1;
        }
    }
    writer.flush()?;
    Ok(rows)
}

/// One `sequence` row per k-mer with `count >= min_count`. Returns rows written.
pub fn write_solid<W: Write>(counter: &Counter, min_count: Count, w: W) -> Result<u64> {
    let k = counter.k();
    let mut writer = csv_writer(w);
    let mut rows = 0u64;
    for value in canonical_values(k) {
        if counter.get(value) >= min_count {
            writer.write_record([value_to_seq(value, k)])?;
            rows += 1;
        }
    }
    writer.flush()?;
    Ok(rows)
}

pub fn dump_csv(counter: &Counter, min_count: Count, path: &Path) -> Result<()> {
    let rows = write_csv(counter, min_count, create(path)?)?;
    info!(path = %path.display(), rows, min_count, "csv written");
    Ok(())
}

pub fn dump_solid(counter: &Counter, min_count: Count, path: &Path) -> Result<()> {
    let rows = write_solid(counter, min_count, create(path)?)?;
    info!(path = %path.display(), rows, min_count, "solid list written");
    Ok(())
}

/// `count,frequency` for each observed count.
pub fn dump_spectrum(counter: &Counter, path: &Path) -> Result<()> {
    let spectrum = Spectrum::from_counter(counter);
    spectrum.write_csv(create(path)?)?;
    info!(path = %path.display(), buckets = spectrum.len(), "spectrum written");
    Ok(())
}

//! On-disk pcon format: a two-byte header followed by the packed payload.
//!
//! ```text
//! byte 0        k
//! byte 1        bit_width   (solid files: 1)
//! bytes 2..     payload, exactly data_size(k, bit_width) bytes
//! ```
//!
//! There is no magic number, version or checksum: a file is valid when its
//! header is and its payload length matches the header. The payload is the
//! in-memory packed buffer verbatim (see [`crate::packed`] for the bit layout).

use byteorder::{ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::Path;
use tracing::debug;

use crate::encode::{check_storage_k, kmer_space_size};
use crate::error::{Error, Result};
use crate::packed::MAX_WIDTH;

/// Payload size in bytes: `ceil(2^(2k-1) * bit_width / 8)`.
pub fn data_size(k: u8, bit_width: u8) -> Result<u64> {
    check_storage_k(k)?;
    check_bit_width(bit_width)?;
    kmer_space_size(k)
        .checked_mul(bit_width as u64)
        .map(|bits| bits.div_ceil(8))
        .ok_or_else(|| {
            Error::InvalidK(format!(
                "k={k} with {bit_width} bits per k-mer overflows the addressable size"
            ))
        })
}

pub(crate) fn check_bit_width(bit_width: u8) -> Result<()> {
    if bit_width == 0 || bit_width > MAX_WIDTH {
        return Err(Error::InvalidK(format!(
            "bit_width={bit_width} is outside [1, {MAX_WIDTH}]"
        )));
    }
    Ok(())
}

/// Something whose whole state is `(k, bit_width)` plus a packed payload.
pub trait PackedStore {
    /// Forced `bit_width` for this kind of entity, if any.
    const FIXED_BIT_WIDTH: Option<u8> = None;

    fn k(&self) -> u8;
    fn bit_width(&self) -> u8;
    /// Raw packed buffer, `data_size(k, bit_width)` bytes.
    fn payload(&self) -> &[u8];
    fn payload_mut(&mut self) -> &mut [u8];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileHeader {
    pub k: u8,
    pub bit_width: u8,
}

impl FileHeader {
    pub fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_u8(self.k)?;
        w.write_u8(self.bit_width)?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> Result<Self> {
        let mut read = || {
            r.read_u8().map_err(|e| match e.kind() {
                ErrorKind::UnexpectedEof => Error::Format("truncated header".into()),
                _ => Error::Io(e),
            })
        };
        let k = read()?;
        let bit_width = read()?;
        Ok(FileHeader { k, bit_width })
    }

    /// Payload size declared by this header; fails on an unusable geometry.
    pub fn data_size(&self) -> Result<u64> {
        data_size(self.k, self.bit_width).map_err(|e| match e {
            Error::InvalidK(msg) => Error::Format(format!("bad header: {msg}")),
            other => other,
        })
    }
}

pub(crate) fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
        _ => Error::Io(e),
    })
}

pub(crate) fn create(path: &Path) -> Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}

/// Serialize `entity` to a writer.
pub fn write_to<S: PackedStore, W: Write>(entity: &S, mut w: W) -> Result<()> {
    FileHeader {
        k: entity.k(),
        bit_width: entity.bit_width(),
    }
    .write_to(&mut w)?;
    w.write_all(entity.payload())?;
    w.flush()?;
    Ok(())
}

/// Serialize `entity` to `path`, replacing any existing file.
pub fn write<S: PackedStore>(entity: &S, path: &Path) -> Result<()> {
    debug!(
        path = %path.display(),
        k = entity.k(),
        bit_width = entity.bit_width(),
        "writing pcon file"
    );
    write_to(entity, create(path)?)
}

/// Read only the header of `path`.
pub fn read_header(path: &Path) -> Result<(u8, u8)> {
    let mut reader = BufReader::new(open(path)?);
    let h = FileHeader::read_from(&mut reader)?;
    Ok((h.k, h.bit_width))
}

/// Read the payload of `path` into `buffer`, which must be sized from the header.
pub fn read_payload(path: &Path, buffer: &mut [u8]) -> Result<()> {
    let mut reader = BufReader::new(open(path)?);
    let header = FileHeader::read_from(&mut reader)?;
    let expected = header.data_size()?;
    if buffer.len() as u64 != expected {
        return Err(Error::Format(format!(
            "buffer holds {} bytes, header (k={}, bit_width={}) declares {expected}",
            buffer.len(),
            header.k,
            header.bit_width
        )));
    }
    read_exact_payload(&mut reader, buffer)
}

/// Fill `entity` from a reader; the header must match the entity's geometry.
///
/// On error `entity` is left unchanged.
pub fn deserialize_from<S: PackedStore, R: Read>(entity: &mut S, mut r: R) -> Result<()> {
    let header = FileHeader::read_from(&mut r)?;
    check_geometry(entity, &header)?;
    let mut scratch = vec![0u8; entity.payload().len()];
    read_exact_payload(&mut r, &mut scratch)?;
    entity.payload_mut().copy_from_slice(&scratch);
    Ok(())
}

/// `header` is valid and describes `entity`.
fn check_geometry<S: PackedStore>(entity: &S, header: &FileHeader) -> Result<()> {
    header.data_size()?;
    if let Some(w) = S::FIXED_BIT_WIDTH {
        if header.bit_width != w {
            return Err(Error::Format(format!(
                "bit_width={} where {w} is required",
                header.bit_width
            )));
        }
    }
    if header.k != entity.k() || header.bit_width != entity.bit_width() {
        return Err(Error::Format(format!(
            "file has k={} bit_width={}, target has k={} bit_width={}",
            header.k,
            header.bit_width,
            entity.k(),
            entity.bit_width()
        )));
    }
    Ok(())
}

/// Fill `entity` from `path`, replacing its previous contents.
///
/// On error `entity` is left unchanged.
pub fn deserialize<S: PackedStore>(entity: &mut S, path: &Path) -> Result<()> {
    debug!(path = %path.display(), "reading pcon file");
    deserialize_from(entity, BufReader::new(open(path)?))
}

/// Open `path` and read its header, checking the file length against it
/// before anything is allocated.
pub(crate) fn open_sized(path: &Path) -> Result<(FileHeader, BufReader<File>)> {
    let file = open(path)?;
    let len = file.metadata()?.len();
    let mut reader = BufReader::new(file);
    let header = FileHeader::read_from(&mut reader)?;
    let expected = header.data_size()? + 2;
    if len != expected {
        return Err(Error::Format(format!(
            "file is {len} bytes, header (k={}, bit_width={}) declares {expected}",
            header.k, header.bit_width
        )));
    }
    Ok((header, reader))
}

pub(crate) fn read_exact_payload<R: Read>(r: &mut R, buffer: &mut [u8]) -> Result<()> {
    r.read_exact(buffer).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => {
            Error::Format(format!("payload shorter than {} bytes", buffer.len()))
        }
        _ => Error::Io(e),
    })?;
    let mut tail = [0u8; 1];
    loop {
        match r.read(&mut tail) {
            Ok(0) => return Ok(()),
            Ok(_) => {
                return Err(Error::Format(format!(
                    "payload longer than {} bytes",
                    buffer.len()
                )));
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_size_matches_layout() {
        assert_eq!(data_size(1, 1).unwrap(), 1);
        assert_eq!(data_size(1, 8).unwrap(), 2);
        assert_eq!(data_size(3, 4).unwrap(), 16);
        assert_eq!(data_size(3, 3).unwrap(), 12);
        assert_eq!(data_size(5, 8).unwrap(), 512);
        assert_eq!(data_size(5, 1).unwrap(), 64);
    }

    #[test]
    fn data_size_rejects_bad_geometry() {
        assert!(matches!(data_size(0, 8), Err(Error::InvalidK(_))));
        assert!(matches!(data_size(33, 8), Err(Error::InvalidK(_))));
        assert!(matches!(data_size(4, 8), Err(Error::InvalidK(_))));
        assert!(matches!(data_size(3, 0), Err(Error::InvalidK(_))));
        assert!(matches!(data_size(3, 33), Err(Error::InvalidK(_))));
        assert!(matches!(data_size(31, 32), Err(Error::InvalidK(_))));
    }

    #[test]
    fn header_is_two_bytes() {
        let mut out = Vec::new();
        FileHeader { k: 7, bit_width: 4 }.write_to(&mut out).unwrap();
        assert_eq!(out, vec![7, 4]);
        let h = FileHeader::read_from(&mut &out[..]).unwrap();
        assert_eq!(h, FileHeader { k: 7, bit_width: 4 });
    }

    #[test]
    fn truncated_header() {
        let err = FileHeader::read_from(&mut &[5u8][..]).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }
}

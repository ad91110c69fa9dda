//! Binary record layouts for field frames.
//!
//! The simulator writes the headerless layout; the tagged layout prefixes the
//! same payload with a header carrying the cell count.

use std::io::{self, Read, Write};

use super::{Frame, LayoutError};

/// Magic bytes identifying a tagged field frame.
pub const TAGGED_MAGIC: &[u8; 4] = b"FDTF";

/// Current tagged format version.
pub const TAGGED_VERSION: u16 = 1;

const F64_SIZE: usize = 8;

/// Byte size of the headerless payload for `cells` E samples.
///
/// Returns `None` for a zero cell count or on overflow.
pub fn payload_size(cells: usize) -> Option<usize> {
    let values = cells.checked_mul(2)?.checked_sub(1)?;
    values.checked_mul(F64_SIZE)
}

/// Header of the tagged layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedHeader {
    /// Number of E samples (N).
    pub cells: u64,
}

impl TaggedHeader {
    /// Magic(4) + Version(2) + Reserved(2) + Cells(8) = 16
    pub const SIZE: usize = 16;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(TAGGED_MAGIC)?;
        w.write_all(&TAGGED_VERSION.to_le_bytes())?;
        w.write_all(&[0u8; 2])?;
        w.write_all(&self.cells.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> Result<Self, LayoutError> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic).map_err(short_header)?;
        if &magic != TAGGED_MAGIC {
            return Err(LayoutError::Header(format!(
                "invalid magic bytes {:02x?}",
                magic
            )));
        }

        let mut buf2 = [0u8; 2];
        r.read_exact(&mut buf2).map_err(short_header)?;
        let version = u16::from_le_bytes(buf2);
        if version != TAGGED_VERSION {
            return Err(LayoutError::Header(format!(
                "unsupported version {}",
                version
            )));
        }

        // Reserved
        r.read_exact(&mut buf2).map_err(short_header)?;

        let mut buf8 = [0u8; 8];
        r.read_exact(&mut buf8).map_err(short_header)?;
        let cells = u64::from_le_bytes(buf8);

        Ok(Self { cells })
    }
}

fn short_header(_: io::Error) -> LayoutError {
    LayoutError::Header("truncated header".to_string())
}

/// Decode little-endian doubles. `bytes.len()` must be a multiple of 8.
fn read_f64s(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(F64_SIZE)
        .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
        .collect()
}

fn write_f64s(out: &mut Vec<u8>, values: &[f64]) {
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
}

/// Decode a headerless frame of `cells` E samples.
///
/// Trailing bytes beyond the fixed layout are ignored. The returned vectors
/// own their data; `bytes` may be dropped right after.
pub fn decode_binary(bytes: &[u8], cells: usize) -> Result<Frame, LayoutError> {
    let expected = payload_size(cells)
        .ok_or_else(|| LayoutError::Header(format!("invalid cell count {}", cells)))?;
    if bytes.len() < expected {
        return Err(LayoutError::Short {
            expected: expected as u64,
            actual: bytes.len() as u64,
        });
    }

    let split = cells * F64_SIZE;
    Ok(Frame {
        e: read_f64s(&bytes[..split]),
        h: read_f64s(&bytes[split..expected]),
    })
}

/// Decode a tagged frame; the cell count comes from its header.
pub fn decode_tagged(bytes: &[u8]) -> Result<Frame, LayoutError> {
    if bytes.len() < TaggedHeader::SIZE {
        return Err(LayoutError::Short {
            expected: TaggedHeader::SIZE as u64,
            actual: bytes.len() as u64,
        });
    }
    let mut reader = bytes;
    let header = TaggedHeader::read_from(&mut reader)?;
    let cells = usize::try_from(header.cells)
        .map_err(|_| LayoutError::Header(format!("cell count {} too large", header.cells)))?;

    let payload = &bytes[TaggedHeader::SIZE..];
    decode_binary(payload, cells).map_err(|err| match err {
        LayoutError::Short { expected, actual } => LayoutError::Short {
            expected: expected + TaggedHeader::SIZE as u64,
            actual: actual + TaggedHeader::SIZE as u64,
        },
        other => other,
    })
}

/// Encode a frame in the headerless layout: E then H, little-endian.
pub fn encode_binary(frame: &Frame) -> Vec<u8> {
    let mut bytes = Vec::with_capacity((frame.e.len() + frame.h.len()) * F64_SIZE);
    write_f64s(&mut bytes, &frame.e);
    write_f64s(&mut bytes, &frame.h);
    bytes
}

/// Encode a frame in the tagged layout.
pub fn encode_tagged(frame: &Frame) -> Vec<u8> {
    let mut bytes =
        Vec::with_capacity(TaggedHeader::SIZE + (frame.e.len() + frame.h.len()) * F64_SIZE);
    let header = TaggedHeader {
        cells: frame.e.len() as u64,
    };
    // Writing into a Vec cannot fail.
    let _ = header.write_to(&mut bytes);
    write_f64s(&mut bytes, &frame.e);
    write_f64s(&mut bytes, &frame.h);
    bytes
}

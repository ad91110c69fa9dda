//! Field frames written by the simulator: discovery and decoding.
//!
//! # Record layouts
//!
//! ```text
//! Text:
//!   type,value          header line, ignored
//!   E,<f64>             one row per sample, channel tag then value
//!   H,<f64>
//!
//! Binary (headerless, little-endian f64):
//!   E[0..N)             N * 8 bytes
//!   H[0..N-1)           (N-1) * 8 bytes
//!
//! Tagged (binary with header):
//!   Magic: "FDTF" (4 bytes)
//!   Version: u16
//!   Reserved: u16
//!   Cells (N): u64
//!   E, H as in the binary layout
//! ```

mod format;
mod locator;
mod run;
mod text;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use format::{
    TAGGED_MAGIC, TAGGED_VERSION, TaggedHeader, decode_binary, decode_tagged, encode_binary,
    encode_tagged, payload_size,
};
pub use locator::{FramePattern, LocatedFrame, locate};
pub use run::{FrameIter, Run};
pub use text::{TEXT_HEADER, decode_text, write_text};

/// One timestep's field snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    /// Electric field, one sample per cell.
    pub e: Vec<f64>,
    /// Magnetic field on the staggered grid, one fewer sample than `e`.
    pub h: Vec<f64>,
}

impl Frame {
    /// (len(E), len(H))
    pub fn shape(&self) -> (usize, usize) {
        (self.e.len(), self.h.len())
    }
}

/// Record layout of frame files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameFormat {
    /// Header line then `channel,value` rows.
    Text,
    /// Headerless little-endian doubles, N fixed by configuration.
    Binary,
    /// Binary payload behind a header carrying N.
    Tagged,
}

impl FrameFormat {
    /// Layout conventionally stored under a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" | "txt" => Some(FrameFormat::Text),
            "bin" | "dat" => Some(FrameFormat::Binary),
            "fdtf" => Some(FrameFormat::Tagged),
            _ => None,
        }
    }

    /// Smallest valid file size, where it is known without reading the file.
    pub fn minimum_size(self, cells: usize) -> Option<u64> {
        match self {
            FrameFormat::Text => None,
            FrameFormat::Binary => payload_size(cells).map(|size| size as u64),
            FrameFormat::Tagged => Some(TaggedHeader::SIZE as u64),
        }
    }

    /// Read and decode one frame file.
    ///
    /// The file is read fully and closed before decoding; `cells` is only
    /// used by the headerless binary layout.
    pub fn decode<P: AsRef<Path>>(self, path: P, cells: usize) -> Result<Frame, FrameError> {
        let path = path.as_ref();
        let io_err = |source: io::Error| FrameError::Io {
            path: path.to_path_buf(),
            source,
        };

        let decoded = match self {
            FrameFormat::Text => decode_text(&fs::read_to_string(path).map_err(io_err)?),
            FrameFormat::Binary => decode_binary(&fs::read(path).map_err(io_err)?, cells),
            FrameFormat::Tagged => decode_tagged(&fs::read(path).map_err(io_err)?),
        };
        decoded.map_err(|err| err.at(path))
    }
}

/// Layout violation found in a frame's contents.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("expected at least {expected} bytes, found {actual}")]
    Short { expected: u64, actual: u64 },
    #[error("bad header: {0}")]
    Header(String),
    #[error("line {line}: {message}")]
    Row { line: usize, message: String },
}

impl LayoutError {
    /// Attach the offending file.
    pub fn at(self, path: &Path) -> FrameError {
        let path = path.to_path_buf();
        match self {
            LayoutError::Short { expected, actual } => FrameError::IncompleteFrame {
                path,
                expected,
                actual,
            },
            other => FrameError::Decode {
                path,
                message: other.to_string(),
            },
        }
    }
}

/// Errors reading frames from disk.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Incomplete frame {}: expected at least {expected} bytes, found {actual}", path.display())]
    IncompleteFrame {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },
    #[error("Malformed frame {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },
    #[error(
        "Frame {} has E={}, H={} samples but the run started with E={}, H={}",
        path.display(), found.0, found.1, expected.0, expected.1
    )]
    ShapeMismatch {
        path: PathBuf,
        expected: (usize, usize),
        found: (usize, usize),
    },
}

impl FrameError {
    /// File the error refers to.
    pub fn path(&self) -> &Path {
        match self {
            FrameError::Io { path, .. }
            | FrameError::IncompleteFrame { path, .. }
            | FrameError::Decode { path, .. }
            | FrameError::ShapeMismatch { path, .. } => path,
        }
    }
}

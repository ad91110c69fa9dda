//! Delimited text frames: a header line, then `channel,value` rows.

use std::io::{self, Write};

use log::trace;

use super::{Frame, LayoutError};

/// Header line written by the simulator.
pub const TEXT_HEADER: &str = "type,value";

/// Decode a text frame.
///
/// Rows tagged `E` or `H` are collected in file order. Rows with any other
/// tag are skipped without parsing their value.
pub fn decode_text(text: &str) -> Result<Frame, LayoutError> {
    let mut frame = Frame::default();

    for (idx, line) in text.lines().enumerate().skip(1) {
        let line_no = idx + 1;
        let row = line.trim();
        if row.is_empty() {
            continue;
        }

        let (tag, value) = row.split_once(',').ok_or_else(|| LayoutError::Row {
            line: line_no,
            message: format!("expected `channel,value`, found {:?}", row),
        })?;

        let target = match tag.trim() {
            "E" => &mut frame.e,
            "H" => &mut frame.h,
            other => {
                trace!("line {}: skipping channel {:?}", line_no, other);
                continue;
            }
        };

        let value = value.trim();
        let parsed = value.parse::<f64>().map_err(|_| LayoutError::Row {
            line: line_no,
            message: format!("value {:?} is not a number", value),
        })?;
        target.push(parsed);
    }

    Ok(frame)
}

/// Write a frame the way the simulator does: header, all E rows, all H rows.
pub fn write_text<W: Write>(w: &mut W, frame: &Frame) -> io::Result<()> {
    writeln!(w, "{}", TEXT_HEADER)?;
    for v in &frame.e {
        writeln!(w, "E,{}", v)?;
    }
    for v in &frame.h {
        writeln!(w, "H,{}", v)?;
    }
    Ok(())
}

use std::fmt::{self, Write};

const ROW_SIZE: usize = 16;

/// Renders `data` as a classic hex dump.
///
/// Each row shows a 4-digit hex offset, 16 hex bytes with an extra gap
/// after the eighth, and the printable ASCII column (`.` for everything
/// outside `0x20..=0x7E`). Short final rows are padded so the ASCII column
/// stays aligned.
pub fn hex_dump(data: &[u8]) -> String {
    let mut out = String::new();
    for (row_index, row) in data.chunks(ROW_SIZE).enumerate() {
        // Formatting into a String cannot fail
        if write_row(&mut out, row_index * ROW_SIZE, row).is_err() {
            break;
        }
    }
    out
}

fn write_row<W: Write>(out: &mut W, offset: usize, row: &[u8]) -> fmt::Result {
    write!(out, "{:04X} ", offset)?;

    for j in 0..ROW_SIZE {
        match row.get(j) {
            Some(byte) => write!(out, "{:02X} ", byte)?,
            None => out.write_str("   ")?,
        }
        if j == 7 {
            out.write_str("  ")?;
        }
    }

    out.write_str(" |")?;
    for &byte in row {
        let c = if (0x20..=0x7E).contains(&byte) {
            byte as char
        } else {
            '.'
        };
        out.write_char(c)?;
    }
    out.write_str("|\n")
}

//! Byte-level rendering and diffing of memory snapshots.

use ansi_term::{Colour, Style};

use crate::memory::MemoryCell;

/// Render bytes as colon-separated lowercase hex.
pub fn byte_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// A rendered byte-wise diff and its difference count.
#[derive(Debug)]
pub struct Diff {
    pub text: String,
    pub count: usize,
}

/// Compare `actual` against `reference` byte for byte.
///
/// Differing positions in the overlapping range are rendered bold and count
/// one difference each; every trailing byte of the longer buffer counts one
/// more and is rendered bold as well.
pub fn byte_diff(actual: &[u8], reference: &[u8]) -> Diff {
    let bold = Style::new().bold();
    let shared = actual.len().min(reference.len());
    let longer = if actual.len() >= reference.len() {
        actual
    } else {
        reference
    };

    let mut parts = Vec::with_capacity(longer.len());
    let mut count = 0;
    for i in 0..shared {
        if actual[i] != reference[i] {
            parts.push(bold.paint(format!("{:02x}", actual[i])).to_string());
            count += 1;
        } else {
            parts.push(format!("{:02x}", actual[i]));
        }
    }
    for byte in &longer[shared..] {
        parts.push(bold.paint(format!("{:02x}", byte)).to_string());
        count += 1;
    }

    let mut text = parts.join(":");
    if count > 0 {
        text.push_str(&format!(" ({} bytes different)", count));
    }
    Diff { text, count }
}

/// Render a cell with the three words at the top of the stack highlighted.
pub fn highlight_cell(cell: &MemoryCell) -> String {
    let green = Colour::Green.normal();
    let sp = cell.sp();
    cell.as_bytes()
        .iter()
        .enumerate()
        .map(|(i, b)| {
            if i >= sp * 2 && i < sp * 2 + 6 {
                green.paint(format!("{:02X}", b)).to_string()
            } else {
                format!("{:02X}", b)
            }
        })
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_buffers_have_no_differences() {
        let d = byte_diff(&[1, 2, 3], &[1, 2, 3]);
        assert_eq!(d.count, 0);
        assert_eq!(d.text, "01:02:03");
    }

    #[test]
    fn each_mismatched_position_counts_once() {
        let d = byte_diff(&[1, 0xff, 3, 0xee], &[1, 2, 3, 4]);
        assert_eq!(d.count, 2);
        assert!(d.text.ends_with("(2 bytes different)"));
    }

    #[test]
    fn one_trailing_byte_is_one_difference() {
        let d = byte_diff(&[1, 2, 3], &[1, 2]);
        assert_eq!(d.count, 1);
    }

    #[test]
    fn trailing_bytes_count_whichever_buffer_is_longer() {
        let d = byte_diff(&[1, 2], &[1, 2, 9, 9]);
        assert_eq!(d.count, 2);
    }

    #[test]
    fn byte_string_is_colon_separated_hex() {
        assert_eq!(byte_string(&[0x00, 0xab, 0x5e]), "00:ab:5e");
        assert_eq!(byte_string(&[]), "");
    }
}

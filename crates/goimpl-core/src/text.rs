//! Text position utilities for byte offset and line:column conversions.
//!
//! - Lines and columns are **1-indexed** (matching editor conventions)
//! - Columns count UTF-8 bytes
//! - Byte offsets are **0-indexed**

/// Convert a byte offset to 1-indexed line and column.
///
/// If `offset` exceeds content length, returns the position at end of content.
pub fn byte_offset_to_position(content: &[u8], offset: usize) -> (u32, u32) {
    let offset = offset.min(content.len());
    let mut line = 1u32;
    let mut col = 1u32;

    for &byte in &content[..offset] {
        if byte == b'\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Byte offset of the start of the line containing `offset`.
pub fn line_start(content: &str, offset: usize) -> usize {
    let offset = offset.min(content.len());
    content.as_bytes()[..offset]
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |i| i + 1)
}

/// Byte offset just past the end of the line containing `offset`, excluding the newline.
pub fn line_end(content: &str, offset: usize) -> usize {
    let offset = offset.min(content.len());
    content.as_bytes()[offset..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(content.len(), |i| offset + i)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod positions {
        use super::*;

        #[test]
        fn first_byte_is_line_one_col_one() {
            assert_eq!(byte_offset_to_position(b"package x\n", 0), (1, 1));
        }

        #[test]
        fn offset_after_newline() {
            let src = b"package x\ntype T int\n";
            assert_eq!(byte_offset_to_position(src, 10), (2, 1));
            assert_eq!(byte_offset_to_position(src, 15), (2, 6));
        }

        #[test]
        fn offset_past_end_clamps() {
            assert_eq!(byte_offset_to_position(b"ab", 99), (1, 3));
        }
    }

    mod lines {
        use super::*;

        #[test]
        fn line_bounds() {
            let src = "a\n\tbc\nd";
            assert_eq!(line_start(src, 3), 2);
            assert_eq!(line_end(src, 3), 5);
            assert_eq!(line_end(src, 6), 7);
            assert_eq!(line_start(src, 0), 0);
        }
    }
}

//! Width-aware slicing.

use unicode_segmentation::UnicodeSegmentation;

use super::ansi::extract_ansi_code;
use super::width::{grapheme_width, visible_width};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceResult {
    pub text: String,
    pub width: usize,
}

pub fn slice_by_column(line: &str, start_col: usize, length: usize, strict: bool) -> String {
    slice_with_width(line, start_col, length, strict).text
}

/// Cuts the columns `[start_col, start_col + length)` out of `line`.
///
/// Escape sequences that precede the window are replayed at its start so colours
/// survive horizontal scrolling. With `strict`, a wide grapheme straddling the
/// right edge is dropped instead of overflowing the window.
pub fn slice_with_width(line: &str, start_col: usize, length: usize, strict: bool) -> SliceResult {
    if length == 0 {
        return SliceResult {
            text: String::new(),
            width: 0,
        };
    }

    let end_col = start_col.saturating_add(length);
    let mut result = String::new();
    let mut result_width = 0;
    let mut current_col = 0;
    let mut idx = 0;
    let mut pending_ansi = String::new();

    while idx < line.len() && current_col < end_col {
        if let Some(ansi) = extract_ansi_code(line, idx) {
            if current_col >= start_col && current_col < end_col {
                result.push_str(&ansi.code);
            } else if current_col < start_col {
                pending_ansi.push_str(&ansi.code);
            }
            idx += ansi.length;
            continue;
        }

        let text_end = next_ansi_or_end(line, idx);
        for grapheme in line[idx..text_end].graphemes(true) {
            let width = grapheme_width(grapheme);
            let in_range = current_col >= start_col && current_col < end_col;
            let fits = !strict || current_col + width <= end_col;

            if in_range && fits {
                if !pending_ansi.is_empty() {
                    result.push_str(&pending_ansi);
                    pending_ansi.clear();
                }
                result.push_str(grapheme);
                result_width += width;
            }

            current_col += width;
            if current_col >= end_col {
                break;
            }
        }
        idx = text_end;
    }

    SliceResult {
        text: result,
        width: result_width,
    }
}

/// Shortens `text` to `max_width` columns, ending with `ellipsis` when anything was cut.
pub fn truncate_to_width(text: &str, max_width: usize, ellipsis: &str) -> String {
    if visible_width(text) <= max_width {
        return text.to_string();
    }
    let ellipsis_width = visible_width(ellipsis);
    if max_width <= ellipsis_width {
        return slice_by_column(ellipsis, 0, max_width, true);
    }
    let mut out = slice_by_column(text, 0, max_width - ellipsis_width, true);
    out.push_str(ellipsis);
    out
}

fn next_ansi_or_end(line: &str, mut idx: usize) -> usize {
    let bytes = line.as_bytes();
    while idx < bytes.len() {
        if bytes[idx] == 0x1b && extract_ansi_code(line, idx).is_some() {
            return idx;
        }
        idx += 1;
        while idx < bytes.len() && !line.is_char_boundary(idx) {
            idx += 1;
        }
    }
    bytes.len()
}

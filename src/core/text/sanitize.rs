//! Normalises raw command output into lines that are safe to paint.
//!
//! Captured output is painted at fixed screen positions, so anything that would move the
//! terminal cursor has to go: carriage-return overwrites are resolved, tabs are expanded,
//! and only SGR (colour/attribute) sequences survive.

use unicode_segmentation::UnicodeSegmentation;

use super::ansi::extract_ansi_code;
use super::width::grapheme_width;

pub const TAB_STOP: usize = 8;

/// Splits captured output into lines. A trailing newline does not produce an extra empty line,
/// and empty output produces no lines at all.
pub fn split_output(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let body = text.strip_suffix('\n').unwrap_or(text);
    body.split('\n').map(sanitize_line).collect()
}

pub fn sanitize_line(raw: &str) -> String {
    let raw = raw.strip_suffix('\r').unwrap_or(raw);
    let raw = match raw.rfind('\r') {
        Some(pos) => &raw[pos + 1..],
        None => raw,
    };

    let mut out = String::with_capacity(raw.len());
    let mut column = 0;
    let mut idx = 0;
    while idx < raw.len() {
        if raw.as_bytes()[idx] == 0x1b {
            match extract_ansi_code(raw, idx) {
                Some(ansi) => {
                    if ansi.is_sgr() {
                        out.push_str(&ansi.code);
                    }
                    idx += ansi.length;
                }
                None => idx += 1,
            }
            continue;
        }

        let text_end = raw[idx..]
            .find('\x1b')
            .map(|offset| idx + offset)
            .unwrap_or(raw.len());
        for grapheme in raw[idx..text_end].graphemes(true) {
            if grapheme == "\t" {
                let pad = TAB_STOP - column % TAB_STOP;
                out.extend(std::iter::repeat(' ').take(pad));
                column += pad;
                continue;
            }
            if grapheme.chars().any(char::is_control) {
                let kept: String = grapheme.chars().filter(|ch| !ch.is_control()).collect();
                column += grapheme_width(&kept);
                out.push_str(&kept);
                continue;
            }
            column += grapheme_width(grapheme);
            out.push_str(grapheme);
        }
        idx = text_end;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{sanitize_line, split_output};

    #[test]
    fn trailing_newline_does_not_add_a_line() {
        assert_eq!(split_output("hello\n"), vec!["hello".to_string()]);
        assert_eq!(split_output("a\n\nb"), vec!["a", "", "b"]);
        assert!(split_output("").is_empty());
        assert_eq!(split_output("\n"), vec![String::new()]);
    }

    #[test]
    fn carriage_return_keeps_last_overwrite() {
        assert_eq!(sanitize_line("crlf line\r"), "crlf line");
        assert_eq!(sanitize_line("10%\r55%\r100%"), "100%");
    }

    #[test]
    fn tabs_expand_to_stops() {
        assert_eq!(sanitize_line("a\tb"), "a       b");
        assert_eq!(sanitize_line("12345678\tx"), "12345678        x");
    }

    #[test]
    fn only_sgr_sequences_survive() {
        assert_eq!(
            sanitize_line("\x1b[2J\x1b[31mred\x1b[0m\x1b[H"),
            "\x1b[31mred\x1b[0m"
        );
        assert_eq!(sanitize_line("bell\x07 esc\x1b"), "bell esc");
    }
}

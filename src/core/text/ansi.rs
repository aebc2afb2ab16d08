//! ANSI escape sequence scanning.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnsiCodeKind {
    Csi,
    Osc,
    Apc,
    Dcs,
    Ss3,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnsiCode {
    pub code: String,
    pub length: usize,
    pub kind: AnsiCodeKind,
}

impl AnsiCode {
    /// Select Graphic Rendition (`CSI ... m`): colours and text attributes only.
    pub fn is_sgr(&self) -> bool {
        self.kind == AnsiCodeKind::Csi && self.code.ends_with('m')
    }
}

/// Returns the complete escape sequence starting at byte `pos`, if any.
///
/// Unterminated sequences return `None` so callers can treat the ESC as a plain
/// control byte.
pub fn extract_ansi_code(input: &str, pos: usize) -> Option<AnsiCode> {
    let bytes = input.as_bytes();
    if pos >= bytes.len() || bytes[pos] != 0x1b {
        return None;
    }
    if pos + 1 >= bytes.len() {
        return None;
    }

    match bytes[pos + 1] {
        b'[' => extract_csi(input, pos),
        b']' => extract_string_terminated(input, pos, AnsiCodeKind::Osc),
        b'_' => extract_string_terminated(input, pos, AnsiCodeKind::Apc),
        b'P' => extract_string_terminated(input, pos, AnsiCodeKind::Dcs),
        b'O' => extract_ss3(input, pos),
        _ => None,
    }
}

fn extract_csi(input: &str, pos: usize) -> Option<AnsiCode> {
    let bytes = input.as_bytes();
    let mut idx = pos + 2;
    while idx < bytes.len() {
        let b = bytes[idx];
        if (0x40..=0x7e).contains(&b) {
            let end = idx + 1;
            return Some(AnsiCode {
                code: input[pos..end].to_string(),
                length: end - pos,
                kind: AnsiCodeKind::Csi,
            });
        }
        idx += 1;
    }
    None
}

fn extract_ss3(input: &str, pos: usize) -> Option<AnsiCode> {
    let bytes = input.as_bytes();
    if pos + 2 >= bytes.len() || !bytes[pos + 2].is_ascii() {
        return None;
    }
    let end = pos + 3;
    Some(AnsiCode {
        code: input[pos..end].to_string(),
        length: end - pos,
        kind: AnsiCodeKind::Ss3,
    })
}

fn extract_string_terminated(input: &str, pos: usize, kind: AnsiCodeKind) -> Option<AnsiCode> {
    let bytes = input.as_bytes();
    let mut idx = pos + 2;
    while idx < bytes.len() {
        if bytes[idx] == 0x07 {
            let end = idx + 1;
            return Some(AnsiCode {
                code: input[pos..end].to_string(),
                length: end - pos,
                kind,
            });
        }
        if bytes[idx] == 0x1b && idx + 1 < bytes.len() && bytes[idx + 1] == b'\\' {
            let end = idx + 2;
            return Some(AnsiCode {
                code: input[pos..end].to_string(),
                length: end - pos,
                kind,
            });
        }
        idx += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{extract_ansi_code, AnsiCodeKind};

    #[test]
    fn csi_sequence_is_extracted_whole() {
        let code = extract_ansi_code("a\x1b[1;31mb", 1).expect("csi");
        assert_eq!(code.code, "\x1b[1;31m");
        assert_eq!(code.length, 7);
        assert!(code.is_sgr());
    }

    #[test]
    fn cursor_movement_is_not_sgr() {
        let code = extract_ansi_code("\x1b[2J", 0).expect("csi");
        assert_eq!(code.kind, AnsiCodeKind::Csi);
        assert!(!code.is_sgr());
    }

    #[test]
    fn osc_terminates_on_bel_or_st() {
        let bel = extract_ansi_code("\x1b]0;title\x07rest", 0).expect("osc bel");
        assert_eq!(bel.code, "\x1b]0;title\x07");
        let st = extract_ansi_code("\x1b]8;;x\x1b\\rest", 0).expect("osc st");
        assert_eq!(st.code, "\x1b]8;;x\x1b\\");
    }

    #[test]
    fn unterminated_sequence_is_none() {
        assert!(extract_ansi_code("\x1b[12", 0).is_none());
        assert!(extract_ansi_code("\x1b", 0).is_none());
        assert!(extract_ansi_code("x", 0).is_none());
    }
}

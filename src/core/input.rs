//! Key parsing for legacy (xterm/vt) input sequences.
//!
//! A key id is a string such as `"j"`, `"G"`, `"pageDown"` or `"ctrl+c"`. Printable ASCII
//! keys keep their case, so `g` and `G` are distinct ids.

const MOD_SHIFT: u8 = 1;
const MOD_ALT: u8 = 2;
const MOD_CTRL: u8 = 4;

/// Maps one input sequence to a key id. Returns `None` for sequences with no meaning here.
pub fn parse_key(data: &str) -> Option<String> {
    if let Some(key_id) = legacy_sequence_key_id(data) {
        return Some(key_id.to_string());
    }
    if let Some(key_id) = parse_modified_csi(data) {
        return Some(key_id);
    }

    match data {
        "\x1b" => return Some("escape".to_string()),
        "\t" => return Some("tab".to_string()),
        "\r" | "\n" | "\x1bOM" => return Some("enter".to_string()),
        "\x00" => return Some("ctrl+space".to_string()),
        " " => return Some("space".to_string()),
        "\x7f" | "\x08" => return Some("backspace".to_string()),
        "\x1b[Z" => return Some("shift+tab".to_string()),
        _ => {}
    }

    if data.len() == 2 && data.starts_with('\x1b') {
        let code = data.as_bytes()[1];
        if (97..=122).contains(&code) {
            return Some(format!("alt+{}", code as char));
        }
    }

    if data.len() == 1 {
        let code = data.as_bytes()[0];
        if (1..=26).contains(&code) {
            let ch = (code + 96) as char;
            return Some(format!("ctrl+{ch}"));
        }
        if (33..=126).contains(&code) {
            return Some(data.to_string());
        }
    }

    None
}

/// `CSI 1 ; <mod> <final>` and `CSI <n> ; <mod> ~` as sent for modified cursor keys.
fn parse_modified_csi(data: &str) -> Option<String> {
    let body = data.strip_prefix("\x1b[")?;
    let final_byte = body.chars().last()?;
    let params = &body[..body.len() - final_byte.len_utf8()];
    let (first, modifier) = params.split_once(';')?;
    let modifier: u8 = modifier.parse().ok()?;
    let modifier = modifier.checked_sub(1)?;

    let key = match (first, final_byte) {
        ("1", 'A') => "up",
        ("1", 'B') => "down",
        ("1", 'C') => "right",
        ("1", 'D') => "left",
        ("1", 'H') => "home",
        ("1", 'F') => "end",
        ("5", '~') => "pageUp",
        ("6", '~') => "pageDown",
        ("3", '~') => "delete",
        _ => return None,
    };

    let mut parts = Vec::new();
    if modifier & MOD_SHIFT != 0 {
        parts.push("shift");
    }
    if modifier & MOD_CTRL != 0 {
        parts.push("ctrl");
    }
    if modifier & MOD_ALT != 0 {
        parts.push("alt");
    }
    parts.push(key);
    Some(parts.join("+"))
}

fn legacy_sequence_key_id(data: &str) -> Option<&'static str> {
    match data {
        "\x1b[A" | "\x1bOA" => Some("up"),
        "\x1b[B" | "\x1bOB" => Some("down"),
        "\x1b[C" | "\x1bOC" => Some("right"),
        "\x1b[D" | "\x1bOD" => Some("left"),
        "\x1b[H" | "\x1bOH" | "\x1b[1~" | "\x1b[7~" => Some("home"),
        "\x1b[F" | "\x1bOF" | "\x1b[4~" | "\x1b[8~" => Some("end"),
        "\x1b[2~" => Some("insert"),
        "\x1b[3~" => Some("delete"),
        "\x1b[5~" | "\x1b[[5~" => Some("pageUp"),
        "\x1b[6~" | "\x1b[[6~" => Some("pageDown"),
        "\x1b[a" => Some("shift+up"),
        "\x1b[b" => Some("shift+down"),
        "\x1b[c" => Some("shift+right"),
        "\x1b[d" => Some("shift+left"),
        "\x1bOa" => Some("ctrl+up"),
        "\x1bOb" => Some("ctrl+down"),
        "\x1bOc" => Some("ctrl+right"),
        "\x1bOd" => Some("ctrl+left"),
        "\x1b[5^" => Some("ctrl+pageUp"),
        "\x1b[6^" => Some("ctrl+pageDown"),
        "\x1b[7^" => Some("ctrl+home"),
        "\x1b[8^" => Some("ctrl+end"),
        "\x1bOP" | "\x1b[11~" | "\x1b[[A" => Some("f1"),
        "\x1bOQ" | "\x1b[12~" | "\x1b[[B" => Some("f2"),
        "\x1bOR" | "\x1b[13~" | "\x1b[[C" => Some("f3"),
        "\x1bOS" | "\x1b[14~" | "\x1b[[D" => Some("f4"),
        "\x1b[15~" | "\x1b[[E" => Some("f5"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::parse_key;

    fn key(data: &str) -> Option<String> {
        parse_key(data)
    }

    #[test]
    fn arrows_in_both_cursor_modes() {
        assert_eq!(key("\x1b[A").as_deref(), Some("up"));
        assert_eq!(key("\x1bOB").as_deref(), Some("down"));
        assert_eq!(key("\x1b[D").as_deref(), Some("left"));
        assert_eq!(key("\x1bOC").as_deref(), Some("right"));
    }

    #[test]
    fn paging_keys() {
        assert_eq!(key("\x1b[5~").as_deref(), Some("pageUp"));
        assert_eq!(key("\x1b[6~").as_deref(), Some("pageDown"));
        assert_eq!(key("\x1b[1~").as_deref(), Some("home"));
        assert_eq!(key("\x1b[F").as_deref(), Some("end"));
        assert_eq!(key(" ").as_deref(), Some("space"));
    }

    #[test]
    fn letters_keep_case_and_controls_map_to_ctrl() {
        assert_eq!(key("g").as_deref(), Some("g"));
        assert_eq!(key("G").as_deref(), Some("G"));
        assert_eq!(key("[").as_deref(), Some("["));
        assert_eq!(key("\x03").as_deref(), Some("ctrl+c"));
        assert_eq!(key("\x06").as_deref(), Some("ctrl+f"));
        assert_eq!(key("\x1b").as_deref(), Some("escape"));
    }

    #[test]
    fn modified_cursor_keys() {
        assert_eq!(key("\x1b[1;5A").as_deref(), Some("ctrl+up"));
        assert_eq!(key("\x1b[1;2B").as_deref(), Some("shift+down"));
        assert_eq!(key("\x1b[6;3~").as_deref(), Some("alt+pageDown"));
    }

    #[test]
    fn unknown_sequences_are_ignored() {
        assert_eq!(key("\x1b[999z"), None);
        assert_eq!(key("é"), None);
        assert_eq!(key(""), None);
    }
}

//! Typed terminal output commands and a single output gate.
//!
//! Invariant: all terminal writes flow through `OutputGate::flush(..)`.

use std::io;

use crate::core::terminal::Terminal;

pub const ENTER_ALT_SCREEN: &str = "\x1b[?1049h";
pub const LEAVE_ALT_SCREEN: &str = "\x1b[?1049l";
pub const HIDE_CURSOR: &str = "\x1b[?25l";
pub const SHOW_CURSOR: &str = "\x1b[?25h";
pub const DISABLE_LINE_WRAP: &str = "\x1b[?7l";
pub const ENABLE_LINE_WRAP: &str = "\x1b[?7h";
pub const CLEAR_SCREEN: &str = "\x1b[H\x1b[2J";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCmd {
    /// Raw bytes/control sequences (UTF-8 string) to be written to the terminal.
    Bytes(String),
    BytesStatic(&'static str),

    EnterAltScreen,
    LeaveAltScreen,
    HideCursor,
    ShowCursor,
    DisableLineWrap,
    EnableLineWrap,
    ClearScreen,
    /// Cursor to a 0-based cell.
    MoveTo { row: u16, col: u16 },
}

impl TerminalCmd {
    pub fn bytes(data: impl Into<String>) -> Self {
        Self::Bytes(data.into())
    }

    /// Appends the bytes for this command to `out`.
    pub fn encode(&self, out: &mut String) {
        match self {
            TerminalCmd::Bytes(data) => out.push_str(data),
            TerminalCmd::BytesStatic(data) => out.push_str(data),
            TerminalCmd::EnterAltScreen => out.push_str(ENTER_ALT_SCREEN),
            TerminalCmd::LeaveAltScreen => out.push_str(LEAVE_ALT_SCREEN),
            TerminalCmd::HideCursor => out.push_str(HIDE_CURSOR),
            TerminalCmd::ShowCursor => out.push_str(SHOW_CURSOR),
            TerminalCmd::DisableLineWrap => out.push_str(DISABLE_LINE_WRAP),
            TerminalCmd::EnableLineWrap => out.push_str(ENABLE_LINE_WRAP),
            TerminalCmd::ClearScreen => out.push_str(CLEAR_SCREEN),
            TerminalCmd::MoveTo { row, col } => {
                out.push_str(&format!("\x1b[{};{}H", *row as u32 + 1, *col as u32 + 1));
            }
        }
    }
}

/// Concatenated bytes for a command list.
pub fn cmds_to_bytes(cmds: &[TerminalCmd]) -> String {
    let mut out = String::new();
    for cmd in cmds {
        cmd.encode(&mut out);
    }
    out
}

#[derive(Debug, Default)]
pub struct OutputGate {
    cmds: Vec<TerminalCmd>,
}

impl OutputGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cmd: TerminalCmd) {
        self.cmds.push(cmd);
    }

    pub fn extend<I>(&mut self, cmds: I)
    where
        I: IntoIterator<Item = TerminalCmd>,
    {
        self.cmds.extend(cmds);
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    pub fn clear(&mut self) {
        self.cmds.clear();
    }

    /// Writes buffered commands as a single terminal write.
    ///
    /// This is the single write gate: `Terminal::write(..)` must not be called
    /// from anywhere else. The buffer is emptied even when the write fails.
    pub fn flush<T: Terminal + ?Sized>(&mut self, term: &mut T) -> io::Result<()> {
        if self.cmds.is_empty() {
            return Ok(());
        }
        let data = cmds_to_bytes(&self.cmds);
        self.cmds.clear();
        term.write(&data)
    }
}

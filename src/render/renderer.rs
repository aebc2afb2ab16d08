//! Fullscreen row-diff renderer.
//!
//! Rows are addressed absolutely, so the renderer never tracks a hardware cursor. A frame
//! identical to the previous one produces no output at all.

use crate::core::output::TerminalCmd;
use crate::logging::{debug_redraw_enabled, log_redraw};
use crate::render::Frame;

const ROW_RESET: &str = "\x1b[0m";
const SYNC_START: &str = "\x1b[?2026h";
const SYNC_END: &str = "\x1b[?2026l";
const CLEAR_ALL: &str = "\x1b[H\x1b[2J";
const CLEAR_LINE: &str = "\x1b[2K";

#[derive(Debug, Default)]
pub struct ScreenRenderer {
    previous_rows: Vec<String>,
    previous_size: Option<(usize, usize)>,
    full_redraws: usize,
}

impl ScreenRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn full_redraws(&self) -> usize {
        self.full_redraws
    }

    /// Commands that bring the screen from the previous frame to `frame`.
    pub fn render(&mut self, frame: Frame) -> Vec<TerminalCmd> {
        let size = (frame.width(), frame.height());
        let rows = frame.into_rows();

        let reason = if self.previous_size.is_none() {
            Some("first render".to_string())
        } else if self.previous_size != Some(size) {
            let (old_width, old_height) = self.previous_size.unwrap_or_default();
            Some(format!(
                "size changed ({old_width}x{old_height} -> {}x{})",
                size.0, size.1
            ))
        } else {
            None
        };

        let buffer = match reason {
            Some(reason) => {
                if debug_redraw_enabled() {
                    log_redraw(&reason);
                }
                self.full_redraws += 1;
                full_render(&rows)
            }
            None => match diff_render(&self.previous_rows, &rows) {
                Some(buffer) => buffer,
                None => return Vec::new(),
            },
        };

        self.previous_rows = rows;
        self.previous_size = Some(size);
        vec![TerminalCmd::Bytes(buffer)]
    }
}

fn push_row(buffer: &mut String, index: usize, row: &str) {
    buffer.push_str(&format!("\x1b[{};1H", index + 1));
    buffer.push_str(CLEAR_LINE);
    buffer.push_str(row);
    buffer.push_str(ROW_RESET);
}

fn full_render(rows: &[String]) -> String {
    let mut buffer = String::from(SYNC_START);
    buffer.push_str(CLEAR_ALL);
    for (index, row) in rows.iter().enumerate() {
        if row.is_empty() {
            continue;
        }
        push_row(&mut buffer, index, row);
    }
    buffer.push_str(SYNC_END);
    buffer
}

fn diff_render(previous: &[String], rows: &[String]) -> Option<String> {
    let mut buffer = String::new();
    for (index, row) in rows.iter().enumerate() {
        if previous.get(index) == Some(row) {
            continue;
        }
        push_row(&mut buffer, index, row);
    }
    if buffer.is_empty() {
        return None;
    }
    Some(format!("{SYNC_START}{buffer}{SYNC_END}"))
}

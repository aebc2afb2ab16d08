//! Bottom status line, drawn in reverse video.

use crate::core::capture::ExitState;
use crate::core::component::Component;
use crate::core::scroll::ScrollPosition;
use crate::core::text::slice::truncate_to_width;
use crate::core::text::width::visible_width;
use crate::render::{Line, Span};

const REVERSE: &str = "7";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMessage {
    /// No run has completed yet.
    Waiting,
    /// Exit state of the capture on screen.
    Exit(ExitState),
    /// The last tick failed; shown until the next successful capture.
    Error(String),
    /// `--errexit` froze the view on a failing capture.
    Frozen(ExitState),
}

impl StatusMessage {
    pub fn text(&self) -> String {
        match self {
            StatusMessage::Waiting => "waiting for first run".to_string(),
            StatusMessage::Exit(exit) => exit.to_string(),
            StatusMessage::Error(message) => format!("error: {message}"),
            StatusMessage::Frozen(exit) => {
                format!("command failed ({exit}) - press any key to exit")
            }
        }
    }
}

pub struct StatusBar<'a> {
    pub message: &'a StatusMessage,
    pub position: ScrollPosition,
    /// Mode flags such as `FOLLOW` or `PAUSED`.
    pub flags: &'a [String],
}

impl StatusBar<'_> {
    fn right(&self) -> String {
        let position = self.position;
        let range = if position.total == 0 {
            "0/0".to_string()
        } else {
            format!(
                "{}-{}/{} {}%",
                position.first, position.last, position.total, position.percent
            )
        };
        let mut parts: Vec<&str> = self.flags.iter().map(String::as_str).collect();
        parts.push(&range);
        parts.join(" ")
    }
}

impl Component for StatusBar<'_> {
    fn render(&self, width: usize) -> Vec<Line> {
        let right = self.right();
        let right_width = visible_width(&right);
        let left = self.message.text();

        let text = if right_width + 2 <= width {
            let left = truncate_to_width(&left, width - right_width - 1, "...");
            let gap = width - visible_width(&left) - right_width;
            format!("{left}{}{right}", " ".repeat(gap))
        } else {
            truncate_to_width(&left, width, "...")
        };
        vec![Line::new(vec![Span::styled(REVERSE, text)])]
    }
}

//! Header line: `Every 2.0s: <command>` on the left, `<host>: <time>` on the right.

use std::time::Duration;

use time::OffsetDateTime;

use crate::core::component::Component;
use crate::core::text::slice::truncate_to_width;
use crate::core::text::width::visible_width;
use crate::render::{Line, Span};

pub struct Header<'a> {
    pub interval: Duration,
    pub command: &'a str,
    pub hostname: &'a str,
    /// Time of the capture on screen; `None` before the first run completes.
    pub captured_at: Option<OffsetDateTime>,
}

impl Header<'_> {
    fn left(&self) -> String {
        format!("Every {}: {}", format_interval(self.interval), self.command)
    }

    fn right(&self) -> String {
        let clock = self
            .captured_at
            .map(format_clock)
            .unwrap_or_else(|| "--:--:--".to_string());
        if self.hostname.is_empty() {
            clock
        } else {
            format!("{}: {clock}", self.hostname)
        }
    }
}

impl Component for Header<'_> {
    fn render(&self, width: usize) -> Vec<Line> {
        let left = self.left();
        let right = self.right();
        let right_width = visible_width(&right);

        // The clock goes first when space runs out; the command is truncated last.
        let line = if visible_width(&left) + 1 + right_width <= width {
            let gap = width - visible_width(&left) - right_width;
            format!("{left}{}{right}", " ".repeat(gap))
        } else {
            truncate_to_width(&left, width, "...")
        };
        vec![Line::new(vec![Span::new(line)])]
    }
}

/// `2.0s`, `0.5s`, `1.25s`.
pub fn format_interval(interval: Duration) -> String {
    let secs = interval.as_secs_f64();
    let tenths = format!("{secs:.1}");
    if (tenths.parse::<f64>().unwrap_or(secs) - secs).abs() < 1e-9 {
        format!("{tenths}s")
    } else {
        format!("{secs:.2}s")
    }
}

pub fn format_clock(at: OffsetDateTime) -> String {
    format!("{:02}:{:02}:{:02}", at.hour(), at.minute(), at.second())
}

/// This machine's hostname, empty when it can't be read.
#[cfg(unix)]
pub fn hostname() -> String {
    let mut buffer = [0u8; 256];
    let result = unsafe { libc::gethostname(buffer.as_mut_ptr() as *mut libc::c_char, buffer.len()) };
    if result != 0 {
        return String::new();
    }
    let end = buffer.iter().position(|byte| *byte == 0).unwrap_or(buffer.len());
    String::from_utf8_lossy(&buffer[..end]).into_owned()
}

#[cfg(not(unix))]
pub fn hostname() -> String {
    String::new()
}

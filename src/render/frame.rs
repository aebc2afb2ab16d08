//! Typed render model: a fullscreen frame of rows built from spans.

use crate::core::text::slice::slice_with_width;
use crate::core::text::width::visible_width;

/// A contiguous run of text, possibly carrying SGR sequences.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Span {
    text: String,
}

impl Span {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Text wrapped in an SGR style and a reset.
    pub fn styled(sgr: &str, text: impl AsRef<str>) -> Self {
        Self::new(format!("\x1b[{sgr}m{}\x1b[0m", text.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn width(&self) -> usize {
        visible_width(&self.text)
    }
}

impl From<String> for Span {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// One screen row.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Line {
    spans: Vec<Span>,
}

impl Line {
    pub fn new(spans: Vec<Span>) -> Self {
        Self { spans }
    }

    pub fn blank() -> Self {
        Self::default()
    }

    pub fn push(&mut self, span: Span) {
        self.spans.push(span);
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn width(&self) -> usize {
        self.spans.iter().map(Span::width).sum()
    }

    pub fn into_string(self) -> String {
        let mut out = String::new();
        for span in self.spans {
            out.push_str(span.as_str());
        }
        out
    }
}

impl From<String> for Line {
    fn from(text: String) -> Self {
        Self::new(vec![Span::new(text)])
    }
}

impl From<&str> for Line {
    fn from(text: &str) -> Self {
        Self::new(vec![Span::new(text)])
    }
}

/// A full screen: exactly `height` rows, none wider than `width` columns.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Frame {
    rows: Vec<String>,
    width: usize,
}

impl Frame {
    /// Pads with blank rows or drops the excess, and cuts rows wider than `width`.
    pub fn new(lines: Vec<Line>, width: usize, height: usize) -> Self {
        let mut rows: Vec<String> = lines
            .into_iter()
            .take(height)
            .map(|line| fit_row(line.into_string(), width))
            .collect();
        rows.resize(height, String::new());
        Self { rows, width }
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn into_rows(self) -> Vec<String> {
        self.rows
    }
}

fn fit_row(row: String, width: usize) -> String {
    if visible_width(&row) <= width {
        return row;
    }
    slice_with_width(&row, 0, width, true).text
}

//! Body of the screen: the visible slice of the capture, shifted by the horizontal offset.

use crate::core::component::Component;
use crate::core::text::slice::slice_by_column;
use crate::render::{Line, Span};

pub struct OutputPane<'a> {
    pub lines: &'a [String],
    pub h_offset: usize,
}

impl Component for OutputPane<'_> {
    fn render(&self, width: usize) -> Vec<Line> {
        self.lines
            .iter()
            .map(|line| {
                let text = slice_by_column(line, self.h_offset, width, true);
                Line::new(vec![Span::new(text)])
            })
            .collect()
    }
}

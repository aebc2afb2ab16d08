//! Renderable component interface.

use crate::render::Line;

/// A screen region that renders itself into rows of at most `width` columns.
pub trait Component {
    fn render(&self, width: usize) -> Vec<Line>;
}

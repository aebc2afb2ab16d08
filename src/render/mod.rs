//! Rendering pipeline.

pub mod frame;
pub mod renderer;

pub use frame::{Frame, Line, Span};
pub use renderer::ScreenRenderer;

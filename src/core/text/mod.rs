//! Text helpers (ANSI scanning, width calculations, slicing, sanitising).
//!
//! These helpers are pure (string in/string out) and live under `core` so the capture model and
//! widgets can depend on them without importing anything from the render layer.

pub mod ansi;
pub mod sanitize;
pub mod slice;
pub mod width;

//! Core interfaces and types.

pub mod capture;
pub mod component;
pub mod history;
pub mod input;
pub mod keybindings;
pub mod output;
pub mod scroll;
pub mod terminal;
pub mod text;

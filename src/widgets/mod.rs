//! Screen widgets: header, output body and status bar.

pub mod header;
pub mod output_pane;
pub mod status_bar;

pub use header::Header;
pub use output_pane::OutputPane;
pub use status_bar::{StatusBar, StatusMessage};

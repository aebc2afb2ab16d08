//! Terminal trait.

use std::io;

/// The terminal the viewer draws on.
pub trait Terminal {
    /// Enter raw mode and start delivering input and resize notifications.
    fn start(
        &mut self,
        on_input: Box<dyn FnMut(String) + Send>,
        on_resize: Box<dyn FnMut() + Send>,
    ) -> io::Result<()>;

    /// Stop input delivery and restore the original terminal mode.
    fn stop(&mut self) -> io::Result<()>;

    fn write(&mut self, data: &str) -> io::Result<()>;

    fn columns(&self) -> u16;
    fn rows(&self) -> u16;
}

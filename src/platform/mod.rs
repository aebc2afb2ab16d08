//! Platform-specific terminal and process integrations.

pub mod command_runner;
pub mod process_terminal;
pub mod stdin_buffer;

pub use command_runner::{CommandRunner, ProcessRunner};
pub use process_terminal::{install_panic_hook, PanicHookGuard};
#[cfg(unix)]
pub use process_terminal::{install_signal_handlers, HookTerminal, ProcessTerminal, SignalHookGuard};

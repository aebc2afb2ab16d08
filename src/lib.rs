//! Periodic command viewer.
//!
//! `leer` runs a command on a fixed-rate timer and shows its latest output fullscreen. The
//! scroll position is kept across refreshes and re-clamped when the output changes size.
//!
//! Invariant: single output gate — only `core::output::OutputGate::flush(..)` writes to the
//! terminal.
//!
//! # Public API Overview
//! - Run commands and get [`Capture`]s through the [`CommandRunner`] trait ([`ProcessRunner`]
//!   spawns real processes).
//! - Keep captures and viewport offsets in a [`ScrollBuffer`].
//! - Drive everything with [`ViewerRuntime`] over any [`Terminal`] ([`ProcessTerminal`] for
//!   the real tty).
//! - Parse the command line with [`Config::parse`].

#![allow(clippy::new_without_default, clippy::type_complexity)]

pub mod config;
pub mod error;
pub mod logging;

pub mod core;
pub mod platform;
pub mod render;
pub mod runtime;
pub mod widgets;

/// Command-line and environment configuration.
pub use crate::config::{CliAction, Config, EnvConfig};
/// Error types.
pub use crate::error::{ConfigError, ExecutionError, LeerError};

/// Capture model and scroll state.
pub use crate::core::capture::{Capture, ExitState};
pub use crate::core::history::CaptureHistory;
pub use crate::core::scroll::{ScrollBuffer, ScrollPosition, ViewState};

/// Keyboard input parsing and viewer keybindings.
pub use crate::core::input::parse_key;
pub use crate::core::keybindings::{
    KeyBinding, KeyId, ViewerAction, ViewerKeybindings, ViewerKeybindingsConfig,
    DEFAULT_VIEWER_KEYBINDINGS,
};

/// Terminal interfaces and process-backed implementation.
pub use crate::core::output::{OutputGate, TerminalCmd};
pub use crate::core::terminal::Terminal;
#[cfg(unix)]
pub use crate::platform::ProcessTerminal;

/// Command execution.
pub use crate::platform::{CommandRunner, ProcessRunner};

/// Input buffering for chunked terminal streams.
pub use crate::platform::stdin_buffer::StdinBuffer;

/// Render-layer frame types.
pub use crate::core::component::Component;
pub use crate::render::{Frame, Line, ScreenRenderer, Span};

/// View loop.
pub use crate::runtime::{LoopState, ViewerOptions, ViewerRuntime};

/// ANSI-aware truncation helper.
pub use crate::core::text::slice::truncate_to_width;
/// Visible width helper that ignores ANSI control sequences.
pub use crate::core::text::width::visible_width;

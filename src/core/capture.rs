//! Output of one run of the monitored command.

use std::fmt;
use std::time::Duration;

use time::OffsetDateTime;

use crate::core::text::sanitize::split_output;
use crate::core::text::width::visible_width;

/// How the command finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitState {
    Code(i32),
    Signal(i32),
    /// Killed by the runner after exceeding its timeout.
    TimedOut,
}

impl ExitState {
    pub fn success(&self) -> bool {
        matches!(self, ExitState::Code(0))
    }

    /// Process exit code used when `--errexit` ends the viewer on this state.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExitState::Code(code) if *code != 0 => *code,
            ExitState::Code(_) => 0,
            ExitState::Signal(_) | ExitState::TimedOut => 1,
        }
    }

    #[cfg(unix)]
    pub fn from_status(status: std::process::ExitStatus) -> Self {
        use std::os::unix::process::ExitStatusExt;

        match (status.code(), status.signal()) {
            (Some(code), _) => ExitState::Code(code),
            (None, Some(signal)) => ExitState::Signal(signal),
            (None, None) => ExitState::Code(1),
        }
    }

    #[cfg(not(unix))]
    pub fn from_status(status: std::process::ExitStatus) -> Self {
        ExitState::Code(status.code().unwrap_or(1))
    }
}

impl fmt::Display for ExitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitState::Code(code) => write!(f, "exit {code}"),
            ExitState::Signal(signal) => write!(f, "signal {signal}"),
            ExitState::TimedOut => f.write_str("timed out"),
        }
    }
}

/// Immutable snapshot of a command run. Superseded wholesale by the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    sequence: u64,
    lines: Vec<String>,
    max_width: usize,
    exit: ExitState,
    captured_at: OffsetDateTime,
    duration: Duration,
}

impl Capture {
    /// Builds a capture from raw output text. Lines are sanitised for painting.
    pub fn from_output(text: &str, exit: ExitState) -> Self {
        Self::from_lines(split_output(text), exit)
    }

    /// Builds a capture from lines that are already safe to paint.
    pub fn from_lines(lines: Vec<String>, exit: ExitState) -> Self {
        let max_width = lines
            .iter()
            .map(|line| visible_width(line))
            .max()
            .unwrap_or(0);
        Self {
            sequence: 0,
            lines,
            max_width,
            exit,
            captured_at: now(),
            duration: Duration::ZERO,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub(crate) fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Position in the run order, assigned when the capture enters a scroll buffer.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Display width of the widest line.
    pub fn max_width(&self) -> usize {
        self.max_width
    }

    pub fn exit(&self) -> ExitState {
        self.exit
    }

    pub fn captured_at(&self) -> OffsetDateTime {
        self.captured_at
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

/// Local wall-clock time, falling back to UTC when the local offset can't be determined
/// (the `time` crate refuses to read it once other threads exist).
pub(crate) fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

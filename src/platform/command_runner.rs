//! Runs the monitored command and turns its output into a `Capture`.

use std::io::{self, Read};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use wait_timeout::ChildExt;

use crate::config::Config;
use crate::core::capture::{Capture, ExitState};
use crate::error::ExecutionError;

const SHELL: &str = "/bin/sh";
/// `sh` exit statuses for a command it could not find or could not execute.
const SHELL_NOT_FOUND: i32 = 127;
const SHELL_NOT_EXECUTABLE: i32 = 126;

/// One invocation of the monitored command per call.
///
/// A non-zero exit is a successful run with a failing `ExitState`; only a command that
/// never ran (or could not be waited on) is an `ExecutionError`.
pub trait CommandRunner: Send + Sync {
    fn run(&self) -> Result<Capture, ExecutionError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for Box<R> {
    fn run(&self) -> Result<Capture, ExecutionError> {
        (**self).run()
    }
}

#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: String,
    args: Vec<String>,
    merge_stderr: bool,
    timeout: Option<Duration>,
    via_shell: bool,
}

impl ProcessRunner {
    /// Runs `command` joined with spaces through `sh -c`.
    pub fn shell(command: &[String]) -> Result<Self, ExecutionError> {
        if command.is_empty() {
            return Err(ExecutionError::EmptyCommand);
        }
        Ok(Self {
            program: SHELL.to_string(),
            args: vec!["-c".to_string(), command.join(" ")],
            merge_stderr: true,
            timeout: None,
            via_shell: true,
        })
    }

    /// Executes `command[0]` directly with the remaining words as arguments.
    pub fn exec(command: &[String]) -> Result<Self, ExecutionError> {
        let (program, args) = command.split_first().ok_or(ExecutionError::EmptyCommand)?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            merge_stderr: true,
            timeout: None,
            via_shell: false,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ExecutionError> {
        let runner = if config.exec {
            Self::exec(&config.command)?
        } else {
            Self::shell(&config.command)?
        };
        Ok(runner
            .with_merge_stderr(config.merge_stderr)
            .with_timeout(config.timeout))
    }

    pub fn with_merge_stderr(mut self, merge_stderr: bool) -> Self {
        self.merge_stderr = merge_stderr;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(if self.merge_stderr {
                Stdio::piped()
            } else {
                Stdio::null()
            });
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Own process group so a timeout can kill the whole pipeline.
            command.process_group(0);
        }
        command
    }

    fn wait(&self, child: &mut Child) -> Result<ExitState, ExecutionError> {
        let wait_error = |source| ExecutionError::Wait {
            program: self.program.clone(),
            source,
        };
        let Some(timeout) = self.timeout else {
            return child.wait().map(ExitState::from_status).map_err(wait_error);
        };
        match child.wait_timeout(timeout) {
            Ok(Some(status)) => Ok(ExitState::from_status(status)),
            Ok(None) => {
                kill_tree(child);
                child.wait().map_err(wait_error)?;
                Ok(ExitState::TimedOut)
            }
            Err(source) => {
                kill_tree(child);
                let _ = child.wait();
                Err(wait_error(source))
            }
        }
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self) -> Result<Capture, ExecutionError> {
        let started = Instant::now();
        let mut child = self.command().spawn().map_err(|source| ExecutionError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let stdout = spawn_reader(child.stdout.take());
        let stderr = spawn_reader(child.stderr.take());
        let exit = self.wait(&mut child);
        let stdout = join_reader(stdout);
        let stderr = join_reader(stderr);
        let exit = exit?;

        if let Some(err) = self.shell_spawn_failure(exit, &stdout, &stderr) {
            return Err(err);
        }

        let text = merge_output(&stdout, &stderr);
        Ok(Capture::from_output(&text, exit).with_duration(started.elapsed()))
    }
}

#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    let pid = child.id() as libc::pid_t;
    unsafe {
        libc::kill(-pid, libc::SIGKILL);
    }
    let _ = child.kill();
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
}

impl ProcessRunner {
    /// `sh -c` reports a missing or non-executable command as exit 127 or 126 with only its
    /// own diagnostic on stderr. That counts as a failed spawn of the command itself.
    fn shell_spawn_failure(
        &self,
        exit: ExitState,
        stdout: &[u8],
        stderr: &[u8],
    ) -> Option<ExecutionError> {
        if !self.via_shell || !stdout.is_empty() {
            return None;
        }
        let kind = match exit {
            ExitState::Code(SHELL_NOT_FOUND) => io::ErrorKind::NotFound,
            ExitState::Code(SHELL_NOT_EXECUTABLE) => io::ErrorKind::PermissionDenied,
            _ => return None,
        };
        let diagnostic = String::from_utf8_lossy(stderr);
        let mut lines = diagnostic.lines().filter(|line| !line.trim().is_empty());
        let message = match (lines.next(), lines.next()) {
            (None, _) => io::Error::from(kind),
            (Some(line), None) => io::Error::new(kind, line.trim().to_string()),
            (Some(_), Some(_)) => return None,
        };
        Some(ExecutionError::Spawn {
            program: self.args.last().cloned().unwrap_or_default(),
            source: message,
        })
    }
}

fn spawn_reader<P>(pipe: Option<P>) -> Option<JoinHandle<Vec<u8>>>
where
    P: Read + Send + 'static,
{
    let mut pipe = pipe?;
    Some(thread::spawn(move || {
        let mut bytes = Vec::new();
        let _ = pipe.read_to_end(&mut bytes);
        bytes
    }))
}

fn join_reader(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

/// Stdout followed by stderr, decoded lossily.
fn merge_output(stdout: &[u8], stderr: &[u8]) -> String {
    let mut text = String::from_utf8_lossy(stdout).into_owned();
    if !stderr.is_empty() {
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(&String::from_utf8_lossy(stderr));
    }
    text
}

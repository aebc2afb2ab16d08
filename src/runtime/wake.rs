//! Wake-up channel between helper threads and the view loop.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Instant;

use crate::core::capture::Capture;
use crate::error::ExecutionError;

pub type RunResult = Result<Capture, ExecutionError>;

#[derive(Default)]
struct RuntimeWakeState {
    pending_inputs: Vec<String>,
    pending_resize: bool,
    pending_results: Vec<RunResult>,
    quit_signal: Option<i32>,
    stop_requested: bool,
}

impl RuntimeWakeState {
    fn has_events(&self) -> bool {
        !self.pending_inputs.is_empty()
            || self.pending_resize
            || !self.pending_results.is_empty()
            || self.quit_signal.is_some()
    }
}

/// Everything posted since the last drain.
#[derive(Default)]
pub struct WakeEvents {
    pub inputs: Vec<String>,
    pub resize: bool,
    pub results: Vec<RunResult>,
    pub quit_signal: Option<i32>,
}

impl WakeEvents {
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && !self.resize && self.results.is_empty() && self.quit_signal.is_none()
    }
}

#[derive(Default)]
pub struct RuntimeWake {
    state: Mutex<RuntimeWakeState>,
    cvar: Condvar,
}

impl RuntimeWake {
    fn lock(&self) -> MutexGuard<'_, RuntimeWakeState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Blocks until an event is pending, `deadline` passes or a stop is requested.
    ///
    /// Returns `false` only when stopped.
    pub fn wait_until(&self, deadline: Option<Instant>) -> bool {
        let mut state = self.lock();
        while !state.stop_requested && !state.has_events() {
            match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    state = self
                        .cvar
                        .wait_timeout(state, deadline - now)
                        .map(|(state, _)| state)
                        .unwrap_or_else(|poisoned| poisoned.into_inner().0);
                }
                None => {
                    state = self
                        .cvar
                        .wait(state)
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                }
            }
        }
        !state.stop_requested
    }

    pub fn enqueue_input(&self, data: String) {
        self.lock().pending_inputs.push(data);
        self.cvar.notify_one();
    }

    pub fn signal_resize(&self) {
        self.lock().pending_resize = true;
        self.cvar.notify_one();
    }

    pub fn deliver_result(&self, result: RunResult) {
        self.lock().pending_results.push(result);
        self.cvar.notify_one();
    }

    /// A termination signal asked for a clean quit.
    pub fn request_quit(&self, signal: i32) {
        self.lock().quit_signal.get_or_insert(signal);
        self.cvar.notify_one();
    }

    pub fn request_stop(&self) {
        self.lock().stop_requested = true;
        self.cvar.notify_all();
    }

    pub fn take_events(&self) -> WakeEvents {
        let mut state = self.lock();
        WakeEvents {
            inputs: std::mem::take(&mut state.pending_inputs),
            resize: std::mem::take(&mut state.pending_resize),
            results: std::mem::take(&mut state.pending_results),
            quit_signal: state.quit_signal.take(),
        }
    }

    pub fn reset_for_start(&self) {
        *self.lock() = RuntimeWakeState::default();
    }
}

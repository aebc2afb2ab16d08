//! The view loop.
//!
//! One thread owns the scroll buffer, renderer and output gate. The stdin reader, the
//! SIGWINCH thread and the per-tick worker only post into [`RuntimeWake`]; the loop waits on
//! it with the next tick deadline as timeout, so input never starves the timer and a slow
//! command never blocks scrolling.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::{Config, DEFAULT_INTERVAL};
use crate::core::capture::{Capture, ExitState};
use crate::core::component::Component;
use crate::core::keybindings::{ViewerAction, ViewerKeybindings};
use crate::core::output::{OutputGate, TerminalCmd};
use crate::core::scroll::ScrollBuffer;
use crate::core::terminal::Terminal;
use crate::error::{ExecutionError, LeerError};
use crate::logging::{debug_log_enabled, log_event};
use crate::platform::command_runner::CommandRunner;
use crate::render::{Frame, Line, ScreenRenderer};
use crate::runtime::schedule::{TickDecision, TickSchedule};
use crate::runtime::wake::{RunResult, RuntimeWake};
use crate::widgets::header::{format_interval, hostname};
use crate::widgets::{Header, OutputPane, StatusBar, StatusMessage};

const HORIZONTAL_STEP: isize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting for the next tick or input.
    Idle,
    /// A command run is in flight.
    Refreshing,
    /// Drawing the visible slice.
    Rendering,
    /// Quit was requested; the loop exits and restores the terminal.
    Terminating,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerOptions {
    pub interval: Duration,
    /// Command text for the header.
    pub command_label: String,
    pub show_header: bool,
    pub errexit: bool,
    pub follow: bool,
    pub history: usize,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            command_label: String::new(),
            show_header: true,
            errexit: false,
            follow: false,
            history: 0,
        }
    }
}

impl ViewerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: config.interval,
            command_label: config.command_label(),
            show_header: config.show_header,
            errexit: config.errexit,
            follow: config.follow,
            history: config.history,
        }
    }
}

#[derive(Debug, Default)]
struct CrashCleanup {
    ran: AtomicBool,
}

impl CrashCleanup {
    fn run<T: Terminal>(&self, terminal: &mut T) {
        if self.ran.swap(true, Ordering::SeqCst) {
            return;
        }

        // Termios is restored by the unwinding `stop()`; this only gets the user's screen back.
        let mut output = OutputGate::new();
        output.push(TerminalCmd::EnableLineWrap);
        output.push(TerminalCmd::ShowCursor);
        output.push(TerminalCmd::LeaveAltScreen);
        let _ = output.flush(terminal);
    }

    #[cfg(unix)]
    fn run_best_effort(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut terminal = crate::platform::process_terminal::HookTerminal::new();
            self.run(&mut terminal);
        }));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    width: usize,
    height: usize,
    header: bool,
    body: usize,
    status: bool,
}

pub struct ViewerRuntime<T: Terminal, R: CommandRunner + 'static> {
    terminal: T,
    runner: Arc<R>,
    options: ViewerOptions,
    hostname: String,
    scroll: ScrollBuffer,
    renderer: ScreenRenderer,
    output: OutputGate,
    keybindings: ViewerKeybindings,
    wake: Arc<RuntimeWake>,
    schedule: TickSchedule,
    state: LoopState,
    in_flight: bool,
    runs_started: u64,
    frozen: Option<ExitState>,
    transient_error: Option<String>,
    ever_captured: bool,
    spawn_failures: u64,
    exit_code: Option<i32>,
    stopped: bool,
    cleanup_hooks: bool,
    #[cfg(unix)]
    signal_hook_guard: Option<crate::platform::SignalHookGuard>,
    #[cfg(unix)]
    panic_hook_guard: Option<crate::platform::PanicHookGuard>,
}

impl<T: Terminal, R: CommandRunner + 'static> ViewerRuntime<T, R> {
    pub fn new(terminal: T, runner: R, options: ViewerOptions) -> Self {
        let scroll = ScrollBuffer::new(options.history).with_follow(options.follow);
        let schedule = TickSchedule::new(Instant::now(), options.interval);
        Self {
            terminal,
            runner: Arc::new(runner),
            hostname: if options.show_header {
                hostname()
            } else {
                String::new()
            },
            options,
            scroll,
            renderer: ScreenRenderer::new(),
            output: OutputGate::new(),
            keybindings: ViewerKeybindings::default(),
            wake: Arc::new(RuntimeWake::default()),
            schedule,
            state: LoopState::Idle,
            in_flight: false,
            runs_started: 0,
            frozen: None,
            transient_error: None,
            ever_captured: false,
            spawn_failures: 0,
            exit_code: None,
            stopped: true,
            cleanup_hooks: false,
            #[cfg(unix)]
            signal_hook_guard: None,
            #[cfg(unix)]
            panic_hook_guard: None,
        }
    }

    pub fn with_keybindings(mut self, keybindings: ViewerKeybindings) -> Self {
        self.keybindings = keybindings;
        self
    }

    /// Route SIGINT/SIGTERM/SIGHUP into a clean quit and restore the screen on panic.
    ///
    /// Both hooks are process-wide, so only the binary turns this on.
    pub fn with_cleanup_hooks(mut self, enabled: bool) -> Self {
        self.cleanup_hooks = enabled;
        self
    }

    /// Replaces the hostname shown in the header.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn start(&mut self) -> io::Result<()> {
        self.output.clear();
        self.wake.reset_for_start();
        self.state = LoopState::Idle;
        self.exit_code = None;

        // Mark running early so Drop can attempt cleanup if `Terminal::start()` panics.
        self.stopped = false;

        if self.cleanup_hooks {
            if let Err(err) = self.install_cleanup_hooks() {
                self.stopped = true;
                self.uninstall_cleanup_hooks();
                return Err(err);
            }
        }

        let wake_input = Arc::clone(&self.wake);
        let wake_resize = Arc::clone(&self.wake);
        if let Err(err) = self.terminal.start(
            Box::new(move |data| {
                wake_input.enqueue_input(data);
            }),
            Box::new(move || {
                wake_resize.signal_resize();
            }),
        ) {
            self.stopped = true;
            self.uninstall_cleanup_hooks();
            return Err(err);
        }

        self.renderer = ScreenRenderer::new();
        self.output.push(TerminalCmd::EnterAltScreen);
        self.output.push(TerminalCmd::HideCursor);
        self.output.push(TerminalCmd::DisableLineWrap);
        self.output.push(TerminalCmd::ClearScreen);
        self.output.flush(&mut self.terminal)?;

        self.sync_viewport();
        self.schedule = TickSchedule::new(Instant::now(), self.options.interval);
        log_event(
            "viewer",
            format!(
                "start: every {} running {:?} ({}x{})",
                format_interval(self.options.interval),
                self.options.command_label,
                self.terminal.columns(),
                self.terminal.rows()
            ),
        );
        Ok(())
    }

    pub fn stop(&mut self) -> io::Result<()> {
        if self.stopped {
            return Ok(());
        }
        self.wake.request_stop();
        self.state = LoopState::Terminating;
        self.output.push(TerminalCmd::EnableLineWrap);
        self.output.push(TerminalCmd::ShowCursor);
        self.output.push(TerminalCmd::LeaveAltScreen);
        let flushed = self.output.flush(&mut self.terminal);
        let stopped = self.terminal.stop();
        self.stopped = true;
        self.uninstall_cleanup_hooks();
        log_event(
            "viewer",
            format!(
                "stop: {} runs, exit code {}",
                self.runs_started,
                self.exit_code.unwrap_or(0)
            ),
        );
        flushed.and(stopped)
    }

    #[cfg(unix)]
    fn install_cleanup_hooks(&mut self) -> io::Result<()> {
        let wake = Arc::clone(&self.wake);
        self.signal_hook_guard = Some(crate::platform::install_signal_handlers(
            move |signal| wake.request_quit(signal),
        )?);
        let cleanup = Arc::new(CrashCleanup::default());
        self.panic_hook_guard = Some(crate::platform::install_panic_hook(move || {
            cleanup.run_best_effort()
        }));
        Ok(())
    }

    #[cfg(not(unix))]
    fn install_cleanup_hooks(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn uninstall_cleanup_hooks(&mut self) {
        #[cfg(unix)]
        {
            self.signal_hook_guard = None;
            self.panic_hook_guard = None;
        }
    }

    /// Runs until quit, then restores the terminal. Returns the process exit code.
    pub fn run(&mut self) -> Result<i32, LeerError> {
        self.start()
            .map_err(LeerError::terminal("starting the terminal"))?;
        let looped = self.run_until_quit();
        let stopped = self
            .stop()
            .map_err(LeerError::terminal("restoring the terminal"));
        looped.map_err(LeerError::terminal("drawing the screen"))?;
        stopped?;
        Ok(self.exit_code.unwrap_or(0))
    }

    fn run_until_quit(&mut self) -> io::Result<()> {
        while !self.should_exit() {
            self.run_blocking_once()?;
        }
        Ok(())
    }

    /// Waits for the next tick deadline or event, handles everything pending and renders.
    ///
    /// Does not loop; see [`ViewerRuntime::run`].
    pub fn run_blocking_once(&mut self) -> io::Result<()> {
        if self.should_exit() {
            return Ok(());
        }

        if !self.wake.wait_until(self.schedule.next_deadline()) {
            return Ok(());
        }
        let events = self.wake.take_events();

        if let Some(signal) = events.quit_signal {
            log_event("viewer", format!("quit on signal {signal}"));
            let code = self.normal_exit_code();
            self.quit(code);
            return Ok(());
        }

        if events.resize {
            self.sync_viewport();
            log_event(
                "viewer",
                format!(
                    "resize to {}x{}",
                    self.terminal.columns(),
                    self.terminal.rows()
                ),
            );
        }

        for result in events.results {
            self.apply_result(result);
        }

        for data in &events.inputs {
            self.handle_input(data);
            if self.should_exit() {
                return Ok(());
            }
        }

        self.poll_schedule(Instant::now());
        self.render()
    }

    /// Applies one key sequence.
    pub fn handle_input(&mut self, data: &str) {
        if let Some(exit) = self.frozen {
            self.quit(exit.exit_code());
            return;
        }
        let Some(action) = self.keybindings.action_for(data) else {
            return;
        };

        match action {
            ViewerAction::LineDown => self.scroll.scroll(1),
            ViewerAction::LineUp => self.scroll.scroll(-1),
            ViewerAction::PageDown => self.scroll.page_down(),
            ViewerAction::PageUp => self.scroll.page_up(),
            ViewerAction::HalfPageDown => self.scroll.half_page_down(),
            ViewerAction::HalfPageUp => self.scroll.half_page_up(),
            ViewerAction::Top => self.scroll.scroll_to_top(),
            ViewerAction::Bottom => self.scroll.scroll_to_bottom(),
            ViewerAction::ScrollLeft => self.scroll.scroll_horizontal(-HORIZONTAL_STEP),
            ViewerAction::ScrollRight => self.scroll.scroll_horizontal(HORIZONTAL_STEP),
            ViewerAction::LineStart => self.scroll.scroll_to_line_start(),
            ViewerAction::RefreshNow => self.refresh_now(),
            ViewerAction::TogglePause => self.toggle_pause(),
            ViewerAction::ToggleFollow => {
                if self.scroll.toggle_follow() {
                    self.scroll.scroll_to_top();
                }
            }
            ViewerAction::OlderCapture => {
                self.scroll.show_older();
            }
            ViewerAction::NewerCapture => {
                self.scroll.show_newer();
            }
            ViewerAction::Quit => {
                let code = self.normal_exit_code();
                self.quit(code);
            }
        }
    }

    fn quit(&mut self, code: i32) {
        self.exit_code.get_or_insert(code);
        self.state = LoopState::Terminating;
    }

    /// 1 when every run so far failed to spawn, 0 otherwise.
    fn normal_exit_code(&self) -> i32 {
        if !self.ever_captured && self.spawn_failures > 0 {
            1
        } else {
            0
        }
    }

    fn toggle_pause(&mut self) {
        if self.schedule.is_paused() {
            self.schedule.resume(Instant::now());
            log_event("tick", "resumed");
        } else {
            self.schedule.pause();
            log_event("tick", "paused");
        }
    }

    fn refresh_now(&mut self) {
        if self.in_flight {
            log_event("tick", "manual refresh ignored: run in flight");
            return;
        }
        let now = Instant::now();
        self.schedule.restart_after(now);
        self.start_run();
    }

    fn poll_schedule(&mut self, now: Instant) {
        match self.schedule.poll(now, self.in_flight) {
            TickDecision::Wait => {}
            TickDecision::Skip { skipped } => {
                log_event("tick", format!("skipped {skipped}: run in flight"));
            }
            TickDecision::Run { skipped } => {
                if skipped > 0 {
                    log_event("tick", format!("{skipped} late deadlines dropped"));
                }
                self.start_run();
            }
        }
    }

    fn start_run(&mut self) {
        let runner = Arc::clone(&self.runner);
        let wake = Arc::clone(&self.wake);
        self.runs_started += 1;
        let run = self.runs_started;

        let spawned = thread::Builder::new()
            .name(format!("leer-run-{run}"))
            .spawn(move || {
                let result = runner.run();
                wake.deliver_result(result);
            });
        match spawned {
            Ok(_) => {
                self.in_flight = true;
                self.state = LoopState::Refreshing;
                log_event("tick", format!("run {run} fired"));
            }
            Err(err) => {
                log_event("tick", format!("run {run} not started: {err}"));
                self.transient_error = Some(format!("cannot start worker thread: {err}"));
            }
        }
    }

    fn apply_result(&mut self, result: RunResult) {
        self.in_flight = false;
        match result {
            Ok(capture) => {
                let exit = capture.exit();
                if debug_log_enabled() {
                    log_event(
                        "capture",
                        format!(
                            "{} lines, {exit}, {:?}",
                            capture.line_count(),
                            capture.duration()
                        ),
                    );
                }
                self.ever_captured = true;
                self.transient_error = None;
                self.scroll.update(capture);

                if self.options.errexit && !exit.success() {
                    log_event("viewer", format!("frozen on {exit}"));
                    self.frozen = Some(exit);
                    self.schedule.pause();
                    self.scroll.show_latest();
                }
            }
            Err(err) => {
                if matches!(err, ExecutionError::Spawn { .. }) {
                    self.spawn_failures += 1;
                }
                log_event("spawn", err.to_string());
                self.transient_error = Some(err.to_string());
            }
        }
    }

    fn layout(&self) -> Layout {
        let width = self.terminal.columns() as usize;
        let height = self.terminal.rows() as usize;
        let status = height >= 1;
        let header = self.options.show_header && height >= 3;
        let body = height - usize::from(status) - usize::from(header);
        Layout {
            width,
            height,
            header,
            body,
            status,
        }
    }

    fn sync_viewport(&mut self) {
        let layout = self.layout();
        self.scroll.set_viewport(layout.width, layout.body);
    }

    pub fn status(&self) -> StatusMessage {
        if let Some(exit) = self.frozen {
            return StatusMessage::Frozen(exit);
        }
        if let Some(error) = &self.transient_error {
            return StatusMessage::Error(error.clone());
        }
        match self.scroll.displayed() {
            Some(capture) => StatusMessage::Exit(capture.exit()),
            None => StatusMessage::Waiting,
        }
    }

    fn flags(&self) -> Vec<String> {
        let mut flags = Vec::new();
        if self.scroll.follow_latest() {
            flags.push("FOLLOW".to_string());
        }
        if self.schedule.is_paused() && self.frozen.is_none() {
            flags.push("PAUSED".to_string());
        }
        let age = self.scroll.history_age();
        if age > 0 {
            flags.push(format!("HISTORY -{age}"));
        }
        flags
    }

    fn render(&mut self) -> io::Result<()> {
        if self.stopped {
            return Ok(());
        }
        self.state = LoopState::Rendering;
        self.sync_viewport();
        let layout = self.layout();

        let mut lines: Vec<Line> = Vec::with_capacity(layout.height);
        if layout.header {
            let header = Header {
                interval: self.options.interval,
                command: &self.options.command_label,
                hostname: &self.hostname,
                captured_at: self.scroll.displayed().map(Capture::captured_at),
            };
            lines.extend(header.render(layout.width));
        }

        let pane = OutputPane {
            lines: self.scroll.visible_slice(layout.body),
            h_offset: self.scroll.view().h_offset,
        };
        let mut body = pane.render(layout.width);
        body.resize_with(layout.body, Line::blank);
        lines.extend(body);

        if layout.status {
            let message = self.status();
            let flags = self.flags();
            let bar = StatusBar {
                message: &message,
                position: self.scroll.position(),
                flags: &flags,
            };
            lines.extend(bar.render(layout.width));
        }

        let frame = Frame::new(lines, layout.width, layout.height);
        let cmds = self.renderer.render(frame);
        self.output.extend(cmds);
        let flushed = self.output.flush(&mut self.terminal);

        self.state = if self.in_flight {
            LoopState::Refreshing
        } else {
            LoopState::Idle
        };
        flushed
    }

    pub fn scroll(&self) -> &ScrollBuffer {
        &self.scroll
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn should_exit(&self) -> bool {
        self.state == LoopState::Terminating
    }

    /// Set once quit was requested.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    pub fn is_paused(&self) -> bool {
        self.schedule.is_paused()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn runs_started(&self) -> u64 {
        self.runs_started
    }

    pub fn spawn_failures(&self) -> u64 {
        self.spawn_failures
    }

    pub fn full_redraws(&self) -> usize {
        self.renderer.full_redraws()
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut T {
        &mut self.terminal
    }
}

impl<T: Terminal, R: CommandRunner + 'static> Drop for ViewerRuntime<T, R> {
    fn drop(&mut self) {
        if self.stopped {
            return;
        }

        // Never panic in Drop, especially during unwind.
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = self.stop();
        }));
    }
}

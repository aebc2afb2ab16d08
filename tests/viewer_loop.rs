use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use leer::{
    Capture, CommandRunner, ExecutionError, ExitState, LoopState, Terminal, ViewerOptions,
    ViewerRuntime,
};

const RESTORE: &str = "\x1b[?7h\x1b[?25h\x1b[?1049l";

#[derive(Default)]
struct TerminalState {
    writes: String,
    columns: u16,
    rows: u16,
    on_input: Option<Box<dyn FnMut(String) + Send>>,
    on_resize: Option<Box<dyn FnMut() + Send>>,
}

#[derive(Clone)]
struct HarnessTerminal {
    state: Arc<Mutex<TerminalState>>,
}

impl HarnessTerminal {
    fn new(columns: u16, rows: u16) -> Self {
        Self {
            state: Arc::new(Mutex::new(TerminalState {
                columns,
                rows,
                ..TerminalState::default()
            })),
        }
    }

    fn take_writes(&self) -> String {
        let mut state = self.state.lock().expect("lock terminal state for writes");
        std::mem::take(&mut state.writes)
    }

    fn set_size(&self, columns: u16, rows: u16) {
        let mut state = self.state.lock().expect("lock terminal state for resize");
        state.columns = columns;
        state.rows = rows;
    }

    fn is_started(&self) -> bool {
        let state = self.state.lock().expect("lock terminal state");
        state.on_input.is_some()
    }

    fn emit_resize(&self) {
        let mut state = self
            .state
            .lock()
            .expect("lock terminal state for resize callback");
        if let Some(callback) = state.on_resize.as_mut() {
            callback();
        }
    }

    fn emit_input(&self, data: &str) {
        let mut state = self
            .state
            .lock()
            .expect("lock terminal state for input callback");
        if let Some(callback) = state.on_input.as_mut() {
            callback(data.to_string());
        }
    }
}

impl Terminal for HarnessTerminal {
    fn start(
        &mut self,
        on_input: Box<dyn FnMut(String) + Send>,
        on_resize: Box<dyn FnMut() + Send>,
    ) -> io::Result<()> {
        let mut state = self.state.lock().expect("lock terminal state for start");
        state.on_input = Some(on_input);
        state.on_resize = Some(on_resize);
        Ok(())
    }

    fn stop(&mut self) -> io::Result<()> {
        let mut state = self.state.lock().expect("lock terminal state for stop");
        state.on_input = None;
        state.on_resize = None;
        Ok(())
    }

    fn write(&mut self, data: &str) -> io::Result<()> {
        let mut state = self.state.lock().expect("lock terminal state for write");
        state.writes.push_str(data);
        Ok(())
    }

    fn columns(&self) -> u16 {
        let state = self.state.lock().expect("lock terminal state for columns");
        state.columns
    }

    fn rows(&self) -> u16 {
        let state = self.state.lock().expect("lock terminal state for rows");
        state.rows
    }
}

#[derive(Clone)]
enum Step {
    Output(String, ExitState),
    SpawnFailure,
    /// Waits for the test to release the gate before returning the output.
    Blocked(String),
}

struct ScriptedRunner {
    steps: Mutex<VecDeque<Step>>,
    /// Repeated once the script runs out.
    fallback: Step,
    gate: Mutex<Option<mpsc::Receiver<()>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedRunner {
    fn repeating(step: Step) -> Self {
        Self::scripted(Vec::new(), step)
    }

    fn scripted(steps: Vec<Step>, fallback: Step) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            fallback,
            gate: Mutex::new(None),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn with_gate(self, gate: mpsc::Receiver<()>) -> Self {
        *self.gate.lock().expect("lock gate") = Some(gate);
        self
    }

    fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self) -> Result<Capture, ExecutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .lock()
            .expect("lock steps")
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        match step {
            Step::Output(text, exit) => Ok(Capture::from_output(&text, exit)),
            Step::SpawnFailure => Err(ExecutionError::Spawn {
                program: "no-such-command".to_string(),
                source: io::Error::from(io::ErrorKind::NotFound),
            }),
            Step::Blocked(text) => {
                if let Some(gate) = self.gate.lock().expect("lock gate").as_ref() {
                    let _ = gate.recv();
                }
                Ok(Capture::from_output(&text, ExitState::Code(0)))
            }
        }
    }
}

fn ok(text: &str) -> Step {
    Step::Output(text.to_string(), ExitState::Code(0))
}

fn numbered(count: usize) -> String {
    (1..=count).map(|n| format!("line {n}\n")).collect()
}

fn options(interval: Duration) -> ViewerOptions {
    ViewerOptions {
        interval,
        command_label: "scripted".to_string(),
        ..ViewerOptions::default()
    }
}

type Viewer = ViewerRuntime<HarnessTerminal, ScriptedRunner>;

fn viewer(
    terminal: &HarnessTerminal,
    runner: ScriptedRunner,
    options: ViewerOptions,
) -> Viewer {
    ViewerRuntime::new(terminal.clone(), runner, options).with_hostname("testhost")
}

/// Runs loop iterations until `done` holds. Panics after `max_iterations`.
fn drive_until(viewer: &mut Viewer, max_iterations: usize, done: impl Fn(&Viewer) -> bool) {
    for _ in 0..max_iterations {
        if done(viewer) {
            return;
        }
        viewer.run_blocking_once().expect("loop iteration");
    }
    assert!(done(viewer), "condition not reached");
}

fn wait_for_capture(viewer: &mut Viewer) {
    drive_until(viewer, 20, |viewer| {
        viewer.scroll().displayed().is_some() && !viewer.in_flight()
    });
}

#[test]
fn echo_hello_after_one_tick() {
    let terminal = HarnessTerminal::new(80, 12);
    let mut viewer = viewer(
        &terminal,
        ScriptedRunner::repeating(ok("hello\n")),
        options(Duration::from_secs(60)),
    );
    viewer.start().expect("start");
    let startup = terminal.take_writes();
    assert!(startup.starts_with("\x1b[?1049h\x1b[?25l\x1b[?7l\x1b[H\x1b[2J"));

    viewer.run_blocking_once().expect("first tick");
    assert_eq!(viewer.runs_started(), 1);
    viewer.run_blocking_once().expect("deliver capture");

    let capture = viewer.scroll().displayed().expect("capture on screen");
    assert_eq!(capture.lines(), ["hello"]);
    assert_eq!(capture.exit(), ExitState::Code(0));
    assert_eq!(viewer.scroll().visible_slice(10), ["hello"]);
    assert_eq!(viewer.state(), LoopState::Idle);

    let writes = terminal.take_writes();
    assert!(writes.contains("Every 60.0s: scripted"));
    assert!(writes.contains("hello"));
    assert!(writes.contains("exit 0"));
}

#[test]
fn spawn_failure_is_shown_and_the_next_tick_still_runs() {
    let terminal = HarnessTerminal::new(80, 12);
    let runner = ScriptedRunner::repeating(Step::SpawnFailure);
    let calls = runner.calls();
    let mut viewer = viewer(&terminal, runner, options(Duration::from_millis(30)));
    viewer.start().expect("start");

    drive_until(&mut viewer, 200, |viewer| viewer.spawn_failures() >= 2);
    assert!(!viewer.should_exit());
    assert!(calls.load(Ordering::SeqCst) >= 2);
    assert!(terminal
        .take_writes()
        .contains("error: cannot run no-such-command"));

    terminal.emit_input("q");
    drive_until(&mut viewer, 20, |viewer| viewer.should_exit());
    assert_eq!(viewer.exit_code(), Some(1));
    viewer.stop().expect("stop");
}

#[cfg(unix)]
#[test]
fn missing_command_through_the_shell_exits_with_one() {
    let terminal = HarnessTerminal::new(80, 12);
    let runner =
        leer::ProcessRunner::shell(&["leer-no-such-command-xyz".to_string()]).expect("runner");
    let mut viewer = ViewerRuntime::new(terminal.clone(), runner, options(Duration::from_secs(60)))
        .with_hostname("testhost");
    viewer.start().expect("start");

    viewer.run_blocking_once().expect("first tick");
    for _ in 0..20 {
        if viewer.spawn_failures() > 0 {
            break;
        }
        viewer.run_blocking_once().expect("deliver result");
    }
    assert_eq!(viewer.spawn_failures(), 1);
    assert!(viewer.scroll().displayed().is_none());

    terminal.emit_input("q");
    for _ in 0..20 {
        if viewer.should_exit() {
            break;
        }
        viewer.run_blocking_once().expect("quit");
    }
    assert_eq!(viewer.exit_code(), Some(1));
    viewer.stop().expect("stop");
}

#[test]
fn error_clears_on_next_successful_capture() {
    let terminal = HarnessTerminal::new(80, 12);
    let runner = ScriptedRunner::scripted(vec![Step::SpawnFailure], ok("back\n"));
    let mut viewer = viewer(&terminal, runner, options(Duration::from_millis(20)));
    viewer.start().expect("start");

    wait_for_capture(&mut viewer);
    assert_eq!(viewer.spawn_failures(), 1);
    assert_eq!(
        viewer.status(),
        leer::widgets::StatusMessage::Exit(ExitState::Code(0))
    );

    terminal.emit_input("q");
    drive_until(&mut viewer, 20, |viewer| viewer.should_exit());
    // A capture arrived, so a failed first run does not make the exit code 1.
    assert_eq!(viewer.exit_code(), Some(0));
}

#[test]
fn quit_restores_the_terminal() {
    let terminal = HarnessTerminal::new(80, 12);
    let mut viewer = viewer(
        &terminal,
        ScriptedRunner::repeating(ok("hi\n")),
        options(Duration::from_secs(60)),
    );
    viewer.start().expect("start");
    wait_for_capture(&mut viewer);
    terminal.take_writes();

    terminal.emit_input("q");
    viewer.run_blocking_once().expect("quit");
    assert!(viewer.should_exit());
    assert_eq!(viewer.state(), LoopState::Terminating);

    viewer.stop().expect("stop");
    assert!(terminal.take_writes().ends_with(RESTORE));
    assert!(!terminal.is_started());

    // A second stop writes nothing.
    viewer.stop().expect("second stop");
    assert!(terminal.take_writes().is_empty());
}

#[test]
fn run_returns_after_quit_from_another_thread() {
    let terminal = HarnessTerminal::new(80, 12);
    let mut viewer = viewer(
        &terminal,
        ScriptedRunner::repeating(ok("hi\n")),
        options(Duration::from_millis(50)),
    );

    let remote = terminal.clone();
    let quitter = thread::spawn(move || {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !remote.is_started() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        thread::sleep(Duration::from_millis(120));
        remote.emit_input("q");
    });

    let code = viewer.run().expect("run");
    quitter.join().expect("quitter thread");
    assert_eq!(code, 0);
    assert!(viewer.runs_started() >= 1);
    assert!(terminal.take_writes().ends_with(RESTORE));
}

#[test]
fn resize_reclamps_and_repaints() {
    let terminal = HarnessTerminal::new(80, 12);
    let mut viewer = viewer(
        &terminal,
        ScriptedRunner::repeating(ok(&numbered(25))),
        options(Duration::from_secs(60)),
    );
    viewer.start().expect("start");
    wait_for_capture(&mut viewer);

    terminal.emit_input("G");
    viewer.run_blocking_once().expect("bottom");
    assert_eq!(viewer.scroll().view().offset, 15);
    let redraws = viewer.full_redraws();
    terminal.take_writes();

    terminal.set_size(80, 22);
    terminal.emit_resize();
    viewer.run_blocking_once().expect("resize");
    assert_eq!(viewer.scroll().viewport_height(), 20);
    assert_eq!(viewer.scroll().view().offset, 5);
    assert_eq!(viewer.full_redraws(), redraws + 1);
    assert!(terminal.take_writes().contains("\x1b[H\x1b[2J"));
}

#[test]
fn scroll_keys_move_the_view() {
    let terminal = HarnessTerminal::new(80, 12);
    let mut viewer = viewer(
        &terminal,
        ScriptedRunner::repeating(ok(&numbered(25))),
        options(Duration::from_secs(60)),
    );
    viewer.start().expect("start");
    wait_for_capture(&mut viewer);

    let mut press = |key: &str| {
        terminal.emit_input(key);
        viewer.run_blocking_once().expect("key");
        viewer.scroll().view().offset
    };
    assert_eq!(press("k"), 0);
    assert_eq!(press("j"), 1);
    assert_eq!(press(" "), 10);
    assert_eq!(press("j"), 11);
    assert_eq!(press("b"), 2);
    assert_eq!(press("G"), 15);
    assert_eq!(press("\x1b[B"), 15);
    assert_eq!(press("g"), 0);
}

#[test]
fn shorter_capture_reclamps_the_offset() {
    let terminal = HarnessTerminal::new(80, 12);
    let runner = ScriptedRunner::scripted(vec![ok(&numbered(25))], ok(&numbered(3)));
    let mut viewer = viewer(&terminal, runner, options(Duration::from_secs(60)));
    viewer.start().expect("start");
    wait_for_capture(&mut viewer);

    terminal.emit_input("G");
    viewer.run_blocking_once().expect("bottom");
    assert_eq!(viewer.scroll().view().offset, 15);

    terminal.emit_input("r");
    viewer.run_blocking_once().expect("manual refresh");
    assert_eq!(viewer.runs_started(), 2);
    wait_for_capture(&mut viewer);

    assert_eq!(viewer.scroll().total_lines(), 3);
    assert_eq!(viewer.scroll().view().offset, 0);
    assert_eq!(
        viewer.scroll().visible_slice(10),
        ["line 1", "line 2", "line 3"]
    );
}

#[test]
fn follow_resets_to_top_on_every_capture() {
    let terminal = HarnessTerminal::new(80, 12);
    let runner = ScriptedRunner::repeating(ok(&numbered(25)));
    let mut viewer = viewer(
        &terminal,
        runner,
        ViewerOptions {
            follow: true,
            ..options(Duration::from_secs(60))
        },
    );
    viewer.start().expect("start");
    wait_for_capture(&mut viewer);

    terminal.emit_input("G");
    viewer.run_blocking_once().expect("bottom");
    assert_eq!(viewer.scroll().view().offset, 15);

    terminal.emit_input("r");
    viewer.run_blocking_once().expect("manual refresh");
    wait_for_capture(&mut viewer);
    assert_eq!(viewer.scroll().view().offset, 0);
    assert!(terminal.take_writes().contains("FOLLOW"));
}

#[test]
fn ticks_due_while_a_run_is_in_flight_are_skipped() {
    let terminal = HarnessTerminal::new(80, 12);
    let (release, gate) = mpsc::channel();
    let runner =
        ScriptedRunner::scripted(vec![Step::Blocked("slow\n".to_string())], ok("fast\n"))
            .with_gate(gate);
    let calls = runner.calls();
    let mut viewer = viewer(&terminal, runner, options(Duration::from_millis(20)));
    viewer.start().expect("start");

    viewer.run_blocking_once().expect("first tick");
    assert!(viewer.in_flight());

    // Several deadlines pass while the first run is blocked.
    for _ in 0..5 {
        viewer.run_blocking_once().expect("tick while in flight");
    }
    assert_eq!(viewer.runs_started(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(viewer.state(), LoopState::Refreshing);

    // Input is still serviced while the command runs.
    terminal.emit_input("f");
    viewer.run_blocking_once().expect("input while in flight");
    assert!(viewer.scroll().follow_latest());

    // `r` does not start a second run either.
    terminal.emit_input("r");
    viewer.run_blocking_once().expect("refresh while in flight");
    assert_eq!(viewer.runs_started(), 1);

    release.send(()).expect("release run");
    drive_until(&mut viewer, 20, |viewer| viewer.scroll().displayed().is_some());
    assert_eq!(
        viewer.scroll().displayed().map(|capture| capture.lines().to_vec()),
        Some(vec!["slow".to_string()])
    );
}

#[test]
fn pause_stops_ticks_until_resumed() {
    let terminal = HarnessTerminal::new(80, 12);
    let mut viewer = viewer(
        &terminal,
        ScriptedRunner::repeating(ok("tick\n")),
        options(Duration::from_millis(20)),
    );
    viewer.start().expect("start");
    wait_for_capture(&mut viewer);

    terminal.emit_input("p");
    viewer.run_blocking_once().expect("pause");
    assert!(viewer.is_paused());
    drive_until(&mut viewer, 20, |viewer| !viewer.in_flight());
    let runs = viewer.runs_started();

    thread::sleep(Duration::from_millis(120));
    terminal.emit_input("x");
    viewer.run_blocking_once().expect("unbound key");
    assert_eq!(viewer.runs_started(), runs);
    assert!(terminal.take_writes().contains("PAUSED"));

    terminal.emit_input("p");
    viewer.run_blocking_once().expect("resume");
    assert!(!viewer.is_paused());
    assert_eq!(viewer.runs_started(), runs + 1);
}

#[test]
fn errexit_freezes_and_exits_with_the_command_code() {
    let terminal = HarnessTerminal::new(80, 12);
    let runner = ScriptedRunner::repeating(Step::Output(
        "boom\n".to_string(),
        ExitState::Code(4),
    ));
    let calls = runner.calls();
    let mut viewer = viewer(
        &terminal,
        runner,
        ViewerOptions {
            errexit: true,
            ..options(Duration::from_millis(20))
        },
    );
    viewer.start().expect("start");
    wait_for_capture(&mut viewer);

    assert!(viewer.is_frozen());
    assert!(terminal
        .take_writes()
        .contains("command failed (exit 4) - press any key to exit"));

    // Frozen: the schedule is parked until the key press.
    assert!(viewer.is_paused());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    terminal.emit_input("j");
    viewer.run_blocking_once().expect("any key");
    assert!(viewer.should_exit());
    assert_eq!(viewer.exit_code(), Some(4));
    viewer.stop().expect("stop");
}

#[test]
fn history_keys_pin_an_older_capture() {
    let terminal = HarnessTerminal::new(80, 12);
    let runner = ScriptedRunner::scripted(vec![ok("first\n")], ok("second\n"));
    let mut viewer = viewer(
        &terminal,
        runner,
        ViewerOptions {
            history: 2,
            ..options(Duration::from_secs(60))
        },
    );
    viewer.start().expect("start");
    wait_for_capture(&mut viewer);

    terminal.emit_input("r");
    viewer.run_blocking_once().expect("manual refresh");
    wait_for_capture(&mut viewer);
    assert_eq!(viewer.scroll().visible_slice(10), ["second"]);

    terminal.emit_input("[");
    viewer.run_blocking_once().expect("older");
    assert_eq!(viewer.scroll().visible_slice(10), ["first"]);
    assert!(terminal.take_writes().contains("HISTORY -1"));

    terminal.emit_input("]");
    viewer.run_blocking_once().expect("newer");
    assert_eq!(viewer.scroll().visible_slice(10), ["second"]);
}

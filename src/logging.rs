//! Debug logging sinks selected through the environment.
//!
//! Nothing is written unless `LEER_DEBUG_LOG` names a file. Failures to open or write the
//! log disable it silently; the viewer never fails because of logging.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use time::format_description::well_known::Rfc3339;

use crate::config::EnvConfig;
use crate::core::capture;

#[derive(Default)]
struct LogState {
    file: Option<File>,
    redraw: bool,
}

static LOG_STATE: Lazy<Mutex<LogState>> = Lazy::new(|| Mutex::new(LogState::default()));

fn with_state<R>(f: impl FnOnce(&mut LogState) -> R) -> R {
    let mut state = match LOG_STATE.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    f(&mut state)
}

/// Opens the sinks named by `env`. Safe to call more than once; the last call wins.
pub fn init(env: &EnvConfig) {
    let file = env.debug_log.as_deref().and_then(open_append);
    with_state(|state| {
        state.file = file;
        state.redraw = env.debug_redraw;
    });
}

pub fn debug_log_enabled() -> bool {
    with_state(|state| state.file.is_some())
}

pub fn debug_redraw_enabled() -> bool {
    with_state(|state| state.redraw && state.file.is_some())
}

/// Appends `<rfc3339> [tag] message` to the debug log.
pub fn log_event(tag: &str, message: impl AsRef<str>) {
    with_state(|state| {
        let Some(file) = state.file.as_mut() else {
            return;
        };
        let stamp = capture::now()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "-".to_string());
        if writeln!(file, "{stamp} [{tag}] {}", message.as_ref()).is_err() {
            state.file = None;
        }
    });
}

/// Logs the reason for a full repaint when `LEER_DEBUG_REDRAW=1`.
pub fn log_redraw(reason: &str) {
    if debug_redraw_enabled() {
        log_event("redraw", reason);
    }
}

pub(crate) fn open_append(path: &Path) -> Option<File> {
    OpenOptions::new().create(true).append(true).open(path).ok()
}

#[cfg(test)]
pub(crate) fn reset_for_tests() {
    with_state(|state| *state = LogState::default());
}

#[cfg(test)]
pub(crate) fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: Mutex<()> = Mutex::new(());
    LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::{debug_log_enabled, debug_redraw_enabled, init, log_event, log_redraw};
    use crate::config::EnvConfig;

    #[test]
    fn disabled_without_path() {
        let _lock = super::test_lock();
        init(&EnvConfig::default());
        assert!(!debug_log_enabled());
        log_event("tick", "dropped");
        super::reset_for_tests();
    }

    #[test]
    fn events_are_appended_with_timestamp_and_tag() {
        let _lock = super::test_lock();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("debug.log");
        init(&EnvConfig {
            debug_log: Some(path.clone()),
            debug_redraw: true,
            ..EnvConfig::default()
        });
        assert!(debug_log_enabled());
        assert!(debug_redraw_enabled());

        log_event("tick", "scheduled run 1");
        log_redraw("size changed");
        super::reset_for_tests();

        let contents = std::fs::read_to_string(&path).expect("read log");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[tick] scheduled run 1"));
        assert!(lines[1].ends_with("[redraw] size changed"));
        assert!(lines[0].contains('T'));
    }
}

//! Command-line and environment configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);
pub const MIN_INTERVAL: Duration = Duration::from_millis(100);
/// Upper bound for `--interval` and `--timeout`: one week.
pub const MAX_SECONDS: f64 = 7.0 * 24.0 * 60.0 * 60.0;

pub const USAGE: &str = "\
Usage: leer [options] <command> [args...]

Execute a program periodically, showing its output fullscreen.

Options:
  -n, --interval SECS  seconds between runs (default 2, fractions allowed)
  -e, --errexit        freeze on command failure and exit after a key press
  -f, --follow         scroll back to the top on every refresh
  -t, --no-title       hide the header line
  -x, --exec           run the command directly instead of through 'sh -c'
      --no-stderr      discard the command's standard error
      --timeout SECS   kill the command when it runs longer than SECS
      --history N      keep N previous outputs, browse them with [ and ]
  -h, --help           show this help
  -V, --version        show the version

Keys: j/k arrows scroll, space/b page, g/G top/bottom, h/l sideways,
      r refresh now, p pause, f follow, [ ] history, q quit";

/// Settings for one viewer session.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub command: Vec<String>,
    pub interval: Duration,
    pub errexit: bool,
    pub follow: bool,
    pub show_header: bool,
    pub exec: bool,
    pub merge_stderr: bool,
    pub timeout: Option<Duration>,
    pub history: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            interval: DEFAULT_INTERVAL,
            errexit: false,
            follow: false,
            show_header: true,
            exec: false,
            merge_stderr: true,
            timeout: None,
            history: 0,
        }
    }
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum CliAction {
    Run(Config),
    Help,
    Version,
}

impl Config {
    /// Parses arguments (without the program name). Options end at the first non-option
    /// argument or at `--`; everything after belongs to the command.
    pub fn parse<I, S>(args: I) -> Result<CliAction, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        let mut config = Config::default();

        while let Some(arg) = args.next() {
            if arg == "--" {
                break;
            }

            if let Some(long) = arg.strip_prefix("--") {
                let (name, inline) = match long.split_once('=') {
                    Some((name, value)) => (name, Some(value.to_string())),
                    None => (long, None),
                };
                let option = format!("--{name}");
                match name {
                    "interval" => {
                        let value = take_value(&option, inline, &mut args)?;
                        config.interval = parse_interval(&option, &value)?;
                    }
                    "timeout" => {
                        let value = take_value(&option, inline, &mut args)?;
                        config.timeout = Some(parse_seconds(&option, &value)?);
                    }
                    "history" => {
                        let value = take_value(&option, inline, &mut args)?;
                        config.history = parse_count(&option, &value)?;
                    }
                    _ if inline.is_some() => return Err(ConfigError::UnknownOption(arg)),
                    "errexit" => config.errexit = true,
                    "follow" => config.follow = true,
                    "no-title" => config.show_header = false,
                    "exec" => config.exec = true,
                    "no-stderr" => config.merge_stderr = false,
                    "help" => return Ok(CliAction::Help),
                    "version" => return Ok(CliAction::Version),
                    _ => return Err(ConfigError::UnknownOption(arg)),
                }
                continue;
            }

            if arg.len() > 1 && arg.starts_with('-') {
                let cluster: Vec<char> = arg[1..].chars().collect();
                let mut idx = 0;
                while idx < cluster.len() {
                    match cluster[idx] {
                        'e' => config.errexit = true,
                        'f' => config.follow = true,
                        't' => config.show_header = false,
                        'x' => config.exec = true,
                        'h' => return Ok(CliAction::Help),
                        'V' => return Ok(CliAction::Version),
                        'n' => {
                            let rest: String = cluster[idx + 1..].iter().collect();
                            let inline = if rest.is_empty() { None } else { Some(rest) };
                            let value = take_value("-n", inline, &mut args)?;
                            config.interval = parse_interval("-n", &value)?;
                            break;
                        }
                        other => return Err(ConfigError::UnknownOption(format!("-{other}"))),
                    }
                    idx += 1;
                }
                continue;
            }

            config.command.push(arg);
            break;
        }

        config.command.extend(args);
        if config.command.is_empty() {
            return Err(ConfigError::MissingCommand);
        }
        Ok(CliAction::Run(config))
    }

    /// The command as shown in the header.
    pub fn command_label(&self) -> String {
        self.command.join(" ")
    }
}

fn take_value<I>(option: &str, inline: Option<String>, args: &mut I) -> Result<String, ConfigError>
where
    I: Iterator<Item = String>,
{
    inline
        .or_else(|| args.next())
        .ok_or_else(|| ConfigError::MissingValue {
            option: option.to_string(),
        })
}

fn parse_seconds(option: &str, value: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason| ConfigError::InvalidValue {
        option: option.to_string(),
        value: value.to_string(),
        reason,
    };
    let seconds: f64 = value
        .trim()
        .parse()
        .map_err(|_| invalid("not a number"))?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(invalid("must be a positive number of seconds"));
    }
    if seconds > MAX_SECONDS {
        return Err(invalid("must be at most one week"));
    }
    Duration::try_from_secs_f64(seconds).map_err(|_| invalid("out of range"))
}

fn parse_interval(option: &str, value: &str) -> Result<Duration, ConfigError> {
    parse_seconds(option, value).map(|interval| interval.max(MIN_INTERVAL))
}

fn parse_count(option: &str, value: &str) -> Result<usize, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            option: option.to_string(),
            value: value.to_string(),
            reason: "not a non-negative integer",
        })
}

/// Debug switches read from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    /// Append every terminal write to this file.
    pub write_log: Option<PathBuf>,
    /// Structured debug log of loop events.
    pub debug_log: Option<PathBuf>,
    /// Log the reason for every full repaint.
    pub debug_redraw: bool,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            write_log: env_string_opt("LEER_WRITE_LOG").map(PathBuf::from),
            debug_log: env_string_opt("LEER_DEBUG_LOG").map(PathBuf::from),
            debug_redraw: env_flag("LEER_DEBUG_REDRAW"),
        }
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    use super::{CliAction, Config, EnvConfig, DEFAULT_INTERVAL};
    use crate::error::ConfigError;

    fn run_config(args: &[&str]) -> Config {
        match Config::parse(args.iter().copied()) {
            Ok(CliAction::Run(config)) => config,
            other => panic!("expected a run config, got {other:?}"),
        }
    }

    #[test]
    fn defaults_apply_without_options() {
        let config = run_config(&["date"]);
        assert_eq!(config.command, vec!["date"]);
        assert_eq!(config.interval, DEFAULT_INTERVAL);
        assert!(!config.errexit);
        assert!(!config.follow);
        assert!(config.show_header);
        assert!(config.merge_stderr);
        assert_eq!(config.history, 0);
    }

    #[test]
    fn options_stop_at_first_command_word() {
        let config = run_config(&["-n", "0.5", "-e", "ls", "-la", "--follow"]);
        assert_eq!(config.interval, Duration::from_millis(500));
        assert!(config.errexit);
        assert!(!config.follow);
        assert_eq!(config.command, vec!["ls", "-la", "--follow"]);
        assert_eq!(config.command_label(), "ls -la --follow");
    }

    #[test]
    fn short_clusters_and_inline_values() {
        let config = run_config(&["-eftn3", "uptime"]);
        assert!(config.errexit && config.follow && !config.show_header);
        assert_eq!(config.interval, Duration::from_secs(3));

        let config = run_config(&["--interval=1.5", "--timeout", "4", "--history=3", "df"]);
        assert_eq!(config.interval, Duration::from_millis(1500));
        assert_eq!(config.timeout, Some(Duration::from_secs(4)));
        assert_eq!(config.history, 3);
    }

    #[test]
    fn double_dash_ends_options() {
        let config = run_config(&["-x", "--", "-weird-program", "arg"]);
        assert!(config.exec);
        assert_eq!(config.command, vec!["-weird-program", "arg"]);
    }

    #[test]
    fn tiny_interval_is_raised_to_minimum() {
        let config = run_config(&["-n", "0.001", "true"]);
        assert_eq!(config.interval, super::MIN_INTERVAL);
    }

    #[test]
    fn huge_durations_are_rejected() {
        assert!(matches!(
            Config::parse(["-n", "1e19", "true"]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            Config::parse(["--timeout=1e19", "true"]),
            Err(ConfigError::InvalidValue { .. })
        ));
        let config = run_config(&["-n", "604800", "--timeout", "604800", "true"]);
        assert_eq!(config.interval, Duration::from_secs(604_800));
        assert_eq!(config.timeout, Some(Duration::from_secs(604_800)));
    }

    #[test]
    fn invalid_configurations_are_rejected() {
        assert_eq!(
            Config::parse(Vec::<String>::new()),
            Err(ConfigError::MissingCommand)
        );
        assert_eq!(
            Config::parse(["-n"]),
            Err(ConfigError::MissingValue {
                option: "-n".to_string()
            })
        );
        assert!(matches!(
            Config::parse(["-n", "0", "date"]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            Config::parse(["--interval", "-2", "date"]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            Config::parse(["-n", "soon", "date"]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(
            Config::parse(["--bogus", "date"]),
            Err(ConfigError::UnknownOption("--bogus".to_string()))
        );
        assert_eq!(
            Config::parse(["-q", "date"]),
            Err(ConfigError::UnknownOption("-q".to_string()))
        );
    }

    #[test]
    fn help_and_version_short_circuit() {
        assert_eq!(Config::parse(["-h"]), Ok(CliAction::Help));
        assert_eq!(Config::parse(["--version", "date"]), Ok(CliAction::Version));
    }

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned")
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    #[test]
    fn env_defaults_are_off() {
        let _lock = env_lock();
        let _g1 = set_env_guard("LEER_WRITE_LOG", None);
        let _g2 = set_env_guard("LEER_DEBUG_LOG", None);
        let _g3 = set_env_guard("LEER_DEBUG_REDRAW", None);

        assert_eq!(EnvConfig::from_env(), EnvConfig::default());
    }

    #[test]
    fn env_values_are_read() {
        let _lock = env_lock();
        let _g1 = set_env_guard("LEER_WRITE_LOG", Some("/tmp/leer-writes.log"));
        let _g2 = set_env_guard("LEER_DEBUG_LOG", Some("   "));
        let _g3 = set_env_guard("LEER_DEBUG_REDRAW", Some("1"));

        let config = EnvConfig::from_env();
        assert_eq!(
            config.write_log,
            Some(PathBuf::from("/tmp/leer-writes.log"))
        );
        assert!(config.debug_log.is_none());
        assert!(config.debug_redraw);
    }
}

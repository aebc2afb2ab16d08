use std::io;
use std::process::ExitCode;

use leer::config::USAGE;
use leer::{
    logging, CliAction, Config, EnvConfig, LeerError, ProcessRunner, ProcessTerminal,
    ViewerOptions, ViewerRuntime,
};

fn main() -> ExitCode {
    let config = match Config::parse(std::env::args().skip(1)) {
        Ok(CliAction::Run(config)) => config,
        Ok(CliAction::Help) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Ok(CliAction::Version) => {
            println!("leer {}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
        Err(err) => return fail(&LeerError::from(err), true),
    };

    let env = EnvConfig::from_env();
    logging::init(&env);

    match run(&config, &env) {
        Ok(code) => ExitCode::from(code.clamp(0, 255) as u8),
        Err(err) => fail(&err, false),
    }
}

fn run(config: &Config, env: &EnvConfig) -> Result<i32, LeerError> {
    let runner = ProcessRunner::from_config(config)?;

    let terminal = ProcessTerminal::new().with_write_log(env.write_log.clone());
    if !terminal.is_tty() {
        return Err(LeerError::terminal("checking the terminal")(io::Error::new(
            io::ErrorKind::Unsupported,
            "stdin and stdout must be a terminal",
        )));
    }

    let mut viewer = ViewerRuntime::new(terminal, runner, ViewerOptions::from_config(config))
        .with_cleanup_hooks(true);
    viewer.run()
}

/// The terminal is already restored when this runs.
fn fail(err: &LeerError, usage_hint: bool) -> ExitCode {
    eprintln!("leer: {err}");
    if usage_hint {
        eprintln!("Try 'leer --help' for more information.");
    }
    ExitCode::from(err.exit_code() as u8)
}

use std::io;

use thiserror::Error;

/// Why a command run produced no capture at all.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("cannot run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("empty command")]
    EmptyCommand,
}

/// Startup configuration problems. Reported before the terminal is touched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no command given")]
    MissingCommand,

    #[error("option '{option}' requires a value")]
    MissingValue { option: String },

    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("invalid value '{value}' for '{option}': {reason}")]
    InvalidValue {
        option: String,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum LeerError {
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    #[error(transparent)]
    Command(#[from] ExecutionError),

    #[error("terminal error while {operation}: {source}")]
    Terminal {
        operation: &'static str,
        #[source]
        source: io::Error,
    },
}

impl LeerError {
    pub fn terminal(operation: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| LeerError::Terminal { operation, source }
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            LeerError::InvalidConfig(_) => 2,
            LeerError::Command(_) | LeerError::Terminal { .. } => 1,
        }
    }
}

use std::{io, string::FromUtf8Error};

use thiserror::Error;

use crate::cmd::execute::Captured;

pub type Result<T, E = ShellfishError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ShellfishError {
    #[error("command not found: {name}")]
    CommandNotFound { name: String },
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to open stream `{target}`: {source}")]
    StreamResolution {
        target: String,
        #[source]
        source: io::Error,
    },
    #[error("`{statement}` exited with status {code}")]
    ProcessExit {
        code: i32,
        statement: String,
        stdout: Option<Captured>,
    },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("captured output is not valid utf-8: {0}")]
    Decode(#[from] FromUtf8Error),
}

impl ShellfishError {
    /// The exit code carried by a [`ShellfishError::ProcessExit`].
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ProcessExit { code, .. } => Some(*code),
            _ => None,
        }
    }
}

use std::fmt;

use crate::{prelude::*, process::StageOutput};

/// Output captured from a stream, framed as bytes or text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Captured {
    Bytes(Vec<u8>),
    Text(String),
}

impl Captured {
    /// Frame raw bytes. Text framing requires UTF-8 and folds `\r\n` and lone
    /// `\r` into `\n`.
    pub fn decode(raw: Vec<u8>, text: bool) -> Result<Self> {
        if !text {
            return Ok(Self::Bytes(raw));
        }

        let text = String::from_utf8(raw)?;
        if !text.contains('\r') {
            return Ok(Self::Text(text));
        }
        Ok(Self::Text(text.replace("\r\n", "\n").replace('\r', "\n")))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Bytes(bytes) => bytes,
            Self::Text(text) => text.as_bytes(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Bytes(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl fmt::Display for Captured {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Bytes(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
        }
    }
}

/// Exit code and captured stderr of a stage left of the terminal one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResult {
    pub return_code: i32,
    pub stderr: Option<Captured>,
}

/// Everything one run of a statement produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Return code of the right-most stage.
    pub return_code: i32,
    /// `None` unless stdout was piped.
    pub stdout: Option<Captured>,
    /// `None` unless stderr was piped.
    pub stderr: Option<Captured>,
    /// Every earlier pipeline stage, left to right. Empty for a plain command.
    pub upstream: Vec<StageResult>,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.return_code == 0
    }

    /// Return codes of all stages, left to right.
    pub fn pipe_status(&self) -> Vec<i32> {
        self.upstream
            .iter()
            .map(|stage| stage.return_code)
            .chain(std::iter::once(self.return_code))
            .collect()
    }
}

/// Run `statement` to completion.
///
/// A literal on the statement's input is fed while output and error are being
/// drained; the call returns once every stage of the statement has exited.
pub async fn execute<S: Statement>(statement: &mut S) -> Result<ExecutionResult> {
    let input = statement.stdin().as_literal().cloned();
    let text = statement.text_mode();

    let process = statement.run()?;
    let output = process.communicate(input).await?;

    let frame = |raw: Option<Vec<u8>>| raw.map(|raw| Captured::decode(raw, text)).transpose();

    let upstream = output
        .upstream
        .into_iter()
        .map(|StageOutput { return_code, stderr }| {
            Ok(StageResult {
                return_code,
                stderr: frame(stderr)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ExecutionResult {
        return_code: output.return_code,
        stdout: frame(output.stdout)?,
        stderr: frame(output.stderr)?,
        upstream,
    })
}

/// Run `statement` and return only its return code.
pub async fn call<S: Statement>(statement: &mut S) -> Result<i32> {
    execute(statement).await.map(|res| res.return_code)
}

/// Run `statement`; a non-zero return code becomes [`ShellfishError::ProcessExit`].
pub async fn check_call<S: Statement + fmt::Display>(statement: &mut S) -> Result<i32> {
    let res = execute(statement).await?;
    if !res.success() {
        return Err(exit_error(statement, res.return_code, None));
    }
    Ok(res.return_code)
}

/// Run `statement` and return its captured stdout.
///
/// A non-zero return code becomes [`ShellfishError::ProcessExit`] carrying
/// whatever stdout was captured.
pub async fn check_output<S: Statement + fmt::Display>(
    statement: &mut S,
) -> Result<Option<Captured>> {
    let res = execute(statement).await?;
    if !res.success() {
        return Err(exit_error(statement, res.return_code, res.stdout));
    }
    Ok(res.stdout)
}

fn exit_error(statement: &impl fmt::Display, code: i32, stdout: Option<Captured>) -> ShellfishError {
    ShellfishError::ProcessExit {
        code,
        statement: statement.to_string(),
        stdout,
    }
}

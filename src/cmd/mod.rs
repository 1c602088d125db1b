//! Runnable statements and how they compose.

use std::fmt;

use enum_dispatch::enum_dispatch;

use crate::{error::Result, process::Process, stream::Endpoint};

pub use self::{command::Command, pipe::PipeStatement};

pub mod command;
pub mod execute;
pub mod lookup;
pub mod pipe;

/// Anything that can be spawned with its three standard streams wired up.
#[enum_dispatch(Stmt)]
pub trait Statement {
    fn stdin(&self) -> &Endpoint;
    fn stdout(&self) -> &Endpoint;
    fn stderr(&self) -> &Endpoint;

    fn set_stdin(&mut self, endpoint: Endpoint);
    fn set_stdout(&mut self, endpoint: Endpoint);
    fn set_stderr(&mut self, endpoint: Endpoint);

    /// Whether captured output is decoded as text instead of kept as bytes.
    fn text_mode(&self) -> bool;
    fn set_text_mode(&mut self, text: bool);

    /// Resolve endpoints and spawn. Must be called from within a tokio runtime.
    fn run(&mut self) -> Result<Process>;
}

/// Every kind of statement, so trees can be built without trait objects.
#[enum_dispatch]
#[derive(Debug)]
pub enum Stmt {
    Command(Command),
    Pipe(PipeStatement),
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(cmd) => cmd.fmt(f),
            Self::Pipe(pipe) => pipe.fmt(f),
        }
    }
}

/// Builder-style redirection and piping, available on every statement.
///
/// ```no_run
/// use shellfish::prelude::*;
///
/// # async fn demo() -> shellfish::Result<()> {
/// let mut stmt = Command::new("sort")
///     .with_input(Endpoint::literal("b\na\n"))
///     .pipe(Command::new("uniq").arg("-c"))
///     .with_output(Endpoint::append("counts.txt"));
/// let res = execute(&mut stmt).await?;
/// assert_eq!(res.return_code, 0);
/// # Ok(())
/// # }
/// ```
pub trait Compose: Statement + Sized {
    fn with_input(mut self, endpoint: impl Into<Endpoint>) -> Self {
        self.set_stdin(endpoint.into());
        self
    }

    fn with_output(mut self, endpoint: impl Into<Endpoint>) -> Self {
        self.set_stdout(endpoint.into());
        self
    }

    fn with_error(mut self, endpoint: impl Into<Endpoint>) -> Self {
        self.set_stderr(endpoint.into());
        self
    }

    fn with_text(mut self, text: bool) -> Self {
        self.set_text_mode(text);
        self
    }

    fn pipe(self, right: impl Into<Stmt>) -> PipeStatement
    where
        Self: Into<Stmt>,
    {
        PipeStatement::new(self, right)
    }
}

impl<T: Statement> Compose for T {}

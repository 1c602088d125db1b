use std::{fmt, process::Stdio};

use crate::{
    prelude::*,
    process::{Process, Stage},
};

/// `left | right`.
///
/// The pipe owns no endpoints of its own: input belongs to `left`, output to
/// `right`. Reading the error endpoint reports `right`'s, setting it applies
/// to both sides.
#[derive(Debug)]
pub struct PipeStatement {
    left: Box<Stmt>,
    right: Box<Stmt>,
}

impl PipeStatement {
    /// A literal already fed to `left` decides the framing of the whole pipe.
    pub fn new(left: impl Into<Stmt>, right: impl Into<Stmt>) -> Self {
        let left = left.into();
        let mut right = right.into();
        if let Some(literal) = left.stdin().as_literal() {
            right.set_text_mode(literal.is_text());
        }

        Self {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn left(&self) -> &Stmt {
        &self.left
    }

    pub fn right(&self) -> &Stmt {
        &self.right
    }

    pub fn into_parts(self) -> (Stmt, Stmt) {
        (*self.left, *self.right)
    }
}

impl Statement for PipeStatement {
    fn stdin(&self) -> &Endpoint {
        self.left.stdin()
    }

    fn stdout(&self) -> &Endpoint {
        self.right.stdout()
    }

    fn stderr(&self) -> &Endpoint {
        self.right.stderr()
    }

    fn set_stdin(&mut self, endpoint: Endpoint) {
        if let Some(literal) = endpoint.as_literal() {
            self.set_text_mode(literal.is_text());
        }
        self.left.set_stdin(endpoint);
    }

    fn set_stdout(&mut self, endpoint: Endpoint) {
        self.right.set_stdout(endpoint);
    }

    fn set_stderr(&mut self, endpoint: Endpoint) {
        match endpoint.share() {
            Some(shared) => {
                self.left.set_stderr(endpoint);
                self.right.set_stderr(shared);
            }
            None => self.right.set_stderr(endpoint),
        }
    }

    fn text_mode(&self) -> bool {
        self.right.text_mode()
    }

    fn set_text_mode(&mut self, text: bool) {
        self.left.set_text_mode(text);
        self.right.set_text_mode(text);
    }

    fn run(&mut self) -> Result<Process> {
        self.left.set_stdout(Endpoint::Pipe);

        trace!(left = %self.left, "spawning left side of pipe");
        let mut left = self.left.run()?;

        let junction: Stdio = match left.stdout.take() {
            Some(stdout) => stdout.try_into()?,
            None => {
                left.abandon();
                return Err(ShellfishError::Io(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "left side of pipe has no stdout",
                )));
            }
        };
        self.right.set_stdin(Endpoint::Stream(junction));

        trace!(right = %self.right, "spawning right side of pipe");
        let right = match self.right.run() {
            Ok(right) => right,
            Err(err) => {
                warn!("right side of pipe failed to start, killing left: {err}");
                left.abandon();
                return Err(err);
            }
        };

        let Process {
            stdin,
            child: left_child,
            stderr: left_stderr,
            upstream: mut stages,
            ..
        } = left;
        stages.push(Stage {
            child: left_child,
            stderr: left_stderr,
        });
        stages.extend(right.upstream);

        Ok(Process {
            stdin,
            stdout: right.stdout,
            stderr: right.stderr,
            child: right.child,
            upstream: stages,
        })
    }
}

impl fmt::Display for PipeStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.left, self.right)
    }
}

use std::{
    ffi::{OsStr, OsString},
    fmt,
};

use itertools::Itertools;
use tokio::process::Command as ProcessCommand;

use crate::{prelude::*, process::Process, stream::Role};

/// A single external program with its arguments and stream wiring.
///
/// Output and error are piped by default so the execution driver can
/// capture them; input is inherited.
#[derive(Debug)]
pub struct Command {
    program: OsString,
    args: Vec<OsString>,
    options: Vec<(String, OsString)>,
    stdin: Endpoint,
    stdout: Endpoint,
    stderr: Endpoint,
    text: bool,
    last_pid: Option<u32>,
}

impl Command {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            args: Vec::new(),
            options: Vec::new(),
            stdin: Endpoint::Inherit,
            stdout: Endpoint::Pipe,
            stderr: Endpoint::Pipe,
            text: false,
            last_pid: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|arg| arg.as_ref().to_owned()));
        self
    }

    /// Add a named option. One-character keys become `-k value`, longer keys
    /// `--key value`. Options keep the order they were added in.
    pub fn option(mut self, key: impl Into<String>, value: impl AsRef<OsStr>) -> Self {
        self.options.push((key.into(), value.as_ref().to_owned()));
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// Pid of the process started by the most recent [`Statement::run`].
    ///
    /// The live handle itself is the [`Process`] that `run` returned to the
    /// caller; wait on or signal that to learn how the process ended. The
    /// command only remembers which process it started.
    pub fn last_pid(&self) -> Option<u32> {
        self.last_pid
    }

    /// The full argument vector, program first.
    pub fn argv(&self) -> Vec<OsString> {
        let mut argv = Vec::with_capacity(1 + self.args.len() + 2 * self.options.len());
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        for (key, value) in &self.options {
            let flag = if key.chars().count() > 1 {
                format!("--{key}")
            } else {
                format!("-{key}")
            };
            argv.push(flag.into());
            argv.push(value.clone());
        }
        argv
    }
}

impl Statement for Command {
    fn stdin(&self) -> &Endpoint {
        &self.stdin
    }

    fn stdout(&self) -> &Endpoint {
        &self.stdout
    }

    fn stderr(&self) -> &Endpoint {
        &self.stderr
    }

    fn set_stdin(&mut self, endpoint: Endpoint) {
        if let Some(literal) = endpoint.as_literal() {
            self.text = literal.is_text();
        }
        self.stdin = endpoint;
    }

    fn set_stdout(&mut self, endpoint: Endpoint) {
        self.stdout = endpoint;
    }

    fn set_stderr(&mut self, endpoint: Endpoint) {
        self.stderr = endpoint;
    }

    fn text_mode(&self) -> bool {
        self.text
    }

    fn set_text_mode(&mut self, text: bool) {
        self.text = text;
    }

    fn run(&mut self) -> Result<Process> {
        let stdin = self.stdin.resolve(Role::Input)?;
        let stdout = self.stdout.resolve(Role::Output)?;
        let stderr = self.stderr.resolve(Role::Error)?;

        let mut cmd = ProcessCommand::new(&self.program);
        cmd.args(self.argv().iter().skip(1))
            .stdin(stdin)
            .stdout(stdout)
            .stderr(stderr);

        trace!(command = %self, "spawning command");

        let child = cmd.spawn().map_err(|source| ShellfishError::Spawn {
            program: self.program.to_string_lossy().into_owned(),
            source,
        })?;

        self.last_pid = child.id();

        Ok(child.into())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let argv = self.argv();
        let words = argv.iter().map(|word| word.to_string_lossy());
        let redirections = [
            self.stdin.redirection(Role::Input),
            self.stdout.redirection(Role::Output),
            self.stderr.redirection(Role::Error),
        ];

        write!(
            f,
            "{}",
            words
                .map(|word| word.into_owned())
                .chain(redirections.into_iter().flatten())
                .join(" ")
        )
    }
}

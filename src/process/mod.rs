//! Live handles to spawned statements.

use std::io;

use nix::sys::signal::Signal;
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout};

use crate::stream::Literal;

pub use self::child::{Stage, StageOutput};

pub mod child;
pub mod read;
pub mod status;
pub mod write;

/// A running statement.
///
/// For a single command `child` is that command's process and `upstream` is
/// empty. For a pipeline `child` is the right-most stage, `stdin` belongs to
/// the left-most stage, and every other stage sits in `upstream`, left to right.
#[derive(Debug)]
pub struct Process {
    pub stdin: Option<ChildStdin>,
    pub stdout: Option<ChildStdout>,
    pub stderr: Option<ChildStderr>,
    pub child: Child,
    pub upstream: Vec<Stage>,
}

/// Raw result of [`Process::communicate`].
#[derive(Debug)]
pub struct Output {
    pub return_code: i32,
    pub stdout: Option<Vec<u8>>,
    pub stderr: Option<Vec<u8>>,
    pub upstream: Vec<StageOutput>,
}

impl From<Child> for Process {
    fn from(mut child: Child) -> Self {
        Self {
            stdin: child.stdin.take(),
            stdout: child.stdout.take(),
            stderr: child.stderr.take(),
            child,
            upstream: Vec::new(),
        }
    }
}

impl Process {
    /// OS pid of the terminal stage, if it has not been reaped yet.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Feed `input`, drain every captured stream, and wait for all stages.
    ///
    /// The input is written from a separate task while stdout and stderr are
    /// read here, so neither side can stall the other on a full pipe buffer.
    pub async fn communicate(mut self, input: Option<Literal>) -> io::Result<Output> {
        let feeder = tokio::task::spawn(write::feed(self.stdin.take(), input));
        let upstream_pids = self
            .upstream
            .iter()
            .filter_map(|stage| stage.child.id())
            .collect::<Vec<_>>();
        let upstream = self
            .upstream
            .drain(..)
            .map(child::collect)
            .collect::<Vec<_>>();

        let (stdout, stderr) = tokio::join!(
            read::drain(self.stdout.take()),
            read::drain(self.stderr.take())
        );
        let (stdout, stderr) = match (stdout, stderr) {
            (Ok(stdout), Ok(stderr)) => (stdout, stderr),
            (Err(err), _) | (_, Err(err)) => {
                warn!("failed to read captured output, killing every stage: {err}");
                feeder.abort();
                // the collect tasks reap what this kills
                kill_all(&mut self.child, &upstream_pids);
                return Err(err);
            }
        };

        join(feeder).await??;

        let exit = self.child.wait().await?;
        let return_code = status::return_code(exit);
        debug!(return_code, "terminal stage exited");

        let mut stages = Vec::with_capacity(upstream.len());
        for handle in upstream {
            stages.push(join(handle).await??);
        }

        Ok(Output {
            return_code,
            stdout,
            stderr,
            upstream: stages,
        })
    }

    /// Wait for every stage without touching the pipes and return the
    /// terminal stage's code.
    pub async fn wait(&mut self) -> io::Result<i32> {
        drop(self.stdin.take());
        for stage in &mut self.upstream {
            stage.child.wait().await?;
        }
        self.child.wait().await.map(status::return_code)
    }

    /// Send `signal` to every stage that is still running.
    pub fn signal(&self, signal: Signal) -> io::Result<()> {
        for stage in &self.upstream {
            child::signal(&stage.child, signal)?;
        }
        child::signal(&self.child, signal)
    }

    /// Kill every stage and reap it.
    pub async fn kill(&mut self) -> io::Result<()> {
        for stage in &mut self.upstream {
            reaped_ok(stage.child.kill().await)?;
        }
        reaped_ok(self.child.kill().await)
    }

    /// Start killing every stage without waiting. Used when a pipeline fails
    /// to come up halfway through.
    pub(crate) fn abandon(mut self) {
        for stage in &mut self.upstream {
            if let Err(err) = stage.child.start_kill() {
                warn!("failed to kill upstream stage: {err}");
            }
        }
        if let Err(err) = self.child.start_kill() {
            warn!("failed to kill abandoned stage: {err}");
        }
    }
}

fn kill_all(terminal: &mut Child, upstream_pids: &[u32]) {
    for &pid in upstream_pids {
        if let Err(err) = child::signal_pid(pid, Signal::SIGKILL) {
            warn!(pid, "failed to kill upstream stage: {err}");
        }
    }
    if let Err(err) = terminal.start_kill() {
        warn!("failed to kill terminal stage: {err}");
    }
}

// killing a stage that was already reaped is not a failure
fn reaped_ok(res: io::Result<()>) -> io::Result<()> {
    match res {
        Err(err) if err.kind() == io::ErrorKind::InvalidInput => Ok(()),
        other => other,
    }
}

async fn join<T>(handle: tokio::task::JoinHandle<T>) -> io::Result<T> {
    handle
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "Child exited unexpectedly"))
}

#[cfg(all(test, unix))]
mod tests {
    use tokio::process::Command;

    use super::*;

    fn sleeper() -> Child {
        Command::new("sleep").arg("30").spawn().expect("spawn sleep")
    }

    #[tokio::test]
    async fn kill_all_takes_down_terminal_and_upstream() {
        let mut upstream = sleeper();
        let mut terminal = sleeper();
        let pid = upstream.id().expect("upstream pid");

        kill_all(&mut terminal, &[pid]);

        let upstream = upstream.wait().await.unwrap();
        let terminal = terminal.wait().await.unwrap();
        assert_eq!(status::return_code(upstream), 128 + 9);
        assert_eq!(status::return_code(terminal), 128 + 9);
    }
}

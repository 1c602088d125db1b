use std::io;

use nix::{
    errno::Errno,
    sys::signal::{kill, Signal},
    unistd::Pid,
};
use tokio::process::{Child, ChildStderr};

use super::{read, status};

/// A pipeline stage that is not the terminal one.
///
/// Its stdout already feeds the next stage; what is left to collect is its
/// error stream and its exit status.
#[derive(Debug)]
pub struct Stage {
    pub child: Child,
    pub stderr: Option<ChildStderr>,
}

/// What an upstream stage left behind once it exited.
#[derive(Debug)]
pub struct StageOutput {
    pub return_code: i32,
    pub stderr: Option<Vec<u8>>,
}

pub(crate) fn signal(child: &Child, signal: Signal) -> io::Result<()> {
    let Some(id) = child.id() else {
        // already reaped
        return Ok(());
    };

    signal_pid(id, signal)
}

pub(crate) fn signal_pid(pid: u32, signal: Signal) -> io::Result<()> {
    match kill(Pid::from_raw(pid as i32), signal) {
        // exited between the check and the kill
        Err(Errno::ESRCH) => Ok(()),
        res => res.map_err(io::Error::from),
    }
}

/// Drain an upstream stage's stderr on its own task, then reap it.
pub(crate) fn collect(stage: Stage) -> tokio::task::JoinHandle<io::Result<StageOutput>> {
    let Stage { mut child, stderr } = stage;
    let pid = child.id();
    tokio::task::spawn(async move {
        let stderr = read::drain(stderr).await?;
        let exit = child.wait().await?;
        let return_code = status::return_code(exit);
        debug!(?pid, return_code, "upstream stage exited");
        Ok(StageOutput {
            return_code,
            stderr,
        })
    })
}

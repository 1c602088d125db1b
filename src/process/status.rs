use std::process::ExitStatus;

/// Collapse an [`ExitStatus`] into a shell-style integer return code.
///
/// Signal deaths map to `128 + signal`, the convention shells use.
pub fn return_code(status: ExitStatus) -> i32 {
    match status.code() {
        Some(code) => code,
        None => terminated_by_signal(status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status.signal().map_or(-1, |signal| 128 + signal)
}

#[cfg(not(unix))]
fn terminated_by_signal(_status: ExitStatus) -> i32 {
    -1
}

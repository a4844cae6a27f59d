//! Detaching from the controlling terminal.
//!
//! [`daemonize`] must run before any threads exist, which in practice means
//! before the tokio runtime is built.

use std::fs::OpenOptions;
use std::io;
use std::os::fd::AsRawFd;
use std::path::Path;

use thiserror::Error;

/// Daemonization errors. All of them are fatal.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("fork failed: {0}")]
    Fork(#[source] io::Error),

    #[error("setsid failed: {0}")]
    Setsid(#[source] io::Error),

    #[error("Failed to change directory to /: {0}")]
    Chdir(#[source] io::Error),

    #[error("Failed to redirect standard streams to /dev/null: {0}")]
    Redirect(#[source] io::Error),
}

/// Fork into the background and detach.
///
/// The parent exits with status 0. The child clears its umask, becomes a
/// session leader, moves to `/` and points stdin, stdout and stderr at
/// `/dev/null`.
pub fn daemonize() -> Result<(), DaemonError> {
    // SAFETY: the process is still single-threaded here.
    match unsafe { libc::fork() } {
        -1 => return Err(DaemonError::Fork(io::Error::last_os_error())),
        0 => {}
        _ => std::process::exit(0),
    }

    // SAFETY: umask cannot fail.
    unsafe { libc::umask(0) };

    // SAFETY: plain syscall with no pointer arguments.
    if unsafe { libc::setsid() } < 0 {
        return Err(DaemonError::Setsid(io::Error::last_os_error()));
    }

    std::env::set_current_dir("/").map_err(DaemonError::Chdir)?;

    redirect_std_streams(Path::new("/dev/null")).map_err(DaemonError::Redirect)
}

/// Point fds 0, 1 and 2 at `target`. They stay open so later `open` calls
/// never reuse them.
fn redirect_std_streams(target: &Path) -> io::Result<()> {
    let file = OpenOptions::new().read(true).write(true).open(target)?;
    let fd = file.as_raw_fd();

    for std_fd in [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO] {
        // SAFETY: both descriptors are valid for the duration of the call.
        if unsafe { libc::dup2(fd, std_fd) } < 0 {
            return Err(io::Error::last_os_error());
        }
    }

    Ok(())
}

//! Launching external programs and reaping background children.
//!
//! Spawning and waiting are two distinct steps so that foreground versus
//! background is a policy choice at the call site: a foreground command is
//! waited for immediately, a background command's [`std::process::Child`]
//! handle is parked in [`Jobs`] and collected later by the non-blocking
//! sweep the main loop runs on every iteration.

use crate::command::ExitCode;
use anyhow::{Context, Result};
use std::io::{ErrorKind, Write};
use std::process::{Child, Command, ExitStatus};

/// Background children that have been spawned but not yet reaped.
///
/// There is no job table; the only bookkeeping is the set of live child
/// handles, and exit statuses are discarded on collection.
#[derive(Debug, Default)]
pub struct Jobs {
    children: Vec<Child>,
}

impl Jobs {
    /// Track a freshly spawned background child.
    pub fn track(&mut self, child: Child) {
        self.children.push(child);
    }

    /// Non-blocking sweep over all tracked children, dropping every one
    /// that has terminated. A child whose status can no longer be queried
    /// is dropped as well; it cannot be collected later.
    pub fn reap(&mut self) {
        self.children
            .retain_mut(|child| matches!(child.try_wait(), Ok(None)));
    }

    /// Number of children still tracked.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// True when no children are tracked.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Launch a non-builtin command.
///
/// Foreground commands are waited for and their exit code returned.
/// Background commands return immediately with code 0 after printing a
/// notice; their child handle goes into `jobs`.
///
/// A spawn failure caused by the program itself (not found, not
/// executable) is reported on `stdout` and yields a non-zero code without
/// disturbing the shell. Any other spawn failure is propagated as an error
/// and is fatal to the shell.
pub fn launch(
    tokens: &[String],
    background: bool,
    jobs: &mut Jobs,
    stdout: &mut dyn Write,
) -> Result<ExitCode> {
    let (program, args) = tokens
        .split_first()
        .context("cannot launch an empty command")?;

    let child = match Command::new(program).args(args).spawn() {
        Ok(child) => child,
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
            writeln!(stdout, "{}: execution failed: {}", program, e)?;
            return Ok(127);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to spawn '{}'", program));
        }
    };

    if background {
        writeln!(stdout, "[{}] running in background", child.id())?;
        jobs.track(child);
        return Ok(0);
    }

    let status = wait_foreground(child)?;
    Ok(exit_code(status))
}

fn wait_foreground(mut child: Child) -> Result<ExitStatus> {
    child.wait().context("failed to wait for child process")
}

fn exit_code(status: ExitStatus) -> ExitCode {
    match status.code() {
        Some(code) => code,
        None => terminated_by_signal(status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(status: ExitStatus) -> ExitCode {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_status: ExitStatus) -> ExitCode {
    -1
}

//! Shell-session state shared by the loop and the built-in commands.

use crate::history::HistoryRing;
use anyhow::{Context, Result};
use std::env as stdenv;
use std::path::PathBuf;

/// Mutable, per-session state of the shell.
///
/// This is the explicit replacement for the globals a classic shell would
/// keep: the working directory shown in the prompt, the directory `cd -`
/// returns to, the command history ring, and the flag an interactive loop
/// checks to know when to terminate. Only the single control thread ever
/// mutates it; child processes run in their own address space and the
/// interrupt path never touches it.
#[derive(Debug, Clone)]
pub struct Session {
    /// The current working directory, kept in sync with the process cwd.
    pub current_dir: PathBuf,
    /// The working directory in effect before the last successful `cd`.
    /// Unset until the first directory change; consumed by `cd -`.
    pub previous_dir: Option<PathBuf>,
    /// Ring buffer of the most recently entered commands.
    pub history: HistoryRing,
    /// When set to true, indicates that the interactive loop should exit.
    pub should_exit: bool,
}

impl Session {
    /// Capture the current process state into a new `Session`.
    ///
    /// Fails when the working directory cannot be resolved; the shell
    /// cannot display its prompt without one, so this is fatal to startup.
    pub fn new() -> Result<Self> {
        let current_dir =
            stdenv::current_dir().context("unable to resolve the current working directory")?;
        Ok(Self {
            current_dir,
            previous_dir: None,
            history: HistoryRing::default(),
            should_exit: false,
        })
    }

    /// The user's home directory, from the `HOME` environment variable.
    pub fn home_dir(&self) -> Result<PathBuf> {
        stdenv::var_os("HOME")
            .map(PathBuf::from)
            .context("HOME is not set")
    }
}

/// Serializes tests that change the process working directory.
///
/// The process cwd is global; tests across modules that call
/// `set_current_dir` must hold this lock.
#[cfg(test)]
pub(crate) fn lock_current_dir() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};
    static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
    MUTEX.get_or_init(|| Mutex::new(())).lock().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_captures_cwd() {
        let session = Session::new().unwrap();
        assert_eq!(session.current_dir, stdenv::current_dir().unwrap());
        assert!(session.previous_dir.is_none());
        assert_eq!(session.history.count(), 0);
        assert!(!session.should_exit);
    }

    #[test]
    fn test_home_dir_reads_environment() {
        let session = Session::new().unwrap();
        // HOME is set in any sane test environment.
        let home = session.home_dir().unwrap();
        assert!(home.is_absolute());
    }
}

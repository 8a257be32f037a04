use crate::command::{CommandFactory, ExecutableCommand, ExitCode};
use crate::interpreter::Factory;
use crate::session::Session;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use std::env as stdenv;
use std::io::Write;
use std::path::PathBuf;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
/// directly in-process without spawning a child process. Wrong argument
/// counts surface as `argh` usage errors and never terminate the shell.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "pwd" or "cd".
    fn name() -> &'static str;

    /// Executes the command against the session state.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        session: &mut Session,
    ) -> Result<ExitCode> {
        match T::execute(*self, stdout, session) {
            Ok(x) => Ok(x),
            Err(e) => {
                writeln!(stdout, "{}", e)?;
                Ok(1)
            }
        }
    }
}

struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        _session: &mut Session,
    ) -> Result<ExitCode> {
        writeln!(stdout, "{}", self.output.trim_end())?;
        Ok(if self.is_error { 1 } else { 0 })
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            Some(match T::from_args(&[name], args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

/// One-line descriptions printed by `help`, in the fixed listing order.
const HELP_TOPICS: [(&str, &str); 4] = [
    ("exit", "'exit'\tis a builtin command which exits the shell"),
    (
        "pwd",
        "'pwd'\tis a builtin command which displays the current working directory",
    ),
    (
        "cd",
        "'cd'\tis a builtin command which changes the current working directory",
    ),
    (
        "help",
        "'help'\tis a builtin command which displays information about the internal commands",
    ),
];

/// Write the full help listing, one line per builtin.
///
/// Shared by the `help` builtin and the Ctrl-C banner.
pub(crate) fn write_help_listing(out: &mut dyn Write) -> Result<()> {
    for (_, description) in HELP_TOPICS {
        writeln!(out, "{}", description)?;
    }
    Ok(())
}

#[derive(FromArgs)]
/// Exit the shell.
pub struct Exit {}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
        writeln!(stdout, "Exiting...")?;
        session.should_exit = true;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
        writeln!(stdout, "{}", session.current_dir.display())?;
        Ok(0)
    }
}

/// Change the current working directory.
///
/// `FromArgs` is implemented by hand because the target may be the literal
/// `-` (return to the previous directory), which a derived parser would
/// reject as an unknown flag.
pub struct Cd {
    /// Directory to switch to. `None` means the home directory.
    pub target: Option<String>,
}

impl FromArgs for Cd {
    fn from_args(command_name: &[&str], args: &[&str]) -> std::result::Result<Self, EarlyExit> {
        match args {
            [] => Ok(Cd { target: None }),
            [one] => Ok(Cd {
                target: Some((*one).to_string()),
            }),
            _ => Err(EarlyExit {
                output: format!(
                    "Usage: {} [directory]\ncd accepts 0 or 1 arguments",
                    command_name.join(" ")
                ),
                status: Err(()),
            }),
        }
    }

    fn redact_arg_values(
        command_name: &[&str],
        _args: &[&str],
    ) -> std::result::Result<Vec<String>, EarlyExit> {
        Ok(command_name.iter().map(|s| (*s).to_string()).collect())
    }
}

/// Resolve a `cd` argument to the directory to change into.
///
/// `None` and `~` mean the home directory, `-` means the previous
/// directory, a leading `~` is replaced by the home directory with the
/// remainder of the argument appended verbatim, and anything else is used
/// as-is. Pure with respect to the filesystem; existence is checked by the
/// actual directory change.
fn resolve_target(arg: Option<&str>, session: &Session) -> Result<PathBuf> {
    match arg {
        None | Some("~") => session.home_dir(),
        Some("-") => session
            .previous_dir
            .clone()
            .context("cd: no previous directory"),
        Some(tilde) if tilde.starts_with('~') => {
            let mut path = session.home_dir()?.into_os_string();
            path.push(&tilde[1..]);
            Ok(PathBuf::from(path))
        }
        Some(plain) => Ok(PathBuf::from(plain)),
    }
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
        let target = resolve_target(self.target.as_deref(), session)?;
        let before = session.current_dir.clone();

        stdenv::set_current_dir(&target)
            .with_context(|| format!("cd: directory '{}' does not exist", target.display()))?;

        session.current_dir = stdenv::current_dir()
            .context("unable to resolve the current working directory")?;
        session.previous_dir = Some(before);
        writeln!(stdout, "Directory changed to '{}'", target.display())?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Display information about the internal commands.
pub struct Help {
    #[argh(positional)]
    /// command to describe; lists every builtin when omitted.
    pub topic: Option<String>,
}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn execute(self, stdout: &mut dyn Write, _session: &mut Session) -> Result<ExitCode> {
        match self.topic.as_deref() {
            None => write_help_listing(stdout)?,
            Some(topic) => match HELP_TOPICS.iter().find(|(name, _)| *name == topic) {
                Some((_, description)) => writeln!(stdout, "{}", description)?,
                None => writeln!(stdout, "'{}' is an external command or application", topic)?,
            },
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// List the most recently entered commands, newest first.
pub struct History {}

impl BuiltinCommand for History {
    fn name() -> &'static str {
        "history"
    }

    fn execute(self, stdout: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
        for (index, line) in session.history.recent() {
            writeln!(stdout, "{}\t{}", index, line)?;
        }
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryRing;
    use crate::session::lock_current_dir;
    use std::fs;
    use std::io;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn test_session() -> Session {
        Session {
            current_dir: stdenv::current_dir().unwrap(),
            previous_dir: None,
            history: HistoryRing::default(),
            should_exit: false,
        }
    }

    fn make_unique_temp_dir() -> io::Result<PathBuf> {
        let mut p = stdenv::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        p.push(format!("minsh_test_cd_{}_{}", std::process::id(), nanos));
        fs::create_dir_all(&p)?;
        Ok(p)
    }

    fn run<T: BuiltinCommand + 'static>(args: &[&str], session: &mut Session) -> (ExitCode, String) {
        let factory = Factory::<T>::default();
        let cmd = factory
            .try_create(T::name(), args)
            .expect("factory should recognize its own name");
        let mut out = Vec::new();
        let code = cmd.execute(&mut out, session).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_pwd_prints_current_dir() {
        let _lock = lock_current_dir();
        let mut session = test_session();
        let (code, out) = run::<Pwd>(&[], &mut session);
        assert_eq!(code, 0);
        assert_eq!(out, format!("{}\n", session.current_dir.display()));
    }

    #[test]
    fn test_pwd_rejects_arguments() {
        let mut session = test_session();
        let (code, out) = run::<Pwd>(&["extra"], &mut session);
        assert_eq!(code, 1);
        assert!(!out.is_empty());
    }

    #[test]
    fn test_exit_sets_flag_without_terminating() {
        let mut session = test_session();
        let (code, out) = run::<Exit>(&[], &mut session);
        assert_eq!(code, 0);
        assert_eq!(out, "Exiting...\n");
        assert!(session.should_exit);
    }

    #[test]
    fn test_exit_with_argument_is_usage_error() {
        let mut session = test_session();
        let (code, _out) = run::<Exit>(&["now"], &mut session);
        assert_eq!(code, 1);
        assert!(!session.should_exit);
    }

    #[test]
    fn test_cd_parses_dash_as_target() {
        let cd = Cd::from_args(&["cd"], &["-"]).unwrap();
        assert_eq!(cd.target.as_deref(), Some("-"));
    }

    #[test]
    fn test_cd_rejects_two_arguments() {
        assert!(Cd::from_args(&["cd"], &["a", "b"]).is_err());
    }

    #[test]
    fn test_resolve_target_home_cases() {
        let session = test_session();
        let home = session.home_dir().unwrap();

        assert_eq!(resolve_target(None, &session).unwrap(), home);
        assert_eq!(resolve_target(Some("~"), &session).unwrap(), home);

        let mut expected = home.into_os_string();
        expected.push("/docs");
        assert_eq!(
            resolve_target(Some("~/docs"), &session).unwrap(),
            PathBuf::from(expected)
        );
    }

    #[test]
    fn test_resolve_target_verbatim() {
        let session = test_session();
        assert_eq!(
            resolve_target(Some("/usr/local"), &session).unwrap(),
            PathBuf::from("/usr/local")
        );
        assert_eq!(
            resolve_target(Some("subdir"), &session).unwrap(),
            PathBuf::from("subdir")
        );
    }

    #[test]
    fn test_resolve_target_dash_without_previous() {
        let session = test_session();
        let err = resolve_target(Some("-"), &session).unwrap_err();
        assert!(err.to_string().contains("no previous directory"));
    }

    #[test]
    fn test_resolve_target_dash_with_previous() {
        let mut session = test_session();
        session.previous_dir = Some(PathBuf::from("/tmp"));
        assert_eq!(
            resolve_target(Some("-"), &session).unwrap(),
            PathBuf::from("/tmp")
        );
    }

    #[test]
    fn test_cd_changes_dir_and_records_previous() {
        let _lock = lock_current_dir();
        let temp = make_unique_temp_dir().expect("failed to create temp dir");
        let orig = stdenv::current_dir().unwrap();

        let mut session = test_session();
        let (code, out) = run::<Cd>(&[temp.to_str().unwrap()], &mut session);

        assert_eq!(code, 0);
        assert!(out.contains("Directory changed to"));
        assert_eq!(session.previous_dir.as_deref(), Some(orig.as_path()));
        assert_eq!(session.current_dir, stdenv::current_dir().unwrap());

        stdenv::set_current_dir(&orig).expect("failed to restore cwd");
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_cd_failure_leaves_state_unchanged() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let mut session = test_session();

        let name = format!("nonexistent_dir_for_minsh_test_{}", std::process::id());
        let (code, out) = run::<Cd>(&[&name], &mut session);

        assert_eq!(code, 1);
        assert!(out.contains(&name));
        assert!(session.previous_dir.is_none());
        assert_eq!(stdenv::current_dir().unwrap(), orig);
    }

    #[test]
    fn test_cd_dash_without_previous_reports_error() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let mut session = test_session();

        let (code, out) = run::<Cd>(&["-"], &mut session);

        assert_eq!(code, 1);
        assert!(out.contains("no previous directory"));
        assert_eq!(stdenv::current_dir().unwrap(), orig);
    }

    #[test]
    fn test_help_lists_builtins_in_fixed_order() {
        let mut session = test_session();
        let (code, out) = run::<Help>(&[], &mut session);
        assert_eq!(code, 0);

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("'exit'"));
        assert!(lines[1].starts_with("'pwd'"));
        assert!(lines[2].starts_with("'cd'"));
        assert!(lines[3].starts_with("'help'"));
    }

    #[test]
    fn test_help_describes_single_builtin() {
        let mut session = test_session();
        let (code, out) = run::<Help>(&["cd"], &mut session);
        assert_eq!(code, 0);
        assert!(out.starts_with("'cd'"));
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn test_help_describes_unknown_name_as_external() {
        let mut session = test_session();
        let (code, out) = run::<Help>(&["gcc"], &mut session);
        assert_eq!(code, 0);
        assert_eq!(out, "'gcc' is an external command or application\n");
    }

    #[test]
    fn test_help_rejects_two_arguments() {
        let mut session = test_session();
        let (code, _out) = run::<Help>(&["cd", "pwd"], &mut session);
        assert_eq!(code, 1);
    }

    #[test]
    fn test_history_lists_newest_first() {
        let mut session = test_session();
        session.history.push("ls -l".to_string());
        session.history.push("pwd".to_string());

        let (code, out) = run::<History>(&[], &mut session);
        assert_eq!(code, 0);
        assert_eq!(out, "1\tpwd\n0\tls -l\n");
    }

    #[test]
    fn test_history_rejects_arguments() {
        let mut session = test_session();
        let (code, _out) = run::<History>(&["5"], &mut session);
        assert_eq!(code, 1);
    }

    #[test]
    fn test_factory_ignores_other_names() {
        let factory = Factory::<Pwd>::default();
        assert!(factory.try_create("cd", &[]).is_none());
    }
}

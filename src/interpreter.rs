use crate::builtin;
use crate::command::{CommandFactory, ExitCode};
use crate::external::{self, Jobs};
use crate::history;
use crate::lexer::CommandLine;
use crate::session::Session;
use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::Write;

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports the builtin commands defined in this crate; external
/// commands go through the launcher instead of a factory.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// The interactive shell: session state, builtin dispatch and the
/// prompt/read/execute loop.
///
/// One command per input line. Builtins run in-process; anything else is
/// spawned as a child process, in the foreground unless the line ended
/// with `&`. Every non-empty command is recorded in the history ring and
/// can be recalled with `!N` or `!!`.
pub struct Shell {
    session: Session,
    builtins: Vec<Box<dyn CommandFactory>>,
    jobs: Jobs,
}

impl Shell {
    /// Create a shell with the default builtins, capturing the current
    /// process state. Fails when the working directory cannot be resolved.
    pub fn new() -> Result<Self> {
        Ok(Self::with_session(Session::new()?))
    }

    /// Create a shell over an existing session, with the default set of
    /// builtins: `exit`, `pwd`, `cd`, `help`, `history`.
    pub fn with_session(session: Session) -> Self {
        use crate::builtin::{Cd, Exit, Help, History, Pwd};
        Self {
            session,
            builtins: vec![
                Box::new(Factory::<Exit>::default()),
                Box::new(Factory::<Pwd>::default()),
                Box::new(Factory::<Cd>::default()),
                Box::new(Factory::<Help>::default()),
                Box::new(Factory::<History>::default()),
            ],
            jobs: Jobs::default(),
        }
    }

    /// The session state, mainly for inspection in tests.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run the interactive read/eval loop until `exit`, end of input, or a
    /// fatal read error.
    ///
    /// Ctrl-C does not terminate the shell: rustyline's minimal signal
    /// handler surfaces it as [`ReadlineError::Interrupted`], the loop
    /// prints the help banner and the read is retried with a fresh prompt.
    /// All of that runs on the main thread, never inside the handler.
    pub fn repl(&mut self) -> Result<()> {
        let mut editor = DefaultEditor::new().context("failed to initialize line editing")?;

        while !self.session.should_exit {
            // Collect any background children that have terminated since
            // the previous iteration, whatever the last command was.
            self.jobs.reap();

            let prompt = format!("{}$ ", self.session.current_dir.display());
            match editor.readline(&prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        editor.add_history_entry(line.as_str())?;
                    }
                    self.handle_line(&line, &mut std::io::stdout())?;
                }
                Err(ReadlineError::Interrupted) => {
                    let mut stdout = std::io::stdout();
                    builtin::write_help_listing(&mut stdout)?;
                    stdout.flush()?;
                    // The next readline redraws "<cwd>$ " and retries.
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    return Err(err).context("failed to read command input");
                }
            }
        }

        Ok(())
    }

    /// Process one raw input line: parse, expand a history reference,
    /// record the command, then dispatch it.
    ///
    /// Returns the command's exit code; recall and usage failures are
    /// reported on `stdout` and yield a non-zero code. An `Err` from this
    /// method means the shell can no longer safely continue.
    pub fn handle_line(&mut self, line: &str, stdout: &mut dyn Write) -> Result<ExitCode> {
        let mut cmd = CommandLine::parse(line);
        if cmd.is_empty() {
            return Ok(0);
        }

        if is_history_reference(&cmd.tokens[0]) {
            let stored = match history::resolve_reference(&cmd.tokens[0], &self.session.history) {
                Ok(stored) => stored,
                Err(e) => {
                    writeln!(stdout, "{}", e)?;
                    return Ok(1);
                }
            };
            // The recalled text replaces the reference line wholesale and
            // goes through the same `&` extraction as fresh input.
            cmd = CommandLine::parse(&stored);
            if cmd.is_empty() {
                writeln!(stdout, "command not retrieved")?;
                return Ok(1);
            }
        }

        // The resolved command is what history records; a raw `!N` line
        // itself is never stored.
        self.session.history.push(cmd.history_text());

        self.dispatch(&cmd, stdout)
    }

    fn dispatch(&mut self, cmd: &CommandLine, stdout: &mut dyn Write) -> Result<ExitCode> {
        let name = cmd.tokens[0].as_str();
        let args: Vec<&str> = cmd.tokens[1..].iter().map(|s| s.as_str()).collect();

        for factory in &self.builtins {
            if let Some(command) = factory.try_create(name, &args) {
                return command.execute(stdout, &mut self.session);
            }
        }

        external::launch(&cmd.tokens, cmd.background, &mut self.jobs, stdout)
    }
}

/// Whether a token is a history reference.
///
/// `!!` repeats the last command and `!<suffix>` is an index reference
/// (including a bare `!`, whose empty suffix fails the digit check later).
/// Longer tokens beginning with `!!` are ordinary commands.
fn is_history_reference(token: &str) -> bool {
    match token.strip_prefix('!') {
        Some(rest) => token == "!!" || !rest.starts_with('!'),
        None => false,
    }
}

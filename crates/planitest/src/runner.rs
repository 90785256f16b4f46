//! External process seam
//!
//! [`CommandRunner`] is the single point where planitest starts a process.
//! [`SystemCommandRunner`] does it for real; tests substitute a fake.

use std::process::Command;

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output, lossily decoded
    pub stdout: String,
    /// Standard error, lossily decoded
    pub stderr: String,
    /// Exit code, `None` when terminated by a signal
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    /// Successful output with the given stdout
    #[must_use]
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    /// Failed output with the given exit code and stderr
    #[must_use]
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: Some(code),
        }
    }

    /// Whether the process exited with status 0
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Run a named program with arguments and capture its output
///
/// Returns `Err` only when the process could not be run at all; a non-zero
/// exit is reported through [`CommandOutput::exit_code`].
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner {
    /// Run `program` with `args`, blocking until it exits
    fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput> {
        (**self).run(program, args)
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for Box<R> {
    fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput> {
        (**self).run(program, args)
    }
}

/// Runs commands with [`std::process::Command`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    /// Create new system runner
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput> {
        let output = Command::new(program).args(args).output()?;
        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}

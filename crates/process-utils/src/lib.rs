//! Child process helpers for driving the external download and mux tools.
//!
//! Two concerns live here: keeping console windows from flashing up on
//! Windows when a tool is spawned, and running a tool to completion with its
//! output captured so the caller can log what went wrong.

use std::ffi::OsStr;
use std::process::ExitStatus;
use std::time::Duration;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Number of stderr lines kept in [`CapturedOutput::stderr_tail`].
pub const STDERR_TAIL_LINES: usize = 20;

/// Apply the Windows `CREATE_NO_WINDOW` flag to child processes.
///
/// On non-Windows targets this is a no-op.
pub trait NoWindowExt {
    fn no_window(&mut self);
}

impl NoWindowExt for std::process::Command {
    fn no_window(&mut self) {
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            self.creation_flags(CREATE_NO_WINDOW);
        }
    }
}

/// Create a `std::process::Command` with `CREATE_NO_WINDOW` applied on Windows.
pub fn std_command(program: impl AsRef<OsStr>) -> std::process::Command {
    let mut cmd = std::process::Command::new(program);
    cmd.no_window();
    cmd
}

#[cfg(feature = "tokio")]
impl NoWindowExt for tokio::process::Command {
    fn no_window(&mut self) {
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            self.as_std_mut().creation_flags(CREATE_NO_WINDOW);
        }
    }
}

/// Create a `tokio::process::Command` with `CREATE_NO_WINDOW` applied on Windows.
#[cfg(feature = "tokio")]
pub fn tokio_command(program: impl AsRef<OsStr>) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(program);
    cmd.no_window();
    cmd
}

/// Result of a child process that ran to completion with captured streams.
#[derive(Debug, Clone)]
pub struct CapturedOutput {
    /// Exit status reported by the OS.
    pub status: ExitStatus,
    /// Full stdout, lossily decoded.
    pub stdout: String,
    /// Last [`STDERR_TAIL_LINES`] non-empty lines of stderr.
    pub stderr_tail: String,
    /// Wall-clock run time.
    pub duration: Duration,
}

impl CapturedOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code, `None` when the process was terminated by a signal.
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    /// Short human-readable reason for a failed run.
    pub fn failure_reason(&self) -> String {
        let code = match self.status.code() {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        };
        if self.stderr_tail.is_empty() {
            code
        } else {
            format!("{code}: {}", self.stderr_tail)
        }
    }
}

/// Keep the trailing `max_lines` non-empty lines of `text`.
pub fn tail_lines(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}

/// Run `cmd` to completion with stdin closed and stdout/stderr captured.
///
/// Nothing is forwarded to the parent's console. No timeout is applied: a
/// tool that never exits blocks the caller.
#[cfg(feature = "tokio")]
pub async fn run_captured(cmd: &mut tokio::process::Command) -> std::io::Result<CapturedOutput> {
    use std::process::Stdio;

    let start = std::time::Instant::now();
    let output = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    Ok(CapturedOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr_tail: tail_lines(&String::from_utf8_lossy(&output.stderr), STDERR_TAIL_LINES),
        duration: start.elapsed(),
    })
}

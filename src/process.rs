//! Child process execution with captured output.
//!
//! Commands run through the platform shell (`sh -c` / `cmd /C`). Stdout and
//! stderr are drained by two reader threads so a chatty child can never block
//! on a full pipe, and a result is only returned once the child has exited
//! *and* both readers have been joined.

use crate::command::CommandLine;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;

/// Exit code reported when the child was terminated without one (signal).
pub const NO_EXIT_CODE: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("failed while waiting for `{command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("interrupted while waiting for `{command}`")]
    Interrupted { command: String },
}

/// Shared cancellation flag for a running task.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Seam between orchestration and the operating system.
pub trait CommandRunner: Send + Sync {
    fn run(
        &self,
        command: &CommandLine,
        working_dir: Option<&Path>,
        cancel: &CancelToken,
    ) -> Result<ProcessResult, ProcessError>;
}

#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    poll_interval: Duration,
}

impl Default for ProcessExecutor {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(25),
        }
    }
}

impl ProcessExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// How often the child is polled for exit and the token for cancellation.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run `command_line` and wait for it, capturing both output streams.
    ///
    /// A non-zero exit code is a normal result. Only launch failures and
    /// cancellation are errors. On cancellation the shell and everything it
    /// started are killed, and the partial output is discarded.
    pub fn execute(
        &self,
        command_line: &str,
        working_dir: Option<&Path>,
        cancel: &CancelToken,
    ) -> Result<ProcessResult, ProcessError> {
        log::debug!("running `{}`", command_line);

        let mut command = shell_command(command_line);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = working_dir {
            command.current_dir(dir);
        }

        let spawn_error = |source| ProcessError::Spawn {
            command: command_line.to_string(),
            source,
        };

        let mut child = command.spawn().map_err(spawn_error)?;
        let readers = match start_readers(&mut child) {
            Ok(readers) => readers,
            Err(source) => {
                terminate(&mut child);
                return Err(spawn_error(source));
            }
        };

        let status = match self.wait(&mut child, cancel) {
            Ok(status) => status,
            Err(WaitFailure::Cancelled) => {
                terminate(&mut child);
                // A process that escaped the kill may still hold the pipes.
                readers.detach();
                log::warn!("cancelled `{}`", command_line);
                return Err(ProcessError::Interrupted {
                    command: command_line.to_string(),
                });
            }
            Err(WaitFailure::Io(source)) => {
                terminate(&mut child);
                readers.detach();
                return Err(ProcessError::Wait {
                    command: command_line.to_string(),
                    source,
                });
            }
        };

        let (stdout, stderr) = readers.join();
        let exit_code = status.code().unwrap_or(NO_EXIT_CODE);
        log::debug!("`{}` exited with {}", command_line, exit_code);

        Ok(ProcessResult {
            exit_code,
            stdout,
            stderr,
        })
    }

    fn wait(&self, child: &mut Child, cancel: &CancelToken) -> Result<ExitStatus, WaitFailure> {
        loop {
            if cancel.is_cancelled() {
                return Err(WaitFailure::Cancelled);
            }
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => thread::sleep(self.poll_interval),
                Err(e) => return Err(WaitFailure::Io(e)),
            }
        }
    }
}

impl CommandRunner for ProcessExecutor {
    fn run(
        &self,
        command: &CommandLine,
        working_dir: Option<&Path>,
        cancel: &CancelToken,
    ) -> Result<ProcessResult, ProcessError> {
        self.execute(command.as_str(), working_dir, cancel)
    }
}

enum WaitFailure {
    Cancelled,
    Io(io::Error),
}

#[cfg(windows)]
fn shell_command(command_line: &str) -> Command {
    use std::os::windows::process::CommandExt;

    let mut command = Command::new("cmd");
    // cmd strips one pair of outer quotes, so wrap the whole line once.
    command.arg("/C").raw_arg(format!("\"{}\"", command_line));
    command
}

#[cfg(not(windows))]
fn shell_command(command_line: &str) -> Command {
    use std::os::unix::process::CommandExt;

    let mut command = Command::new("sh");
    // The shell leads a new process group so a cancel reaches what it forks.
    command.arg("-c").arg(command_line).process_group(0);
    command
}

#[cfg(not(windows))]
fn kill_process_group(leader: u32) {
    let status = Command::new("sh")
        .arg("-c")
        .arg(format!("kill -s KILL -- -{leader}"))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match status {
        Ok(status) if !status.success() => {
            log::debug!("kill of process group {} exited with {}", leader, status)
        }
        Err(e) => log::debug!("kill of process group {} failed: {}", leader, e),
        Ok(_) => {}
    }
}

fn terminate(child: &mut Child) {
    #[cfg(not(windows))]
    kill_process_group(child.id());
    if let Err(e) = child.kill() {
        log::debug!("kill failed: {}", e);
    }
    let _ = child.wait();
}

struct Readers {
    stdout: Option<JoinHandle<String>>,
    stderr: Option<JoinHandle<String>>,
}

impl Readers {
    fn join(self) -> (String, String) {
        let join = |handle: Option<JoinHandle<String>>| {
            handle
                .map(|h| h.join().unwrap_or_default())
                .unwrap_or_default()
        };
        (join(self.stdout), join(self.stderr))
    }

    /// Let the readers run to EOF on their own.
    fn detach(self) {
        drop(self.stdout);
        drop(self.stderr);
    }
}

fn start_readers(child: &mut Child) -> io::Result<Readers> {
    let stdout = child
        .stdout
        .take()
        .map(|stream| spawn_reader("stdout-reader", stream))
        .transpose()?;
    // On failure the stdout reader is detached; it ends once the child is killed.
    let stderr = child
        .stderr
        .take()
        .map(|stream| spawn_reader("stderr-reader", stream))
        .transpose()?;
    Ok(Readers { stdout, stderr })
}

fn spawn_reader<R: Read + Send + 'static>(name: &str, stream: R) -> io::Result<JoinHandle<String>> {
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || drain_lines(stream))
}

/// Accumulate `stream` as `\n`-terminated lines until EOF.
fn drain_lines(stream: impl Read) -> String {
    let mut reader = BufReader::new(stream);
    let mut out = String::new();
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => break,
            Ok(_) => {
                if line.last() == Some(&b'\n') {
                    line.pop();
                }
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                out.push_str(&String::from_utf8_lossy(&line));
                out.push('\n');
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                log::debug!("output stream closed with error: {}", e);
                break;
            }
        }
    }
    out
}

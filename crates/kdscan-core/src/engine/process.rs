use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("'{program}' did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },
    #[error("I/O error while waiting for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// A fully specified external command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs external commands to completion.
pub trait ProcessRunner: Send + Sync {
    fn run(&self, command: &CommandSpec) -> Result<ProcessOutput, ProcessError>;
}

/// Spawns real operating-system processes.
///
/// Output pipes are drained on helper threads so a chatty child cannot block
/// on a full pipe while the runner polls for its exit. A child that outlives
/// its timeout is killed and reaped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessRunner;

fn drain<R: Read + Send + 'static>(source: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut source) = source {
            let _ = source.read_to_end(&mut buffer);
        }
        String::from_utf8_lossy(&buffer).into_owned()
    })
}

fn collect(handle: thread::JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}

impl SystemProcessRunner {
    fn wait(child: &mut Child, command: &CommandSpec) -> Result<Option<i32>, ProcessError> {
        let started = Instant::now();
        loop {
            let status = child.try_wait().map_err(|source| ProcessError::Wait {
                program: command.program_name(),
                source,
            })?;
            if let Some(status) = status {
                return Ok(status.code());
            }
            if let Some(timeout) = command.timeout {
                if started.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ProcessError::TimedOut {
                        program: command.program_name(),
                        timeout,
                    });
                }
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, command: &CommandSpec) -> Result<ProcessOutput, ProcessError> {
        debug!(program = %command.program_name(), args = ?command.args, "Spawning external process.");
        let mut builder = Command::new(&command.program);
        builder
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &command.working_dir {
            builder.current_dir(dir);
        }

        let mut child = builder.spawn().map_err(|source| ProcessError::Spawn {
            program: command.program_name(),
            source,
        })?;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let exit_code = Self::wait(&mut child, command)?;
        Ok(ProcessOutput {
            exit_code,
            stdout: collect(stdout),
            stderr: collect(stderr),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandSpec {
        CommandSpec::new("/bin/sh").arg("-c").arg(script)
    }

    #[test]
    fn captures_output_and_exit_code() {
        let output = SystemProcessRunner
            .run(&sh("echo hello; echo oops 1>&2; exit 3"))
            .unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert!(!output.success());
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[test]
    fn successful_command_reports_success() {
        let output = SystemProcessRunner.run(&sh("true")).unwrap();
        assert!(output.success());
    }

    #[test]
    fn slow_command_is_killed_after_timeout() {
        let command = sh("sleep 5").timeout(Some(Duration::from_millis(100)));
        let started = Instant::now();
        let result = SystemProcessRunner.run(&command);
        assert!(matches!(result, Err(ProcessError::TimedOut { .. })));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let result = SystemProcessRunner.run(&CommandSpec::new("/nonexistent/kdscan-test-binary"));
        assert!(matches!(result, Err(ProcessError::Spawn { .. })));
    }

    #[test]
    fn working_directory_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let command = sh("pwd").working_dir(Some(dir.path().to_path_buf()));
        let output = SystemProcessRunner.run(&command).unwrap();
        let reported = std::fs::canonicalize(output.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
    }
}

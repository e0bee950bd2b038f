use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::error::GitError;

/// Timeout for read-only metadata queries (status, branch, remote lookups).
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(2);
/// Timeout for local mutations (commit, checkout, branch surgery).
pub const MUTATE_TIMEOUT: Duration = Duration::from_secs(5);
/// Timeout for network operations (push, pull).
pub const NETWORK_TIMEOUT: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Captured result of one git invocation.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Preferred diagnostic text: stderr when present, otherwise stdout.
    /// Git prints some failures ("nothing to commit") on stdout only.
    pub fn diagnostic(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

/// Seam between the core and the external git binary, so tests can script
/// a fake instead of spawning processes.
pub trait CommandRunner: Send + Sync {
    /// Run git with the given argument vector and timeout.
    ///
    /// `repo` supplies the working context via `-C <path>` rather than a
    /// process-wide chdir, so concurrent calls for different repositories
    /// never interfere. `None` runs without a repository context
    /// (global-config queries).
    fn run(
        &self,
        repo: Option<&Path>,
        args: &[&str],
        timeout: Duration,
    ) -> Result<RunOutput, GitError>;
}

/// Real runner that shells out to the configured git binary.
pub struct GitCli {
    program: String,
}

impl GitCli {
    pub fn new() -> Self {
        Self {
            program: "git".to_string(),
        }
    }

    /// Use a non-default binary name or path (tests, odd installs).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn launch_error(&self, source: std::io::Error) -> GitError {
        GitError::Launch {
            program: self.program.clone(),
            source,
        }
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for GitCli {
    fn run(
        &self,
        repo: Option<&Path>,
        args: &[&str],
        timeout: Duration,
    ) -> Result<RunOutput, GitError> {
        let mut cmd = Command::new(&self.program);
        if let Some(path) = repo {
            cmd.arg("-C").arg(path);
        }
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| self.launch_error(e))?;

        // Drain both pipes off-thread: a child that fills a pipe buffer
        // would otherwise block forever and always hit the timeout.
        let stdout_pipe = drain(child.stdout.take());
        let stderr_pipe = drain(child.stderr.take());

        let start = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if start.elapsed() >= timeout {
                        warn!(args = ?args, ?timeout, "git call timed out, killing child");
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(GitError::Timeout {
                            args: args.join(" "),
                            timeout,
                        });
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(self.launch_error(e));
                }
            }
        };

        Ok(RunOutput {
            exit_code: status.code().unwrap_or(-1),
            stdout: join_pipe(stdout_pipe),
            stderr: join_pipe(stderr_pipe),
        })
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut r| {
        std::thread::spawn(move || {
            let mut bytes = Vec::new();
            let _ = r.read_to_end(&mut bytes);
            String::from_utf8_lossy(&bytes).into_owned()
        })
    })
}

fn join_pipe(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

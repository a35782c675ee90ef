//! I/O abstractions for testability
//!
//! Everything that leaves the process goes through one of these traits: the
//! gateway HTTP call, the external `openclaw` CLI, and the wrapped child
//! command. Production implementations use reqwest and tokio::process.

use std::collections::VecDeque;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::Mutex;

use crate::error::NotifyError;

/// HTTP response from a request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Abstraction over HTTP client for dependency injection
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// POST a JSON body with a bearer token, bounded by `timeout`
    async fn post_json(
        &self,
        url: &str,
        bearer_token: &str,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> crate::Result<HttpResponse>;
}

/// Production HTTP client using reqwest
#[derive(Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn post_json(
        &self,
        url: &str,
        bearer_token: &str,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> crate::Result<HttpResponse> {
        tracing::debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .bearer_auth(bearer_token)
            .json(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| NotifyError::Http(format!("POST {} failed: {}", url, e)))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| NotifyError::Http(format!("Reading response body: {}", e)))?;

        tracing::debug!("POST {} -> {} ({} bytes)", url, status, body.len());
        Ok(HttpResponse { status, body })
    }
}

/// Captured result of a finished external command
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code, `None` when the command was terminated by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs short-lived helper commands such as the messaging CLI
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Whether `program` can be resolved on `PATH`
    fn is_available(&self, program: &str) -> bool;

    /// Run `program` with `args`, capturing output, bounded by `timeout`
    async fn output(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> crate::Result<CommandOutput>;
}

/// Command runner backed by tokio::process
#[derive(Debug, Default, Clone)]
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    async fn output(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> crate::Result<CommandOutput> {
        tracing::debug!("Running {} {:?}", program, args);

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(timeout, cmd.output())
            .await
            .map_err(|_| {
                NotifyError::Timeout(format!("{} did not finish within {:?}", program, timeout))
            })??;

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// How a wrapped child process terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Normal exit with the given code
    Exited(i32),
    /// Terminated by the given signal number
    Signaled(i32),
}

/// Number of trailing output lines kept from a wrapped child
pub const OUTPUT_TAIL_LINES: usize = 10;

/// Rolling window over the last lines a child printed, across both streams
#[derive(Debug, Clone)]
pub struct OutputTail {
    lines: VecDeque<String>,
    capacity: usize,
}

impl OutputTail {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, line: String) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines.into()
    }
}

/// A finished child: how it ended and the last lines it printed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildExit {
    pub outcome: ExitOutcome,
    pub output_tail: Vec<String>,
}

/// Spawns the wrapped workload and waits for it
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProcessSpawner: Send + Sync {
    /// Run `argv` to completion. Stdin is inherited; stdout and stderr are
    /// echoed to ours while the last lines are kept.
    ///
    /// Spawn failures are reported as [`NotifyError::Io`] so callers can
    /// inspect the [`std::io::ErrorKind`].
    async fn run(&self, argv: &[String]) -> crate::Result<ChildExit>;
}

/// Tokio implementation of ProcessSpawner
#[derive(Debug, Default, Clone)]
pub struct TokioProcessSpawner;

#[async_trait]
impl ProcessSpawner for TokioProcessSpawner {
    async fn run(&self, argv: &[String]) -> crate::Result<ChildExit> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| NotifyError::Usage("nothing to run".to_string()))?;

        tracing::debug!("Spawning {} {:?}", program, args);
        let mut child = Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        tracing::debug!("Child started with PID: {:?}", child.id());

        let tail = Arc::new(Mutex::new(OutputTail::new(OUTPUT_TAIL_LINES)));
        let mut relays = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            relays.push(tokio::spawn(relay(
                stdout,
                tokio::io::stdout(),
                Arc::clone(&tail),
            )));
        }
        if let Some(stderr) = child.stderr.take() {
            relays.push(tokio::spawn(relay(
                stderr,
                tokio::io::stderr(),
                Arc::clone(&tail),
            )));
        }

        // The terminal delivers Ctrl-C to the whole process group. Keep
        // waiting so the child's own outcome gets reported.
        let mut watch_interrupts = true;
        let status = loop {
            if !watch_interrupts {
                break child.wait().await?;
            }
            tokio::select! {
                status = child.wait() => break status?,
                signal = tokio::signal::ctrl_c() => match signal {
                    Ok(()) => tracing::debug!("Interrupt received; waiting for child to exit"),
                    Err(e) => {
                        tracing::debug!("Cannot watch for interrupts: {}", e);
                        watch_interrupts = false;
                    }
                },
            }
        };

        for relay in relays {
            if let Err(e) = relay.await {
                tracing::debug!("Output relay task failed: {}", e);
            }
        }
        let output_tail = tail.lock().await.clone().into_lines();

        Ok(ChildExit {
            outcome: exit_outcome(status),
            output_tail,
        })
    }
}

fn exit_outcome(status: std::process::ExitStatus) -> ExitOutcome {
    if let Some(code) = status.code() {
        return ExitOutcome::Exited(code);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return ExitOutcome::Signaled(signal);
        }
    }

    ExitOutcome::Exited(1)
}

/// Copy `source` to `sink` line by line, remembering each line in `tail`.
/// Keeps draining after a write error so the child never blocks on a full pipe.
async fn relay<R, W>(source: R, mut sink: W, tail: Arc<Mutex<OutputTail>>)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(source);
    let mut line = Vec::new();
    let mut echo = true;
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                if echo {
                    if let Err(e) = write_line(&mut sink, &line).await {
                        tracing::debug!("Stopped echoing child output: {}", e);
                        echo = false;
                    }
                }
                let text = String::from_utf8_lossy(&line);
                tail.lock()
                    .await
                    .push(text.trim_end_matches(['\r', '\n']).to_string());
            }
            Err(e) => {
                tracing::debug!("Reading child output failed: {}", e);
                break;
            }
        }
    }
}

async fn write_line<W: AsyncWrite + Unpin>(sink: &mut W, line: &[u8]) -> std::io::Result<()> {
    sink.write_all(line).await?;
    sink.flush().await
}

//! Run a child command and report how it finished

use std::io::ErrorKind;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::error::NotifyError;
use crate::io::{ChildExit, ExitOutcome, ProcessSpawner};
use crate::notifier::Notifier;

/// Exit status when the command could not be found
pub const EXIT_NOT_FOUND: i32 = 127;
/// Exit status when the command exists but cannot be executed
pub const EXIT_NOT_EXECUTABLE: i32 = 126;
/// Base added to a signal number to form the exit status
pub const EXIT_SIGNAL_BASE: i32 = 128;

/// How the wrapped command ended, as seen by the wrapper
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Exited with the given code
    Exited(i32),
    /// Killed by the given signal
    Signaled(i32),
    /// Never started
    LaunchFailed { status: i32, reason: String },
}

impl Completion {
    fn from_spawn(result: crate::Result<ChildExit>) -> (Self, Vec<String>) {
        match result {
            Ok(ChildExit {
                outcome,
                output_tail,
            }) => {
                let completion = match outcome {
                    ExitOutcome::Exited(code) => Completion::Exited(code),
                    ExitOutcome::Signaled(signal) => Completion::Signaled(signal),
                };
                (completion, output_tail)
            }
            Err(NotifyError::Io(e)) => {
                let status = match e.kind() {
                    ErrorKind::NotFound => EXIT_NOT_FOUND,
                    ErrorKind::PermissionDenied => EXIT_NOT_EXECUTABLE,
                    _ => 1,
                };
                let completion = Completion::LaunchFailed {
                    status,
                    reason: e.to_string(),
                };
                (completion, Vec::new())
            }
            Err(e) => {
                let completion = Completion::LaunchFailed {
                    status: 1,
                    reason: e.to_string(),
                };
                (completion, Vec::new())
            }
        }
    }

    /// Exit status the wrapper should report
    pub fn status(&self) -> i32 {
        match self {
            Completion::Exited(code) => *code,
            Completion::Signaled(signal) => EXIT_SIGNAL_BASE + signal,
            Completion::LaunchFailed { status, .. } => *status,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Completion::Exited(0))
    }

    /// Finish message for `label`. Failures after the child ran quote the
    /// last lines of its output.
    pub fn message(
        &self,
        label: &str,
        program: &str,
        elapsed: Duration,
        output_tail: &[String],
    ) -> String {
        let elapsed = elapsed_str(elapsed);
        let headline = match self {
            Completion::Exited(0) => return format!("✅ **{label}** finished in {elapsed}"),
            Completion::Exited(code) => {
                format!("❌ **{label}** exited with code {code} after {elapsed}")
            }
            Completion::Signaled(signal) => {
                let hint = if is_kill(*signal) { " (likely OOM)" } else { "" };
                format!(
                    "❌ **{label}** killed by {} ({signal}){hint} after {elapsed}",
                    signal_name(*signal)
                )
            }
            Completion::LaunchFailed { reason, .. } => {
                return format!("❌ **{label}** failed to launch `{program}`: {reason}");
            }
        };

        if output_tail.is_empty() {
            headline
        } else {
            format!("{headline}\n```\n{}\n```", output_tail.join("\n"))
        }
    }
}

/// Run `argv`, send exactly one finish notification, and return the exit
/// status. `plot` is attached only when the command succeeds. An empty
/// `argv` returns 1 without running or notifying anything.
pub async fn wrap(
    argv: &[String],
    label: Option<&str>,
    plot: Option<&Path>,
    spawner: &dyn ProcessSpawner,
    notifier: &mut dyn Notifier,
) -> i32 {
    let Some(program) = argv.first() else {
        tracing::warn!("No command given to wrap");
        return 1;
    };
    let label = label
        .map(str::to_string)
        .unwrap_or_else(|| default_label(program));

    tracing::info!("Running {} as '{}'", program, label);
    let started = Instant::now();
    let (completion, output_tail) = Completion::from_spawn(spawner.run(argv).await);
    let elapsed = started.elapsed();

    let status = completion.status();
    tracing::info!(
        "'{}' completed with status {} after {}",
        label,
        status,
        elapsed_str(elapsed)
    );

    let message = completion.message(&label, program, elapsed, &output_tail);
    let attachment = if completion.is_success() { plot } else { None };
    notifier.send_now(&message, attachment).await;
    status
}

/// File name of the program, or the program string itself
pub fn default_label(program: &str) -> String {
    Path::new(program)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.to_string())
}

/// Human wall-clock duration: `12s`, `3.5min`, `1.2h`
pub fn elapsed_str(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs >= 3600.0 {
        format!("{:.1}h", secs / 3600.0)
    } else if secs >= 60.0 {
        format!("{:.1}min", secs / 60.0)
    } else {
        format!("{:.0}s", secs)
    }
}

#[cfg(unix)]
pub fn signal_name(signal: i32) -> String {
    match signal {
        libc::SIGHUP => "SIGHUP".to_string(),
        libc::SIGINT => "SIGINT".to_string(),
        libc::SIGABRT => "SIGABRT".to_string(),
        libc::SIGKILL => "SIGKILL".to_string(),
        libc::SIGSEGV => "SIGSEGV".to_string(),
        libc::SIGTERM => "SIGTERM".to_string(),
        n => format!("signal {n}"),
    }
}

#[cfg(not(unix))]
pub fn signal_name(signal: i32) -> String {
    format!("signal {signal}")
}

#[cfg(unix)]
fn is_kill(signal: i32) -> bool {
    signal == libc::SIGKILL
}

#[cfg(not(unix))]
fn is_kill(_signal: i32) -> bool {
    false
}

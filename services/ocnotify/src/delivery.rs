//! Delivery path selection
//!
//! The first send attempt runs a self-test that picks one of three routes:
//! the local `openclaw` CLI, the HTTP gateway, or nothing at all. The choice
//! is made exactly once per notifier.

use std::fmt;
use std::path::Path;

use crate::config::{GatewayConfig, NotifierConfig, GATEWAY_URL_VAR};
use crate::error::NotifyError;
use crate::io::{CommandOutput, CommandRunner};

/// Text sent by the dry-run probe
pub const PROBE_MESSAGE: &str = "🔔 Progress notifier connected.";

/// Marker the CLI prints when the channel has no local configuration
const UNKNOWN_CHANNEL_MARKER: &str = "Unknown channel";

/// Maximum number of characters of probe output shown in a diagnostic
const PROBE_OUTPUT_LIMIT: usize = 200;

/// The delivery path chosen by the self-test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryRoute {
    Cli,
    Http(GatewayConfig),
    Disabled,
}

/// Self-test state machine: `Untested -> Selected(route)`, never back
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DeliveryState {
    #[default]
    Untested,
    Selected(DeliveryRoute),
}

impl DeliveryState {
    pub fn route(&self) -> Option<&DeliveryRoute> {
        match self {
            DeliveryState::Untested => None,
            DeliveryState::Selected(route) => Some(route),
        }
    }

    pub fn is_tested(&self) -> bool {
        matches!(self, DeliveryState::Selected(_))
    }
}

/// Advisory conditions found by the self-test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    MissingDestination,
    ChannelNotConfigured { program: String, channel: String },
    ProbeFailed { program: String, detail: String },
    HttpFallback { url: String },
    NoDeliveryPath { program: String },
}

impl Diagnostic {
    /// Write the diagnostic to the log (stderr in the binary)
    pub fn emit(&self) {
        match self {
            Diagnostic::HttpFallback { .. } => tracing::info!("{}", self),
            _ => tracing::warn!("{}", self),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingDestination => write!(
                f,
                "No channel/target configured. Set OPENCLAW_PROGRESS_CHANNEL and \
                 OPENCLAW_PROGRESS_TARGET. Notifications will be silent."
            ),
            Diagnostic::ChannelNotConfigured { program, channel } => write!(
                f,
                "{program} CLI found but channel '{channel}' is not configured on this machine. \
                 Fix: run '{program} doctor --fix' or set {GATEWAY_URL_VAR} for HTTP fallback."
            ),
            Diagnostic::ProbeFailed { program, detail } => {
                write!(f, "{program} CLI dry-run failed: {detail}")
            }
            Diagnostic::HttpFallback { url } => write!(f, "Using HTTP fallback -> {url}"),
            Diagnostic::NoDeliveryPath { program } => write!(
                f,
                "{program} CLI not available/configured and no gateway set. \
                 Notifications will be silent. To fix, either: \
                 1. install {program} and run '{program} doctor --fix', or \
                 2. set OPENCLAW_GATEWAY_URL and OPENCLAW_GATEWAY_TOKEN"
            ),
        }
    }
}

/// Outcome of a self-test run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfTestReport {
    pub route: DeliveryRoute,
    pub diagnostics: Vec<Diagnostic>,
}

/// Arguments for `<cli> message send ...`
pub fn message_send_args(
    channel: &str,
    target: &str,
    message: &str,
    media: Option<&Path>,
) -> Vec<String> {
    let mut args = vec![
        "message".to_string(),
        "send".to_string(),
        "--channel".to_string(),
        channel.to_string(),
        "--target".to_string(),
        target.to_string(),
        "--message".to_string(),
        message.to_string(),
    ];
    if let Some(path) = media {
        args.push("--media".to_string());
        args.push(path.display().to_string());
    }
    args
}

/// Decide which delivery route to use. Never fails; problems become diagnostics.
pub async fn self_test(config: &NotifierConfig, runner: &dyn CommandRunner) -> SelfTestReport {
    let mut diagnostics = Vec::new();

    let Some((channel, target)) = config.destination() else {
        return SelfTestReport {
            route: DeliveryRoute::Disabled,
            diagnostics: vec![Diagnostic::MissingDestination],
        };
    };

    let program = config.cli_program.as_str();
    if runner.is_available(program) {
        match probe(config, channel, target, runner).await {
            Ok(()) => {
                tracing::debug!("{} dry-run succeeded; using CLI delivery", program);
                return SelfTestReport {
                    route: DeliveryRoute::Cli,
                    diagnostics,
                };
            }
            Err(e) => diagnostics.push(probe_diagnostic(program, e)),
        }
    } else {
        tracing::debug!("{} not found on PATH", program);
    }

    let route = match &config.gateway {
        Some(gateway) => {
            diagnostics.push(Diagnostic::HttpFallback {
                url: gateway.url.clone(),
            });
            DeliveryRoute::Http(gateway.clone())
        }
        None => {
            diagnostics.push(Diagnostic::NoDeliveryPath {
                program: program.to_string(),
            });
            DeliveryRoute::Disabled
        }
    };

    SelfTestReport { route, diagnostics }
}

/// Run the CLI in dry-run mode for the configured destination
pub async fn probe(
    config: &NotifierConfig,
    channel: &str,
    target: &str,
    runner: &dyn CommandRunner,
) -> crate::Result<()> {
    let mut args = message_send_args(channel, target, PROBE_MESSAGE, None);
    args.push("--dry-run".to_string());

    let output = runner
        .output(&config.cli_program, &args, config.probe_timeout)
        .await?;

    if output.success() {
        Ok(())
    } else {
        Err(classify_probe_failure(channel, output))
    }
}

fn classify_probe_failure(channel: &str, output: CommandOutput) -> NotifyError {
    let combined = format!("{}{}", output.stderr, output.stdout);
    if combined.contains(UNKNOWN_CHANNEL_MARKER) {
        return NotifyError::ChannelUnconfigured(channel.to_string());
    }

    let raw = if output.stderr.is_empty() {
        &output.stdout
    } else {
        &output.stderr
    };
    NotifyError::Probe {
        status: output.status,
        output: truncate_chars(raw, PROBE_OUTPUT_LIMIT),
    }
}

fn probe_diagnostic(program: &str, error: NotifyError) -> Diagnostic {
    match error {
        NotifyError::ChannelUnconfigured(channel) => Diagnostic::ChannelNotConfigured {
            program: program.to_string(),
            channel,
        },
        NotifyError::Probe { output, .. } => Diagnostic::ProbeFailed {
            program: program.to_string(),
            detail: output,
        },
        other => Diagnostic::ProbeFailed {
            program: program.to_string(),
            detail: other.to_string(),
        },
    }
}

/// First `limit` characters of `text`
pub fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

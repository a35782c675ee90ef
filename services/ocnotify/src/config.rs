//! Configuration types for ocnotify
//!
//! Settings come from three layers, highest precedence first: command-line
//! flags (applied by the binary), `OPENCLAW_*` environment variables, and an
//! optional JSON file. Everything is resolved once into a [`NotifierConfig`]
//! that is handed to the notifier.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::NotifyError;

pub const PROGRESS_CHANNEL_VAR: &str = "OPENCLAW_PROGRESS_CHANNEL";
pub const DEFAULT_DM_CHANNEL_VAR: &str = "OPENCLAW_DEFAULT_DM_CHANNEL";
pub const PROGRESS_TARGET_VAR: &str = "OPENCLAW_PROGRESS_TARGET";
pub const DEFAULT_DM_TARGET_VAR: &str = "OPENCLAW_DEFAULT_DM_TARGET";
pub const GATEWAY_URL_VAR: &str = "OPENCLAW_GATEWAY_URL";
pub const GATEWAY_TOKEN_VAR: &str = "OPENCLAW_GATEWAY_TOKEN";
pub const INTERVAL_VAR: &str = "OPENCLAW_PROGRESS_INTERVAL_SEC";
pub const PLOT_INTERVAL_VAR: &str = "OPENCLAW_PROGRESS_PLOT_INTERVAL_SEC";

pub const DEFAULT_INTERVAL_SECONDS: u64 = 300;
pub const DEFAULT_CLI_PROGRAM: &str = "openclaw";
pub const DEFAULT_PROBE_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_SEND_TIMEOUT_SECONDS: u64 = 15;

/// A source of named string variables
pub trait EnvSource {
    /// Raw lookup of a single variable
    fn var(&self, name: &str) -> Option<String>;

    /// Look up `name`, then `fallback`. Unset and empty values count as absent.
    fn resolve(&self, name: &str, fallback: Option<&str>) -> Option<String> {
        non_empty(self.var(name)).or_else(|| fallback.and_then(|f| non_empty(self.var(f))))
    }
}

/// The real process environment
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Optional JSON configuration file. Every field may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub channel: Option<String>,
    pub target: Option<String>,
    pub interval_seconds: Option<u64>,
    pub plot_interval_seconds: Option<u64>,
    pub gateway_url: Option<String>,
    pub gateway_token: Option<String>,
    pub cli_program: Option<String>,
    pub probe_timeout_seconds: Option<u64>,
    pub send_timeout_seconds: Option<u64>,
}

/// HTTP gateway endpoint and credentials
#[derive(Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub url: String,
    pub token: String,
}

impl GatewayConfig {
    /// Full URL of the message-send endpoint
    pub fn send_endpoint(&self) -> String {
        format!("{}/api/v1/message/send", self.url.trim_end_matches('/'))
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Fully resolved notifier settings. Immutable once built.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub channel: Option<String>,
    pub target: Option<String>,
    pub text_interval: Duration,
    pub plot_interval: Duration,
    pub gateway: Option<GatewayConfig>,
    pub cli_program: String,
    pub probe_timeout: Duration,
    pub send_timeout: Duration,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            channel: None,
            target: None,
            text_interval: Duration::from_secs(DEFAULT_INTERVAL_SECONDS),
            plot_interval: Duration::from_secs(DEFAULT_INTERVAL_SECONDS),
            gateway: None,
            cli_program: DEFAULT_CLI_PROGRAM.to_string(),
            probe_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECONDS),
            send_timeout: Duration::from_secs(DEFAULT_SEND_TIMEOUT_SECONDS),
        }
    }
}

impl NotifierConfig {
    /// Resolve from environment variables only
    pub fn from_env(env: &dyn EnvSource) -> crate::Result<Self> {
        Self::from_sources(env, &FileConfig::default())
    }

    /// Resolve from environment variables layered over a config file
    pub fn from_sources(env: &dyn EnvSource, file: &FileConfig) -> crate::Result<Self> {
        let channel = env
            .resolve(PROGRESS_CHANNEL_VAR, Some(DEFAULT_DM_CHANNEL_VAR))
            .or_else(|| non_empty(file.channel.clone()));
        let target = env
            .resolve(PROGRESS_TARGET_VAR, Some(DEFAULT_DM_TARGET_VAR))
            .or_else(|| non_empty(file.target.clone()));

        let text_seconds = match env.resolve(INTERVAL_VAR, None) {
            Some(raw) => parse_seconds(INTERVAL_VAR, &raw)?,
            None => file.interval_seconds.unwrap_or(DEFAULT_INTERVAL_SECONDS),
        };
        let plot_seconds = match env.resolve(PLOT_INTERVAL_VAR, None) {
            Some(raw) => parse_seconds(PLOT_INTERVAL_VAR, &raw)?,
            None => file.plot_interval_seconds.unwrap_or(text_seconds),
        };

        let url = env
            .resolve(GATEWAY_URL_VAR, None)
            .or_else(|| non_empty(file.gateway_url.clone()));
        let token = env
            .resolve(GATEWAY_TOKEN_VAR, None)
            .or_else(|| non_empty(file.gateway_token.clone()));
        let gateway = match (url, token) {
            (Some(url), Some(token)) => Some(GatewayConfig { url, token }),
            (Some(_), None) => {
                tracing::debug!("{} is set without {}", GATEWAY_URL_VAR, GATEWAY_TOKEN_VAR);
                None
            }
            _ => None,
        };

        Ok(Self {
            channel,
            target,
            text_interval: Duration::from_secs(text_seconds),
            plot_interval: Duration::from_secs(plot_seconds),
            gateway,
            cli_program: non_empty(file.cli_program.clone())
                .unwrap_or_else(|| DEFAULT_CLI_PROGRAM.to_string()),
            probe_timeout: Duration::from_secs(
                file.probe_timeout_seconds
                    .unwrap_or(DEFAULT_PROBE_TIMEOUT_SECONDS),
            ),
            send_timeout: Duration::from_secs(
                file.send_timeout_seconds
                    .unwrap_or(DEFAULT_SEND_TIMEOUT_SECONDS),
            ),
        })
    }

    /// Channel and target, if both are configured
    pub fn destination(&self) -> Option<(&str, &str)> {
        match (&self.channel, &self.target) {
            (Some(channel), Some(target)) => Some((channel.as_str(), target.as_str())),
            _ => None,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.destination().is_some()
    }
}

fn parse_seconds(name: &str, raw: &str) -> crate::Result<u64> {
    raw.trim().parse::<u64>().map_err(|_| {
        NotifyError::Config(format!(
            "{} must be a non-negative number of seconds, got '{}'",
            name, raw
        ))
    })
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<FileConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        NotifyError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: FileConfig = serde_json::from_str(&content)?;
    Ok(config)
}

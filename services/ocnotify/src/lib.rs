//! ocnotify - progress notifications for long-running jobs
//!
//! Sends throttled progress updates and completion notices through the
//! OpenClaw CLI, or its HTTP gateway when the CLI cannot deliver.

pub mod config;
pub mod delivery;
pub mod dispatcher;
pub mod error;
pub mod format;
pub mod io;
pub mod notifier;
pub mod throttle;
pub mod wrapper;

pub use config::{load_config, EnvSource, FileConfig, NotifierConfig, ProcessEnv};
pub use error::{NotifyError, Result};
pub use format::{detect_channel_type, format_batch_summary, format_grid, ChannelStyle, JobRecord};
pub use notifier::{Notifier, ProgressNotifier};
pub use wrapper::wrap;

use std::path::{Path, PathBuf};

/// Resolve the notifier configuration from an optional JSON file and the
/// process environment, applying command-line channel/target overrides last.
pub fn resolve_config(
    config_path: Option<&Path>,
    env: &dyn EnvSource,
    channel: Option<String>,
    target: Option<String>,
) -> Result<NotifierConfig> {
    let file = match config_path {
        Some(path) => {
            tracing::debug!("Loading configuration from {:?}", path);
            load_config(path)?
        }
        None => {
            tracing::debug!("Using environment configuration only");
            FileConfig::default()
        }
    };

    let mut config = NotifierConfig::from_sources(env, &file)?;
    if channel.is_some() {
        config.channel = channel;
    }
    if target.is_some() {
        config.target = target;
    }
    Ok(config)
}

/// Pull `--plot <path>` or `--plot=<path>` out of free-form message words.
///
/// Message words may start with a hyphen, so a `--plot` given after the
/// message text arrives here instead of as a parsed flag. The last one wins.
pub fn take_plot_arg(words: Vec<String>) -> Result<(Vec<String>, Option<PathBuf>)> {
    let mut message = Vec::with_capacity(words.len());
    let mut plot = None;
    let mut words = words.into_iter();
    while let Some(word) = words.next() {
        if word == "--plot" {
            let path = words
                .next()
                .ok_or_else(|| NotifyError::Usage("--plot requires a path".to_string()))?;
            plot = Some(PathBuf::from(path));
        } else if let Some(path) = word.strip_prefix("--plot=") {
            plot = Some(PathBuf::from(path));
        } else {
            message.push(word);
        }
    }
    Ok((message, plot))
}

/// Parse `Key=Value,Key=Value` into a job record
pub fn parse_job(raw: &str) -> Result<JobRecord> {
    let mut job = JobRecord::new();
    for field in raw.split(',').filter(|f| !f.trim().is_empty()) {
        let (label, value) = field
            .split_once('=')
            .ok_or_else(|| NotifyError::Usage(format!("expected Key=Value, got '{field}'")))?;
        let label = label.trim();
        if label.is_empty() {
            return Err(NotifyError::Usage(format!("empty field name in '{field}'")));
        }
        job.insert(label, value.trim());
    }
    if job.is_empty() {
        return Err(NotifyError::Usage(format!("job '{raw}' has no fields")));
    }
    Ok(job)
}

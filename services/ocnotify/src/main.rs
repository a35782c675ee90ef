//! ocnotify CLI
//!
//! Command-line front end for throttled progress notifications, wrapped
//! command completion notices and formatted job summaries.

use std::fmt::Display;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use ocnotify::io::TokioProcessSpawner;
use ocnotify::{
    format_batch_summary, parse_job, resolve_config, take_plot_arg, wrap, JobRecord, Notifier,
    NotifierConfig, ProcessEnv, ProgressNotifier,
};
use tracing::Level;

#[derive(Parser)]
#[command(name = "ocnotify")]
#[command(about = "Progress notifications for long-running jobs via OpenClaw")]
#[command(version)]
#[command(after_help = "A message whose first word is `wrap` or `summary` must follow `--`, \
    e.g. `ocnotify -- summary of epoch 3`.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Channel (overrides environment and config file)
    #[arg(long, global = true)]
    channel: Option<String>,

    /// Target within the channel (overrides environment and config file)
    #[arg(long, global = true)]
    target: Option<String>,

    /// Log level
    #[arg(short, long, default_value = "info", global = true)]
    log_level: Level,

    #[command(subcommand)]
    command: Option<Command>,

    /// Message text, words are joined with single spaces
    #[arg(allow_hyphen_values = true)]
    message: Vec<String>,

    /// Plot image to attach when the plot interval allows
    #[arg(long)]
    plot: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a command and notify when it finishes
    Wrap {
        /// Name used in the notification (defaults to the program's file name)
        #[arg(long)]
        label: Option<String>,

        /// Plot image attached to the notification when the command succeeds
        #[arg(long)]
        plot: Option<PathBuf>,

        /// Command and arguments, after `--`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Send a formatted summary of a batch of jobs
    Summary {
        /// Summary title
        #[arg(long)]
        title: String,

        /// One job as Key=Value,Key=Value (repeatable)
        #[arg(long = "job", required = true, value_parser = parse_job)]
        jobs: Vec<JobRecord>,

        /// Closing paragraph
        #[arg(long)]
        footer: Option<String>,

        /// Plot image to attach
        #[arg(long)]
        plot: Option<PathBuf>,

        /// Print the rendered summary instead of sending it
        #[arg(long)]
        print: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, channel={:?}, target={:?}, log_level={:?}",
        args.config,
        args.channel,
        args.target,
        args.log_level
    );

    let resolved = resolve_config(
        args.config.as_deref(),
        &ProcessEnv,
        args.channel.clone(),
        args.target.clone(),
    );
    if let Ok(config) = &resolved {
        tracing::debug!("Resolved configuration: {:?}", config);
    }

    match args.command {
        Some(Command::Wrap {
            label,
            plot,
            command,
        }) => {
            // The workload runs regardless; a bad setting only silences notifications
            let config = resolved.unwrap_or_else(|e| {
                tracing::warn!("{}. Notifications are disabled for this run.", e);
                NotifierConfig::default()
            });
            let mut notifier = ProgressNotifier::from_config(config);
            let status = wrap(
                &command,
                label.as_deref(),
                plot.as_deref(),
                &TokioProcessSpawner,
                &mut notifier,
            )
            .await;
            ExitCode::from(exit_byte(status))
        }
        Some(Command::Summary {
            title,
            jobs,
            footer,
            plot,
            print,
        }) => {
            let config = match resolved {
                Ok(config) => config,
                Err(e) => return usage_failure(e),
            };
            let text = format_batch_summary(
                &title,
                &jobs,
                footer.as_deref(),
                config.channel.as_deref(),
            );
            if print {
                println!("{text}");
            } else {
                let mut notifier = ProgressNotifier::from_config(config);
                notifier.send_now(&text, plot.as_deref()).await;
            }
            ExitCode::SUCCESS
        }
        None => {
            let (words, trailing_plot) = match take_plot_arg(args.message) {
                Ok(split) => split,
                Err(e) => return usage_failure(e),
            };
            if words.is_empty() {
                return usage_failure("no message given (try --help)");
            }
            let config = match resolved {
                Ok(config) => config,
                Err(e) => return usage_failure(e),
            };
            let plot = trailing_plot.or(args.plot);
            let mut notifier = ProgressNotifier::from_config(config);
            notifier.maybe_send(&words.join(" "), plot.as_deref()).await;
            ExitCode::SUCCESS
        }
    }
}

fn usage_failure(error: impl Display) -> ExitCode {
    eprintln!("Error: {error}");
    ExitCode::from(1)
}

/// Clamp a child status into the range a process can exit with
fn exit_byte(status: i32) -> u8 {
    u8::try_from(status).unwrap_or(1)
}

//! Channel-aware rendering of job summaries and grids
//!
//! Chat backends disagree on markup: Telegram renders pipe tables, Discord
//! and Slack handle bold and bullets but mangle tables, and Signal or
//! iMessage show raw markdown characters. Each channel maps to one style.

use std::fmt;

const TITLE_ICON: &str = "🚀";
const BULLET: &str = "▸";
const FIELD_SEPARATOR: &str = " · ";

/// Markup style supported by a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStyle {
    /// Bold labels and bullet glyphs, no tables
    Rich,
    /// Markdown pipe tables
    Table,
    /// No markup at all
    Plain,
}

impl fmt::Display for ChannelStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelStyle::Rich => write!(f, "rich"),
            ChannelStyle::Table => write!(f, "table"),
            ChannelStyle::Plain => write!(f, "plain"),
        }
    }
}

/// Map a channel name to its markup style. Unknown or missing channels get
/// [`ChannelStyle::Rich`].
pub fn detect_channel_type(channel: Option<&str>) -> ChannelStyle {
    let Some(channel) = channel else {
        return ChannelStyle::Rich;
    };
    match channel.trim().to_ascii_lowercase().as_str() {
        "telegram" => ChannelStyle::Table,
        "discord" | "slack" | "whatsapp" => ChannelStyle::Rich,
        "signal" | "imessage" => ChannelStyle::Plain,
        _ => ChannelStyle::Rich,
    }
}

/// One job's fields, in display order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobRecord {
    fields: Vec<(String, String)>,
}

impl JobRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, replacing the value if the label already exists
    pub fn with(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(label, value);
        self
    }

    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) {
        let label = label.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(l, _)| *l == label) {
            Some(field) => field.1 = value,
            None => self.fields.push((label, value)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(l, v)| (l.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for JobRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = JobRecord::new();
        for (label, value) in iter {
            record.insert(label, value);
        }
        record
    }
}

/// Render a titled list of jobs for `channel`
pub fn format_batch_summary(
    title: &str,
    jobs: &[JobRecord],
    footer: Option<&str>,
    channel: Option<&str>,
) -> String {
    let mut lines = Vec::new();

    match detect_channel_type(channel) {
        ChannelStyle::Rich => {
            lines.push(format!("{TITLE_ICON} **{title}**"));
            for job in jobs.iter().filter(|job| !job.is_empty()) {
                let fields: Vec<String> = job
                    .fields()
                    .map(|(label, value)| format!("**{label}:** {value}"))
                    .collect();
                lines.push(format!("{BULLET} {}", fields.join(FIELD_SEPARATOR)));
            }
        }
        ChannelStyle::Table => {
            lines.push(format!("**{title}**"));
            let headers = union_of_labels(jobs);
            if !headers.is_empty() {
                let rows: Vec<Vec<String>> = jobs
                    .iter()
                    .filter(|job| !job.is_empty())
                    .map(|job| {
                        headers
                            .iter()
                            .map(|h| job.get(h).unwrap_or_default().to_string())
                            .collect()
                    })
                    .collect();
                lines.push(String::new());
                lines.extend(pipe_table(&headers, &rows));
            }
        }
        ChannelStyle::Plain => {
            lines.push(format!("[{title}]"));
            for job in jobs.iter().filter(|job| !job.is_empty()) {
                let fields: Vec<String> = job
                    .fields()
                    .map(|(label, value)| format!("{label}: {value}"))
                    .collect();
                lines.push(format!("- {}", fields.join(", ")));
            }
        }
    }

    if let Some(footer) = footer {
        lines.push(String::new());
        lines.push(footer.to_string());
    }

    lines.join("\n")
}

/// Render a rectangular grid for `channel`.
///
/// Short rows are padded with empty cells; cells past the last header are
/// dropped. A grid without headers renders as an empty string.
pub fn format_grid<S: AsRef<str>>(rows: &[Vec<S>], headers: &[S], channel: Option<&str>) -> String {
    if headers.is_empty() {
        return String::new();
    }
    let headers: Vec<String> = headers.iter().map(|h| h.as_ref().to_string()).collect();
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            (0..headers.len())
                .map(|i| row.get(i).map(|c| c.as_ref().to_string()).unwrap_or_default())
                .collect()
        })
        .collect();

    match detect_channel_type(channel) {
        ChannelStyle::Rich => rows
            .iter()
            .map(|row| {
                headers
                    .iter()
                    .zip(row)
                    .enumerate()
                    .map(|(i, (header, cell))| {
                        if i == 0 {
                            format!("{BULLET} **{header}:** {cell}")
                        } else {
                            format!("   **{header}:** {cell}")
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n\n"),
        ChannelStyle::Table => pipe_table(&headers, &rows).join("\n"),
        ChannelStyle::Plain => rows
            .iter()
            .map(|row| {
                headers
                    .iter()
                    .zip(row)
                    .map(|(header, cell)| format!("{header}: {cell}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn union_of_labels(jobs: &[JobRecord]) -> Vec<String> {
    let mut labels: Vec<String> = Vec::new();
    for job in jobs {
        for (label, _) in job.fields() {
            if !labels.iter().any(|l| l == label) {
                labels.push(label.to_string());
            }
        }
    }
    labels
}

fn pipe_table(headers: &[String], rows: &[Vec<String>]) -> Vec<String> {
    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(pipe_row(headers.iter().map(String::as_str)));
    lines.push(pipe_row(headers.iter().map(|_| "---")));
    for row in rows {
        lines.push(pipe_row(row.iter().map(String::as_str)));
    }
    lines
}

fn pipe_row<'a>(cells: impl Iterator<Item = &'a str>) -> String {
    let cells: Vec<String> = cells.map(|c| c.replace('|', "\\|")).collect();
    format!("| {} |", cells.join(" | "))
}

//! Independent throttling of text and plot updates

use std::time::{Duration, Instant};

/// What a single throttled send should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Nothing is due
    Skip,
    /// Text is due, no attachment
    Text,
    /// Only the plot is due. The message text still rides along with it.
    Plot,
    /// Both are due: one combined send
    Combined,
}

impl Decision {
    pub fn sends(&self) -> bool {
        !matches!(self, Decision::Skip)
    }

    pub fn attaches_plot(&self) -> bool {
        matches!(self, Decision::Plot | Decision::Combined)
    }
}

/// Last-sent timestamps for text and plot updates
#[derive(Debug, Clone)]
pub struct Throttle {
    text_interval: Duration,
    plot_interval: Duration,
    last_text_sent: Option<Instant>,
    last_plot_sent: Option<Instant>,
}

impl Throttle {
    pub fn new(text_interval: Duration, plot_interval: Duration) -> Self {
        Self {
            text_interval,
            plot_interval,
            last_text_sent: None,
            last_plot_sent: None,
        }
    }

    /// Decide what is due at `now` without changing any state
    pub fn decide(&self, now: Instant, has_plot: bool) -> Decision {
        let send_text = is_due(self.last_text_sent, self.text_interval, now);
        let send_plot = has_plot && is_due(self.last_plot_sent, self.plot_interval, now);

        match (send_text, send_plot) {
            (false, false) => Decision::Skip,
            (true, false) => Decision::Text,
            (false, true) => Decision::Plot,
            (true, true) => Decision::Combined,
        }
    }

    /// Record that `decision` was acted on at `now`.
    ///
    /// A plot-only send does not mark the text as sent, so the same text may
    /// go out again on the next text tick.
    pub fn record(&mut self, decision: Decision, now: Instant) {
        match decision {
            Decision::Skip => {}
            Decision::Text => self.last_text_sent = Some(now),
            Decision::Plot => self.last_plot_sent = Some(now),
            Decision::Combined => {
                self.last_text_sent = Some(now);
                self.last_plot_sent = Some(now);
            }
        }
    }

    /// Decide and record in one step
    pub fn advance(&mut self, now: Instant, has_plot: bool) -> Decision {
        let decision = self.decide(now, has_plot);
        self.record(decision, now);
        decision
    }

    pub fn last_text_sent(&self) -> Option<Instant> {
        self.last_text_sent
    }

    pub fn last_plot_sent(&self) -> Option<Instant> {
        self.last_plot_sent
    }
}

fn is_due(last: Option<Instant>, interval: Duration, now: Instant) -> bool {
    match last {
        None => true,
        Some(last) => now.saturating_duration_since(last) >= interval,
    }
}

//! Notifier trait and the throttled progress notifier

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::config::NotifierConfig;
use crate::delivery::{DeliveryState, Diagnostic};
use crate::dispatcher::{Dispatcher, SendRequest};
use crate::io::{CommandRunner, HttpClient, ReqwestHttpClient, TokioCommandRunner};
use crate::throttle::{Decision, Throttle};

/// Trait for sending progress notifications
#[async_trait]
pub trait Notifier: Send {
    /// Send immediately, ignoring throttling
    async fn send_now(&mut self, message: &str, plot: Option<&Path>);

    /// Send only what the throttle allows
    async fn maybe_send(&mut self, message: &str, plot: Option<&Path>);
}

/// Throttled notifier delivering through the OpenClaw CLI or gateway
#[derive(Debug)]
pub struct ProgressNotifier {
    dispatcher: Dispatcher,
    throttle: Throttle,
}

impl ProgressNotifier {
    pub fn new(
        config: NotifierConfig,
        runner: Arc<dyn CommandRunner>,
        http: Arc<dyn HttpClient>,
    ) -> Self {
        let throttle = Throttle::new(config.text_interval, config.plot_interval);
        Self {
            dispatcher: Dispatcher::new(config, runner, http),
            throttle,
        }
    }

    /// Notifier using the real CLI and HTTP client
    pub fn from_config(config: NotifierConfig) -> Self {
        Self::new(
            config,
            Arc::new(TokioCommandRunner),
            Arc::new(ReqwestHttpClient::default()),
        )
    }

    pub fn config(&self) -> &NotifierConfig {
        self.dispatcher.config()
    }

    pub fn delivery_state(&self) -> &DeliveryState {
        self.dispatcher.state()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.dispatcher.diagnostics()
    }

    pub fn throttle(&self) -> &Throttle {
        &self.throttle
    }

    /// Throttled send evaluated at an explicit instant
    pub async fn maybe_send_at(
        &mut self,
        now: Instant,
        message: &str,
        plot: Option<&Path>,
    ) -> Decision {
        if !self.config().is_configured() {
            // Still run the self-test so the missing-destination warning shows once
            self.dispatcher.ensure_tested().await;
            return Decision::Skip;
        }

        let decision = self.throttle.advance(now, plot.is_some());
        tracing::debug!("Throttle decision: {:?}", decision);

        match decision {
            Decision::Skip => {}
            Decision::Text => {
                self.dispatcher
                    .dispatch(&SendRequest::new(message, None))
                    .await
            }
            Decision::Plot | Decision::Combined => {
                self.dispatcher
                    .dispatch(&SendRequest::new(message, plot))
                    .await
            }
        }
        decision
    }
}

#[async_trait]
impl Notifier for ProgressNotifier {
    async fn send_now(&mut self, message: &str, plot: Option<&Path>) {
        self.dispatcher
            .dispatch(&SendRequest::new(message, plot))
            .await;
    }

    async fn maybe_send(&mut self, message: &str, plot: Option<&Path>) {
        self.maybe_send_at(Instant::now(), message, plot).await;
    }
}

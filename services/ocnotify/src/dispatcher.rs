//! Message dispatch over the selected delivery route

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::config::{GatewayConfig, NotifierConfig};
use crate::delivery::{self, DeliveryRoute, DeliveryState, Diagnostic};
use crate::error::NotifyError;
use crate::io::{CommandRunner, HttpClient};

/// A single message with an optional attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub message: String,
    pub attachment: Option<PathBuf>,
}

impl SendRequest {
    pub fn new(message: impl Into<String>, attachment: Option<&Path>) -> Self {
        Self {
            message: message.into(),
            attachment: attachment.map(Path::to_path_buf),
        }
    }
}

/// JSON body accepted by the gateway's message-send endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayPayload {
    pub channel: String,
    pub target: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_path: Option<String>,
}

impl GatewayPayload {
    /// `media_path` is only set when the attachment exists as a file
    pub fn new(channel: &str, target: &str, request: &SendRequest) -> Self {
        let media_path = request
            .attachment
            .as_deref()
            .filter(|path| path.is_file())
            .map(|path| {
                std::path::absolute(path)
                    .unwrap_or_else(|_| path.to_path_buf())
                    .display()
                    .to_string()
            });

        Self {
            channel: channel.to_string(),
            target: target.to_string(),
            message: request.message.clone(),
            media_path,
        }
    }
}

/// Sends messages through whichever route the self-test picked
pub struct Dispatcher {
    config: NotifierConfig,
    runner: Arc<dyn CommandRunner>,
    http: Arc<dyn HttpClient>,
    state: DeliveryState,
    diagnostics: Vec<Diagnostic>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("channel", &self.config.channel)
            .field("target", &self.config.target)
            .field("state", &self.state)
            .finish()
    }
}

impl Dispatcher {
    pub fn new(
        config: NotifierConfig,
        runner: Arc<dyn CommandRunner>,
        http: Arc<dyn HttpClient>,
    ) -> Self {
        Self {
            config,
            runner,
            http,
            state: DeliveryState::Untested,
            diagnostics: Vec::new(),
        }
    }

    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    pub fn state(&self) -> &DeliveryState {
        &self.state
    }

    /// Diagnostics produced by the self-test, empty until it has run
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Run the self-test on first use and return the selected route
    pub async fn ensure_tested(&mut self) -> &DeliveryRoute {
        if !self.state.is_tested() {
            let report = delivery::self_test(&self.config, self.runner.as_ref()).await;
            for diagnostic in &report.diagnostics {
                diagnostic.emit();
            }
            tracing::debug!("Delivery route selected: {:?}", report.route);
            self.diagnostics = report.diagnostics;
            self.state = DeliveryState::Selected(report.route);
        }

        match &self.state {
            DeliveryState::Selected(route) => route,
            DeliveryState::Untested => &DeliveryRoute::Disabled,
        }
    }

    /// Best-effort send. Failures are logged and dropped.
    pub async fn dispatch(&mut self, request: &SendRequest) {
        if let Err(e) = self.try_dispatch(request).await {
            tracing::debug!("Notification not delivered: {}", e);
        }
    }

    /// Send and report the failure instead of swallowing it
    pub async fn try_dispatch(&mut self, request: &SendRequest) -> crate::Result<()> {
        let route = self.ensure_tested().await.clone();
        let Some((channel, target)) = self.config.destination() else {
            return Ok(());
        };

        match route {
            DeliveryRoute::Disabled => Ok(()),
            DeliveryRoute::Http(gateway) => self.send_http(&gateway, channel, target, request).await,
            DeliveryRoute::Cli => self.send_cli(channel, target, request).await,
        }
    }

    async fn send_http(
        &self,
        gateway: &GatewayConfig,
        channel: &str,
        target: &str,
        request: &SendRequest,
    ) -> crate::Result<()> {
        let payload = serde_json::to_value(GatewayPayload::new(channel, target, request))?;
        let response = self
            .http
            .post_json(
                &gateway.send_endpoint(),
                &gateway.token,
                &payload,
                self.config.send_timeout,
            )
            .await?;

        if !(200..300).contains(&response.status) {
            return Err(NotifyError::Http(format!(
                "Gateway returned status {}: {}",
                response.status,
                delivery::truncate_chars(&response.body, 200)
            )));
        }
        Ok(())
    }

    async fn send_cli(&self, channel: &str, target: &str, request: &SendRequest) -> crate::Result<()> {
        let args = delivery::message_send_args(
            channel,
            target,
            &request.message,
            request.attachment.as_deref(),
        );
        let output = self
            .runner
            .output(&self.config.cli_program, &args, self.config.send_timeout)
            .await?;

        if !output.success() {
            tracing::debug!(
                "{} message send exited with {:?}: {}",
                self.config.cli_program,
                output.status,
                output.stderr.trim()
            );
        }
        Ok(())
    }
}

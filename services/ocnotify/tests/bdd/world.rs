//! BDD test world for ocnotify

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cucumber::World;
use ocnotify::config::NotifierConfig;
use ocnotify::io::{CommandOutput, CommandRunner, HttpClient, HttpResponse};
use ocnotify::notifier::{Notifier, ProgressNotifier};
use ocnotify::throttle::Decision;
use ocnotify::JobRecord;

/// Stand-in for the `openclaw` CLI
#[derive(Debug, Clone, Default)]
pub struct FakeCli {
    pub missing: bool,
    pub probe_status: i32,
    pub probe_output: String,
    pub calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl FakeCli {
    fn is_probe(args: &[String]) -> bool {
        args.iter().any(|a| a == "--dry-run")
    }

    pub fn probes(&self) -> usize {
        let calls = self.calls.lock().unwrap();
        calls.iter().filter(|args| Self::is_probe(args)).count()
    }

    pub fn sends(&self) -> Vec<Vec<String>> {
        let calls = self.calls.lock().unwrap();
        calls
            .iter()
            .filter(|args| !Self::is_probe(args))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CommandRunner for FakeCli {
    fn is_available(&self, _program: &str) -> bool {
        !self.missing
    }

    async fn output(
        &self,
        _program: &str,
        args: &[String],
        _timeout: Duration,
    ) -> ocnotify::Result<CommandOutput> {
        self.calls.lock().unwrap().push(args.to_vec());
        let status = if Self::is_probe(args) {
            self.probe_status
        } else {
            0
        };
        Ok(CommandOutput {
            status: Some(status),
            stdout: String::new(),
            stderr: if Self::is_probe(args) {
                self.probe_output.clone()
            } else {
                String::new()
            },
        })
    }
}

/// Stand-in for the OpenClaw HTTP gateway
#[derive(Debug, Clone, Default)]
pub struct FakeGateway {
    pub posts: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
}

impl FakeGateway {
    pub fn posts(&self) -> Vec<(String, serde_json::Value)> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for FakeGateway {
    async fn post_json(
        &self,
        url: &str,
        _bearer_token: &str,
        body: &serde_json::Value,
        _timeout: Duration,
    ) -> ocnotify::Result<HttpResponse> {
        self.posts
            .lock()
            .unwrap()
            .push((url.to_string(), body.clone()));
        Ok(HttpResponse {
            status: 200,
            body: "{}".to_string(),
        })
    }
}

/// Notifier that only remembers what it was asked to send
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub sent: Vec<String>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_now(&mut self, message: &str, _plot: Option<&Path>) {
        self.sent.push(message.to_string());
    }

    async fn maybe_send(&mut self, message: &str, _plot: Option<&Path>) {
        self.sent.push(message.to_string());
    }
}

#[derive(Debug, Default, World)]
pub struct OcnotifyWorld {
    // Notifier under test
    pub config: NotifierConfig,
    pub cli: FakeCli,
    pub gateway: FakeGateway,
    pub notifier: Option<ProgressNotifier>,
    pub clock: Option<Instant>,
    pub decisions: Vec<Decision>,

    // Wrapper testing
    pub recorder: RecordingNotifier,
    pub wrap_status: Option<i32>,

    // Formatter testing
    pub jobs: Vec<JobRecord>,
    pub grid_headers: Vec<String>,
    pub grid_rows: Vec<Vec<String>>,
    pub rendered: Option<String>,
}

impl OcnotifyWorld {
    /// Notifier built from the current config on first use
    pub fn notifier(&mut self) -> &mut ProgressNotifier {
        let config = self.config.clone();
        let cli = Arc::new(self.cli.clone());
        let gateway = Arc::new(self.gateway.clone());
        self.notifier
            .get_or_insert_with(|| ProgressNotifier::new(config, cli, gateway))
    }

    /// Scenario clock offset by `seconds`
    pub fn at(&mut self, seconds: u64) -> Instant {
        *self.clock.get_or_insert_with(Instant::now) + Duration::from_secs(seconds)
    }
}

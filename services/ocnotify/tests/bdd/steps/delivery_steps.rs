//! BDD step definitions for delivery route selection

use cucumber::{given, then, when};
use ocnotify::config::GatewayConfig;
use ocnotify::delivery::{DeliveryRoute, Diagnostic, PROBE_MESSAGE};
use ocnotify::notifier::Notifier;

use crate::world::OcnotifyWorld;

#[given("the CLI is not installed")]
fn cli_missing(world: &mut OcnotifyWorld) {
    world.cli.missing = true;
}

#[given(expr = "the CLI dry-run fails with {string}")]
fn probe_fails(world: &mut OcnotifyWorld, output: String) {
    world.cli.probe_status = 1;
    world.cli.probe_output = output;
}

#[given(expr = "a gateway at {string} with token {string}")]
fn gateway(world: &mut OcnotifyWorld, url: String, token: String) {
    world.config.gateway = Some(GatewayConfig { url, token });
}

#[when(expr = "{int} notification(s) is/are sent")]
async fn send_many(world: &mut OcnotifyWorld, count: usize) {
    for i in 0..count {
        world
            .notifier()
            .send_now(&format!("update {}", i + 1), None)
            .await;
    }
}

#[then("delivery should use the CLI")]
fn uses_cli(world: &mut OcnotifyWorld) {
    let route = world.notifier().delivery_state().route().cloned();
    assert_eq!(route, Some(DeliveryRoute::Cli));
}

#[then(expr = "delivery should use the gateway at {string}")]
fn uses_gateway(world: &mut OcnotifyWorld, url: String) {
    match world.notifier().delivery_state().route() {
        Some(DeliveryRoute::Http(gateway)) => assert_eq!(gateway.url, url),
        other => panic!("expected HTTP route, got {other:?}"),
    }
}

#[then("delivery should be disabled")]
fn disabled(world: &mut OcnotifyWorld) {
    let route = world.notifier().delivery_state().route().cloned();
    assert_eq!(route, Some(DeliveryRoute::Disabled));
}

#[then(expr = "the CLI should have been probed {int} time(s)")]
fn probed(world: &mut OcnotifyWorld, count: usize) {
    assert_eq!(world.cli.probes(), count);
}

#[then("the probe should use the connection message")]
fn probe_message(world: &mut OcnotifyWorld) {
    let calls = world.cli.calls.lock().unwrap();
    let probe = calls
        .iter()
        .find(|args| args.iter().any(|a| a == "--dry-run"))
        .expect("no probe recorded");
    assert!(probe.iter().any(|a| a == PROBE_MESSAGE));
}

#[then(expr = "a {string} diagnostic should be reported")]
fn diagnostic(world: &mut OcnotifyWorld, kind: String) {
    let diagnostics = world.notifier().diagnostics().to_vec();
    let found = diagnostics.iter().any(|d| match kind.as_str() {
        "missing destination" => matches!(d, Diagnostic::MissingDestination),
        "channel not configured" => matches!(d, Diagnostic::ChannelNotConfigured { .. }),
        "probe failed" => matches!(d, Diagnostic::ProbeFailed { .. }),
        "HTTP fallback" => matches!(d, Diagnostic::HttpFallback { .. }),
        "no delivery path" => matches!(d, Diagnostic::NoDeliveryPath { .. }),
        other => panic!("unknown diagnostic kind {other}"),
    });
    assert!(found, "diagnostics: {diagnostics:?}");
}

#[then(expr = "the gateway should have received {int} message(s)")]
fn gateway_count(world: &mut OcnotifyWorld, count: usize) {
    assert_eq!(world.gateway.posts().len(), count);
}

#[then(expr = "the gateway request should go to {string} for channel {string}")]
fn gateway_request(world: &mut OcnotifyWorld, url: String, channel: String) {
    let posts = world.gateway.posts();
    let (posted_url, body) = posts.first().expect("no gateway request");
    assert_eq!(posted_url, &url);
    assert_eq!(body["channel"], channel.as_str());
}

//! BDD step definitions for the process wrapper

use cucumber::{then, when};
use ocnotify::io::TokioProcessSpawner;
use ocnotify::wrapper::wrap;

use crate::world::OcnotifyWorld;

async fn run(world: &mut OcnotifyWorld, argv: Vec<String>, label: Option<&str>) {
    let status = wrap(&argv, label, None, &TokioProcessSpawner, &mut world.recorder).await;
    world.wrap_status = Some(status);
}

#[when(expr = "I wrap the shell command {string}")]
async fn wrap_shell(world: &mut OcnotifyWorld, script: String) {
    run(world, vec!["sh".into(), "-c".into(), script], None).await;
}

#[when(expr = "I wrap the shell command {string} labelled {string}")]
async fn wrap_shell_labelled(world: &mut OcnotifyWorld, script: String, label: String) {
    run(world, vec!["sh".into(), "-c".into(), script], Some(&label)).await;
}

#[when(expr = "I wrap the program {string}")]
async fn wrap_program(world: &mut OcnotifyWorld, program: String) {
    run(world, vec![program], None).await;
}

#[when("I wrap an empty command")]
async fn wrap_nothing(world: &mut OcnotifyWorld) {
    run(world, Vec::new(), None).await;
}

#[then(expr = "the wrapper should exit with status {int}")]
fn exit_status(world: &mut OcnotifyWorld, status: i32) {
    assert_eq!(world.wrap_status, Some(status));
}

#[then(expr = "{int} finish notification(s) should have been sent")]
fn finish_count(world: &mut OcnotifyWorld, count: usize) {
    assert_eq!(world.recorder.sent.len(), count);
}

#[then(expr = "the finish notification should not contain {string}")]
fn finish_lacks(world: &mut OcnotifyWorld, text: String) {
    let message = world.recorder.sent.last().expect("no finish notification");
    assert!(!message.contains(&text), "message: {message}");
}

#[then(expr = "the finish notification should contain {string}")]
fn finish_contains(world: &mut OcnotifyWorld, text: String) {
    let message = world.recorder.sent.last().expect("no finish notification");
    assert!(message.contains(&text), "message: {message}");
}

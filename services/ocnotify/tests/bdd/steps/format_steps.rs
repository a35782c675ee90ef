//! BDD step definitions for channel-aware formatting

use cucumber::{given, then, when};
use ocnotify::{detect_channel_type, format_batch_summary, format_grid, parse_job};

use crate::world::OcnotifyWorld;

#[given(expr = "a job {string}")]
fn job(world: &mut OcnotifyWorld, raw: String) {
    world.jobs.push(parse_job(&raw).expect("valid job"));
}

#[given(expr = "a grid with headers {string}")]
fn grid_headers(world: &mut OcnotifyWorld, headers: String) {
    world.grid_headers = headers.split(',').map(str::to_string).collect();
}

#[given(expr = "a grid row {string}")]
fn grid_row(world: &mut OcnotifyWorld, row: String) {
    world
        .grid_rows
        .push(row.split(',').map(str::to_string).collect());
}

#[when(expr = "I detect the style of channel {string}")]
fn detect(world: &mut OcnotifyWorld, channel: String) {
    world.rendered = Some(detect_channel_type(Some(&channel)).to_string());
}

#[when(expr = "I render the summary {string} for {string}")]
fn render_summary(world: &mut OcnotifyWorld, title: String, channel: String) {
    world.rendered = Some(format_batch_summary(&title, &world.jobs, None, Some(&channel)));
}

#[when(expr = "I render the summary {string} with footer {string} for {string}")]
fn render_summary_footer(world: &mut OcnotifyWorld, title: String, footer: String, channel: String) {
    world.rendered = Some(format_batch_summary(
        &title,
        &world.jobs,
        Some(&footer),
        Some(&channel),
    ));
}

#[when(expr = "I render the grid for {string}")]
fn render_grid(world: &mut OcnotifyWorld, channel: String) {
    world.rendered = Some(format_grid(
        &world.grid_rows,
        &world.grid_headers,
        Some(&channel),
    ));
}

#[then(expr = "the style should be {string}")]
fn style(world: &mut OcnotifyWorld, expected: String) {
    assert_eq!(world.rendered.as_deref(), Some(expected.as_str()));
}

#[then(expr = "the output should contain {string}")]
fn contains(world: &mut OcnotifyWorld, text: String) {
    let rendered = world.rendered.as_deref().expect("nothing rendered");
    assert!(rendered.contains(&text), "output:\n{rendered}");
}

#[then(expr = "the output should not contain {string}")]
fn not_contains(world: &mut OcnotifyWorld, text: String) {
    let rendered = world.rendered.as_deref().expect("nothing rendered");
    assert!(!rendered.contains(&text), "output:\n{rendered}");
}

#[then(expr = "the output should end with {string}")]
fn ends_with(world: &mut OcnotifyWorld, text: String) {
    let rendered = world.rendered.as_deref().expect("nothing rendered");
    assert!(rendered.ends_with(&text), "output:\n{rendered}");
}

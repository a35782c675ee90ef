//! BDD step definitions for ocnotify

pub mod delivery_steps;
pub mod format_steps;
pub mod wrapper_steps;
